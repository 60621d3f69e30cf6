//! Entity kinds, their stat tables, and the player inventory.
//!
//! Everything here is plain data shared by the server simulation and the
//! wire protocol, so clients can interpret snapshots with the same tables.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Counts of gathered materials held by a player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub wood: u32,
    pub stone: u32,
    pub food: u32,
}

impl Inventory {
    pub const fn new(wood: u32, stone: u32, food: u32) -> Self {
        Self { wood, stone, food }
    }

    /// Returns true if every count in `cost` is covered.
    pub fn covers(&self, cost: &Inventory) -> bool {
        self.wood >= cost.wood && self.stone >= cost.stone && self.food >= cost.food
    }

    /// Debits `cost` if it is fully covered. Leaves the inventory untouched
    /// and returns false otherwise.
    pub fn try_spend(&mut self, cost: &Inventory) -> bool {
        if !self.covers(cost) {
            return false;
        }
        self.wood -= cost.wood;
        self.stone -= cost.stone;
        self.food -= cost.food;
        true
    }

    pub fn add(&mut self, reward: &Inventory) {
        self.wood = self.wood.saturating_add(reward.wood);
        self.stone = self.stone.saturating_add(reward.stone);
        self.food = self.food.saturating_add(reward.food);
    }
}

/// Equipped weapon. Determines the damage of a player's attack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    #[default]
    Fist,
    WoodSword,
    StoneSword,
}

impl Weapon {
    pub fn damage(self) -> u32 {
        match self {
            Weapon::Fist => 10,
            Weapon::WoodSword => 25,
            Weapon::StoneSword => 40,
        }
    }
}

/// Crafting recipes, keyed on the wire by their snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipe {
    WoodSword,
    StoneSword,
}

impl Recipe {
    pub fn cost(self) -> Inventory {
        match self {
            Recipe::WoodSword => Inventory::new(20, 0, 0),
            Recipe::StoneSword => Inventory::new(10, 20, 0),
        }
    }

    pub fn output(self) -> Weapon {
        match self {
            Recipe::WoodSword => Weapon::WoodSword,
            Recipe::StoneSword => Weapon::StoneSword,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown recipe '{0}'")]
pub struct UnknownRecipe(pub String);

impl FromStr for Recipe {
    type Err = UnknownRecipe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wood_sword" => Ok(Recipe::WoodSword),
            "stone_sword" => Ok(Recipe::StoneSword),
            other => Err(UnknownRecipe(other.to_string())),
        }
    }
}

/// Behavioral archetype of a mob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobKind {
    Wolf,
    Bear,
}

impl MobKind {
    pub const ALL: [MobKind; 2] = [MobKind::Wolf, MobKind::Bear];

    pub fn max_hp(self) -> u32 {
        match self {
            MobKind::Wolf => 60,
            MobKind::Bear => 150,
        }
    }

    pub fn speed(self) -> f32 {
        match self {
            MobKind::Wolf => 160.0,
            MobKind::Bear => 90.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Tree,
    Rock,
    Bush,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Tree, ResourceKind::Rock, ResourceKind::Bush];

    pub fn max_hp(self) -> u32 {
        match self {
            ResourceKind::Tree => 50,
            ResourceKind::Rock => 80,
            ResourceKind::Bush => 30,
        }
    }

    /// Materials granted to whoever depletes the resource.
    pub fn yield_on_depletion(self) -> Inventory {
        match self {
            ResourceKind::Tree => Inventory::new(10, 0, 0),
            ResourceKind::Rock => Inventory::new(0, 10, 0),
            ResourceKind::Bush => Inventory::new(0, 0, 5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Wall,
}

impl StructureKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wall" => Some(StructureKind::Wall),
            _ => None,
        }
    }

    pub fn max_hp(self) -> u32 {
        match self {
            StructureKind::Wall => 200,
        }
    }

    pub fn cost(self) -> Inventory {
        match self {
            StructureKind::Wall => Inventory::new(10, 0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_spend_exact_balance() {
        let mut inventory = Inventory::new(20, 0, 0);
        assert!(inventory.try_spend(&Recipe::WoodSword.cost()));
        assert_eq!(inventory, Inventory::default());
    }

    #[test]
    fn test_try_spend_insufficient_leaves_inventory() {
        let mut inventory = Inventory::new(15, 30, 2);
        assert!(!inventory.try_spend(&Inventory::new(16, 20, 0)));
        assert_eq!(inventory, Inventory::new(15, 30, 2));
    }

    #[test]
    fn test_add_saturates() {
        let mut inventory = Inventory::new(u32::MAX, 1, 0);
        inventory.add(&Inventory::new(5, 5, 5));
        assert_eq!(inventory, Inventory::new(u32::MAX, 6, 5));
    }

    #[test]
    fn test_recipe_parsing() {
        assert_eq!("wood_sword".parse::<Recipe>(), Ok(Recipe::WoodSword));
        assert_eq!("stone_sword".parse::<Recipe>(), Ok(Recipe::StoneSword));
        assert!("golden_axe".parse::<Recipe>().is_err());
        assert!("".parse::<Recipe>().is_err());

        let err = "golden_axe".parse::<Recipe>().unwrap_err();
        assert_eq!(err, UnknownRecipe("golden_axe".to_string()));
        assert_eq!(err.to_string(), "unknown recipe 'golden_axe'");
    }

    #[test]
    fn test_weapon_damage_ordering() {
        assert!(Weapon::Fist.damage() < Weapon::WoodSword.damage());
        assert!(Weapon::WoodSword.damage() < Weapon::StoneSword.damage());
        assert_eq!(Weapon::default(), Weapon::Fist);
    }
}
