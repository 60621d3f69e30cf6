//! Server-side entity records held by the world registry.
//!
//! Cross-entity relations (mob target, structure owner) are stored as plain
//! ids and resolved through the registry on every use.

use crate::physics::{random_position, Vec2};
use rand::Rng;
use shared::protocol::{MobView, PlayerView, ResourceView, StructureView};
use shared::{Inventory, MobKind, ResourceKind, StructureKind, Weapon, PLAYER_MAX_HP};

#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub hp: u32,
    pub max_hp: u32,
    pub inventory: Inventory,
    pub weapon: Weapon,
    /// World clock time of the last swing that passed the cooldown gate.
    pub last_attack: Option<f64>,
    pub chat: Option<String>,
    pub chat_expires_at: Option<f64>,
    pub name: String,
    pub color: String,
    /// Team name, managed by the team collaborator.
    pub team: Option<String>,
    pub is_owner: bool,
}

impl Player {
    pub fn new<R: Rng>(id: u32, rng: &mut R) -> Self {
        Self {
            id,
            position: random_position(rng),
            velocity: Vec2::ZERO,
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            inventory: Inventory::default(),
            weapon: Weapon::default(),
            last_attack: None,
            chat: None,
            chat_expires_at: None,
            name: format!("Player {}", id),
            color: format!("#{:06x}", rng.gen_range(0..0x1000000u32)),
            team: None,
            is_owner: false,
        }
    }

    /// Brings a dead player back in place: fresh spawn point, full hp,
    /// empty inventory and bare fists. Identity, chat and team survive.
    pub fn respawn<R: Rng>(&mut self, rng: &mut R) {
        self.position = random_position(rng);
        self.hp = self.max_hp;
        self.inventory = Inventory::default();
        self.weapon = Weapon::default();
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: self.max_hp,
            name: self.name.clone(),
            color: self.color.clone(),
            weapon: self.weapon,
            chat: self.chat.clone(),
            team: self.team.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mob {
    pub id: u32,
    pub kind: MobKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub hp: u32,
    pub max_hp: u32,
    pub speed: f32,
    /// Player chased during the last update, if any.
    pub target_id: Option<u32>,
    pub attack_cooldown: f32,
}

impl Mob {
    pub fn new(id: u32, kind: MobKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position: position.clamp_to_map(),
            velocity: Vec2::ZERO,
            hp: kind.max_hp(),
            max_hp: kind.max_hp(),
            speed: kind.speed(),
            target_id: None,
            attack_cooldown: 0.0,
        }
    }

    pub fn view(&self) -> MobView {
        MobView {
            id: self.id,
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: self.max_hp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub id: u32,
    pub kind: ResourceKind,
    pub position: Vec2,
    pub hp: u32,
    pub max_hp: u32,
}

impl Resource {
    pub fn new(id: u32, kind: ResourceKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position: position.clamp_to_map(),
            hp: kind.max_hp(),
            max_hp: kind.max_hp(),
        }
    }

    pub fn view(&self) -> ResourceView {
        ResourceView {
            id: self.id,
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: self.max_hp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Structure {
    pub id: u32,
    pub kind: StructureKind,
    pub position: Vec2,
    pub hp: u32,
    pub max_hp: u32,
    /// Player that built it. Not enforced for anything yet.
    pub owner_id: u32,
}

impl Structure {
    pub fn new(id: u32, kind: StructureKind, position: Vec2, owner_id: u32) -> Self {
        Self {
            id,
            kind,
            position: position.clamp_to_map(),
            hp: kind.max_hp(),
            max_hp: kind.max_hp(),
            owner_id,
        }
    }

    pub fn view(&self) -> StructureView {
        StructureView {
            id: self.id,
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: self.max_hp,
            owner_id: self.owner_id,
        }
    }
}
