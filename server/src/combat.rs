//! Player attacks: cooldown gate, cross-category target selection and
//! damage resolution.
//!
//! Death handling happens in the same call that applies the damage, so no
//! snapshot can ever contain an entity at zero hp.

use crate::game::GameState;
use crate::physics::Vec2;
use log::debug;
use rand::Rng;
use shared::{ATTACK_COOLDOWN, ATTACK_RANGE, MOB_KILL_REWARD, RESOURCE_RESPAWN_CHANCE};

/// Entity hit by an attack, identified by kind and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Mob(u32),
    Player(u32),
    Resource(u32),
    Structure(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    pub target: Target,
    pub damage: u32,
    /// The hit brought the target to zero hp.
    pub killed: bool,
}

impl GameState {
    /// Resolves one attack swing by `attacker_id`.
    ///
    /// Returns `None` when the attacker is unknown, still on cooldown, or
    /// nothing is in range. A swing that passes the cooldown gate restarts
    /// the cooldown even if it hits nothing.
    pub fn attack(&mut self, attacker_id: u32) -> Option<AttackOutcome> {
        let now = self.clock;
        let attacker = self.players.get_mut(&attacker_id)?;

        if attacker
            .last_attack
            .is_some_and(|last| now - last < ATTACK_COOLDOWN)
        {
            return None;
        }
        attacker.last_attack = Some(now);
        let damage = attacker.weapon.damage();

        let target = self.find_target(attacker_id)?;
        let killed = match target {
            Target::Mob(id) => self.damage_mob(attacker_id, id, damage),
            Target::Player(id) => self.damage_player(id, damage),
            Target::Resource(id) => self.damage_resource(attacker_id, id, damage),
            Target::Structure(id) => self.damage_structure(id, damage),
        };

        Some(AttackOutcome {
            target,
            damage,
            killed,
        })
    }

    /// Nearest entity strictly within attack range of the attacker.
    ///
    /// Categories are scanned in a fixed order (mobs, other players,
    /// resources, structures), each in ascending id order. Only a strictly
    /// closer candidate replaces the current best, so on equal distance the
    /// first one scanned wins.
    pub fn find_target(&self, attacker_id: u32) -> Option<Target> {
        let origin = self.players.get(&attacker_id)?.position;
        let mut best: Option<Target> = None;
        let mut best_dist = ATTACK_RANGE * ATTACK_RANGE;

        let mut consider = |target: Target, position: &Vec2| {
            let dist = origin.distance_sq(position);
            if dist < best_dist {
                best_dist = dist;
                best = Some(target);
            }
        };

        for mob in self.mobs.values() {
            consider(Target::Mob(mob.id), &mob.position);
        }
        for player in self.players.values().filter(|p| p.id != attacker_id) {
            consider(Target::Player(player.id), &player.position);
        }
        for resource in self.resources.values() {
            consider(Target::Resource(resource.id), &resource.position);
        }
        for structure in self.structures.values() {
            consider(Target::Structure(structure.id), &structure.position);
        }

        best
    }

    fn damage_mob(&mut self, attacker_id: u32, mob_id: u32, damage: u32) -> bool {
        let Some(mob) = self.mobs.get_mut(&mob_id) else {
            return false;
        };
        mob.hp = mob.hp.saturating_sub(damage);
        if mob.hp > 0 {
            return false;
        }

        self.mobs.remove(&mob_id);
        let replacement = self.spawn_random_mob();
        if let Some(attacker) = self.players.get_mut(&attacker_id) {
            attacker.inventory.add(&MOB_KILL_REWARD);
        }
        debug!(
            "Mob {} killed by player {}, replaced by mob {}",
            mob_id, attacker_id, replacement
        );
        true
    }

    fn damage_player(&mut self, player_id: u32, damage: u32) -> bool {
        let Some(player) = self.players.get_mut(&player_id) else {
            return false;
        };
        player.hp = player.hp.saturating_sub(damage);
        if player.hp > 0 {
            return false;
        }

        player.respawn(&mut self.rng);
        debug!("Player {} killed, respawned", player_id);
        true
    }

    fn damage_resource(&mut self, attacker_id: u32, resource_id: u32, damage: u32) -> bool {
        let Some(resource) = self.resources.get_mut(&resource_id) else {
            return false;
        };
        resource.hp = resource.hp.saturating_sub(damage);
        if resource.hp > 0 {
            return false;
        }

        let kind = resource.kind;
        self.resources.remove(&resource_id);
        if let Some(attacker) = self.players.get_mut(&attacker_id) {
            attacker.inventory.add(&kind.yield_on_depletion());
        }
        if self.rng.gen_bool(RESOURCE_RESPAWN_CHANCE) {
            self.spawn_resource_kind(kind);
        }
        true
    }

    fn damage_structure(&mut self, structure_id: u32, damage: u32) -> bool {
        let Some(structure) = self.structures.get_mut(&structure_id) else {
            return false;
        };
        structure.hp = structure.hp.saturating_sub(damage);
        if structure.hp > 0 {
            return false;
        }

        self.structures.remove(&structure_id);
        debug!("Structure {} destroyed", structure_id);
        true
    }
}
