//! Per-tick mob behavior: aggro, pursuit, melee and idle wander.

use crate::entity::Mob;
use crate::physics::{random_heading, Vec2};
use rand::Rng;
use shared::{MOB_AGGRO_RADIUS, MOB_ATTACK_COOLDOWN, MOB_DAMAGE, MOB_MELEE_RANGE, MOB_WANDER_CHANCE};

/// A melee hit produced by a mob update, applied by the world afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobStrike {
    pub mob_id: u32,
    pub target_id: u32,
    pub damage: u32,
}

impl Mob {
    /// Runs one AI step against the current player positions.
    ///
    /// The target is re-acquired from scratch every call: the nearest player
    /// inside the aggro radius wins, and nothing is remembered between ticks.
    pub fn update<R: Rng>(&mut self, dt: f32, players: &[(u32, Vec2)], rng: &mut R) -> Option<MobStrike> {
        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);

        let aggro_sq = MOB_AGGRO_RADIUS * MOB_AGGRO_RADIUS;
        let mut closest: Option<(u32, Vec2, f32)> = None;
        for (player_id, player_pos) in players {
            let dist_sq = self.position.distance_sq(player_pos);
            if dist_sq <= aggro_sq && closest.map_or(true, |(_, _, best)| dist_sq < best) {
                closest = Some((*player_id, *player_pos, dist_sq));
            }
        }

        self.target_id = closest.map(|(id, _, _)| id);

        match closest {
            Some((target_id, target_pos, _)) => self.pursue(target_id, target_pos, dt),
            None => {
                self.wander(rng);
                self.position = self.position.add(&self.velocity.scale(dt)).clamp_to_map();
                None
            }
        }
    }

    fn pursue(&mut self, target_id: u32, target_pos: Vec2, dt: f32) -> Option<MobStrike> {
        let offset = self.position.to(&target_pos);
        let dist = offset.magnitude();

        self.velocity = offset.normalize().scale(self.speed);
        // Never step past the target
        let step = (self.speed * dt).min(dist);
        self.position = self.position.add(&offset.normalize().scale(step)).clamp_to_map();

        let in_melee = self.position.distance_sq(&target_pos) <= MOB_MELEE_RANGE * MOB_MELEE_RANGE;
        if in_melee && self.attack_cooldown <= 0.0 {
            self.attack_cooldown = MOB_ATTACK_COOLDOWN;
            return Some(MobStrike {
                mob_id: self.id,
                target_id,
                damage: MOB_DAMAGE,
            });
        }
        None
    }

    fn wander<R: Rng>(&mut self, rng: &mut R) {
        if rng.gen_bool(MOB_WANDER_CHANCE) {
            self.velocity = random_heading(rng).scale(self.speed * 0.5);
        }
    }
}
