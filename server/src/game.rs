//! Authoritative world state: the entity registry and the per-tick update.
//!
//! `GameState` is owned by exactly one task. Message handlers and ticks both
//! take `&mut self`, so mutations are serialized by construction and no
//! collection ever changes size concurrently.

use crate::chat_filter::{ChatFilter, WordListFilter};
use crate::entity::{Mob, Player, Resource, Structure};
use crate::mob_ai::MobStrike;
use crate::physics::{random_position, Vec2};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::protocol::Snapshot;
use shared::{ClientMessage, MobKind, ResourceKind};
use std::collections::BTreeMap;

/// Simulation parameters that are not compile-time constants.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Number of mobs alive at all times.
    pub mob_population: usize,
    /// Resources spawned at world creation.
    pub initial_resources: usize,
    /// The tick loop tops resources up whenever fewer than this exist.
    pub resource_floor: usize,
    /// Seed for the world RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            mob_population: 20,
            initial_resources: 60,
            resource_floor: 40,
            seed: None,
        }
    }
}

pub struct GameState {
    pub tick: u64,
    /// Seconds of simulated time, accumulated from tick deltas.
    pub clock: f64,
    pub(crate) players: BTreeMap<u32, Player>,
    pub(crate) mobs: BTreeMap<u32, Mob>,
    pub(crate) resources: BTreeMap<u32, Resource>,
    pub(crate) structures: BTreeMap<u32, Structure>,
    next_player_id: u32,
    next_mob_id: u32,
    next_resource_id: u32,
    next_structure_id: u32,
    pub(crate) rng: StdRng,
    pub(crate) chat_filter: Box<dyn ChatFilter + Send>,
    config: WorldConfig,
}

impl GameState {
    pub fn new(config: WorldConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut state = Self {
            tick: 0,
            clock: 0.0,
            players: BTreeMap::new(),
            mobs: BTreeMap::new(),
            resources: BTreeMap::new(),
            structures: BTreeMap::new(),
            next_player_id: 1,
            next_mob_id: 1,
            next_resource_id: 1,
            next_structure_id: 1,
            rng,
            chat_filter: Box::new(WordListFilter::default()),
            config,
        };

        for _ in 0..state.config.mob_population {
            state.spawn_random_mob();
        }
        for _ in 0..state.config.initial_resources {
            state.spawn_random_resource();
        }

        info!(
            "World initialized with {} mobs and {} resources",
            state.mobs.len(),
            state.resources.len()
        );
        state
    }

    /// Replaces the chat filter used by the chat intent.
    pub fn with_chat_filter(mut self, filter: Box<dyn ChatFilter + Send>) -> Self {
        self.chat_filter = filter;
        self
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // ----- registry -----

    pub fn add_player(&mut self) -> u32 {
        let id = self.next_player_id;
        self.next_player_id += 1;

        let player = Player::new(id, &mut self.rng);
        info!(
            "Added player {} at ({:.1}, {:.1})",
            id, player.position.x, player.position.y
        );
        self.players.insert(id, player);
        id
    }

    pub fn remove_player(&mut self, id: u32) -> bool {
        let removed = self.players.remove(&id).is_some();
        if removed {
            info!("Removed player {}", id);
        }
        removed
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Mutable lookup, also the hook for collaborators such as the team
    /// roster that keep per-player fields.
    pub fn player_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn mob(&self, id: u32) -> Option<&Mob> {
        self.mobs.get(&id)
    }

    pub fn resource(&self, id: u32) -> Option<&Resource> {
        self.resources.get(&id)
    }

    pub fn structure(&self, id: u32) -> Option<&Structure> {
        self.structures.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn mobs(&self) -> impl Iterator<Item = &Mob> {
        self.mobs.values()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn mob_count(&self) -> usize {
        self.mobs.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    pub fn spawn_mob_at(&mut self, kind: MobKind, position: Vec2) -> u32 {
        let id = self.next_mob_id;
        self.next_mob_id += 1;
        self.mobs.insert(id, Mob::new(id, kind, position));
        id
    }

    pub fn spawn_resource_at(&mut self, kind: ResourceKind, position: Vec2) -> u32 {
        let id = self.next_resource_id;
        self.next_resource_id += 1;
        self.resources.insert(id, Resource::new(id, kind, position));
        id
    }

    pub(crate) fn insert_structure(&mut self, structure: impl FnOnce(u32) -> Structure) -> u32 {
        let id = self.next_structure_id;
        self.next_structure_id += 1;
        self.structures.insert(id, structure(id));
        id
    }

    pub(crate) fn spawn_random_mob(&mut self) -> u32 {
        let kind = MobKind::ALL[self.rng.gen_range(0..MobKind::ALL.len())];
        let position = random_position(&mut self.rng);
        self.spawn_mob_at(kind, position)
    }

    pub(crate) fn spawn_random_resource(&mut self) -> u32 {
        let kind = ResourceKind::ALL[self.rng.gen_range(0..ResourceKind::ALL.len())];
        self.spawn_resource_kind(kind)
    }

    pub(crate) fn spawn_resource_kind(&mut self, kind: ResourceKind) -> u32 {
        let position = random_position(&mut self.rng);
        self.spawn_resource_at(kind, position)
    }

    // ----- message dispatch -----

    /// Routes one validated client message to its handler. Handlers for a
    /// player that no longer exists do nothing.
    pub fn handle_message(&mut self, player_id: u32, message: ClientMessage) {
        match message {
            ClientMessage::Input(keys) => {
                self.set_movement(player_id, keys);
            }
            ClientMessage::Attack => {
                if let Some(outcome) = self.attack(player_id) {
                    debug!("Player {} hit {:?}", player_id, outcome);
                }
            }
            ClientMessage::Chat { text } => {
                self.chat(player_id, &text);
            }
            ClientMessage::Build { kind, x, y } => {
                if self.build(player_id, kind, Vec2::new(x, y)).is_none() {
                    debug!("Player {} build of {:?} rejected", player_id, kind);
                }
            }
            ClientMessage::Craft { recipe } => {
                if !self.craft(player_id, &recipe) {
                    debug!("Player {} craft of '{}' rejected", player_id, recipe);
                }
            }
        }
    }

    // ----- tick -----

    /// Advances the world by `dt` seconds of wall-clock time.
    pub fn tick(&mut self, dt: f32) {
        self.clock += dt as f64;
        self.update_players(dt);
        self.update_mobs(dt);
        self.top_up_resources();
        self.tick += 1;
    }

    fn update_players(&mut self, dt: f32) {
        let now = self.clock;
        for player in self.players.values_mut() {
            player.position = player.position.add(&player.velocity.scale(dt)).clamp_to_map();

            if player.chat_expires_at.is_some_and(|expires| now >= expires) {
                player.chat = None;
                player.chat_expires_at = None;
            }
        }
    }

    /// Mobs act one at a time in id order. A strike lands before the next mob
    /// moves, so a player respawned by one mob is seen at the new position by
    /// every later mob in the same tick.
    fn update_mobs(&mut self, dt: f32) {
        let mut targets: Vec<(u32, Vec2)> = self
            .players
            .values()
            .map(|player| (player.id, player.position))
            .collect();

        for mob in self.mobs.values_mut() {
            let Some(strike) = mob.update(dt, &targets, &mut self.rng) else {
                continue;
            };
            let Some(player) = self.players.get_mut(&strike.target_id) else {
                continue;
            };

            if apply_mob_strike(player, strike, &mut self.rng) {
                if let Some(target) = targets.iter_mut().find(|(id, _)| *id == player.id) {
                    target.1 = player.position;
                }
            }
        }
    }

    fn top_up_resources(&mut self) {
        if self.resources.len() < self.config.resource_floor {
            self.spawn_random_resource();
        }
    }

    /// Public state of every entity. Player inventories are not included.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            players: self.players.values().map(Player::view).collect(),
            mobs: self.mobs.values().map(Mob::view).collect(),
            resources: self.resources.values().map(Resource::view).collect(),
            structures: self.structures.values().map(Structure::view).collect(),
        }
    }
}

/// Applies a mob hit and respawns the player if it was lethal. Returns
/// whether the player respawned.
fn apply_mob_strike<R: Rng>(player: &mut Player, strike: MobStrike, rng: &mut R) -> bool {
    player.hp = player.hp.saturating_sub(strike.damage);
    if player.hp > 0 {
        return false;
    }

    player.respawn(rng);
    debug!(
        "Player {} killed by mob {}, respawned",
        strike.target_id, strike.mob_id
    );
    true
}

#[cfg(test)]
pub(crate) fn empty_world() -> GameState {
    GameState::new(WorldConfig {
        mob_population: 0,
        initial_resources: 0,
        resource_floor: 0,
        seed: Some(42),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{MoveKeys, HALF_MAP, MOB_DAMAGE, PLAYER_MAX_HP, PLAYER_SPEED};

    #[test]
    fn test_world_initial_population() {
        let state = GameState::new(WorldConfig {
            mob_population: 7,
            initial_resources: 11,
            resource_floor: 5,
            seed: Some(1),
        });

        assert_eq!(state.mob_count(), 7);
        assert_eq!(state.resource_count(), 11);
        assert_eq!(state.player_count(), 0);
        assert_eq!(state.structure_count(), 0);
    }

    #[test]
    fn test_player_ids_are_monotonic() {
        let mut state = empty_world();
        let a = state.add_player();
        let b = state.add_player();
        assert!(state.remove_player(a));
        let c = state.add_player();

        assert_eq!((a, b, c), (1, 2, 3));
        assert!(state.player(a).is_none());
        assert!(!state.remove_player(a));
    }

    #[test]
    fn test_tick_integrates_velocity() {
        let mut state = empty_world();
        let id = state.add_player();
        state.player_mut(id).unwrap().position = Vec2::ZERO;
        state.set_movement(
            id,
            MoveKeys {
                right: true,
                ..MoveKeys::default()
            },
        );

        state.tick(0.5);

        let player = state.player(id).unwrap();
        assert_eq!(player.position, Vec2::new(PLAYER_SPEED * 0.5, 0.0));
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_tick_clamps_to_map() {
        let mut state = empty_world();
        let id = state.add_player();
        state.player_mut(id).unwrap().position = Vec2::new(HALF_MAP - 1.0, -HALF_MAP + 1.0);
        state.player_mut(id).unwrap().velocity = Vec2::new(1000.0, -1000.0);

        state.tick(1.0);

        assert_eq!(state.player(id).unwrap().position, Vec2::new(HALF_MAP, -HALF_MAP));
    }

    #[test]
    fn test_chat_expires_after_duration() {
        let mut state = empty_world();
        let id = state.add_player();
        state.chat(id, "hello");
        assert_eq!(state.player(id).unwrap().chat.as_deref(), Some("hello"));

        state.tick(1.0);
        assert!(state.player(id).unwrap().chat.is_some());

        for _ in 0..3 {
            state.tick(1.0);
        }
        assert!(state.player(id).unwrap().chat.is_none());
    }

    #[test]
    fn test_resource_floor_tops_up_one_per_tick() {
        let mut state = GameState::new(WorldConfig {
            mob_population: 0,
            initial_resources: 0,
            resource_floor: 3,
            seed: Some(5),
        });

        state.tick(0.016);
        assert_eq!(state.resource_count(), 1);
        state.tick(0.016);
        state.tick(0.016);
        state.tick(0.016);
        assert_eq!(state.resource_count(), 3);
    }

    #[test]
    fn test_mob_strike_kills_and_respawns() {
        let mut state = empty_world();
        let id = state.add_player();
        {
            let player = state.player_mut(id).unwrap();
            player.hp = MOB_DAMAGE;
            player.inventory.wood = 30;
        }

        let strike = MobStrike {
            mob_id: 1,
            target_id: id,
            damage: MOB_DAMAGE,
        };
        let player = state.players.get_mut(&id).unwrap();
        assert!(apply_mob_strike(player, strike, &mut state.rng));

        let player = state.player(id).unwrap();
        assert_eq!(player.hp, PLAYER_MAX_HP);
        assert_eq!(player.inventory.wood, 0);
    }

    #[test]
    fn test_mob_strike_on_removed_player_is_ignored() {
        let mut state = empty_world();
        let id = state.add_player();
        state.player_mut(id).unwrap().position = Vec2::ZERO;
        state.spawn_mob_at(MobKind::Wolf, Vec2::new(10.0, 0.0));
        state.remove_player(id);

        state.tick(0.016);
        assert_eq!(state.player_count(), 0);
    }

    #[test]
    fn test_respawned_player_escapes_remaining_mobs() {
        let mut state = empty_world();
        let id = state.add_player();
        {
            let player = state.player_mut(id).unwrap();
            player.position = Vec2::ZERO;
            player.hp = MOB_DAMAGE;
        }
        state.spawn_mob_at(MobKind::Bear, Vec2::new(-10.0, 0.0));
        state.spawn_mob_at(MobKind::Bear, Vec2::new(10.0, 0.0));

        state.tick(0.016);

        let player = state.player(id).unwrap();
        assert_eq!(player.hp, PLAYER_MAX_HP);
        let melee_sq = shared::MOB_MELEE_RANGE * shared::MOB_MELEE_RANGE;
        assert!(state
            .mobs()
            .all(|mob| mob.position.distance_sq(&player.position) > melee_sq));
    }

    #[test]
    fn test_snapshot_lists_every_entity() {
        let mut state = empty_world();
        let player = state.add_player();
        state.spawn_mob_at(MobKind::Wolf, Vec2::new(100.0, 100.0));
        state.spawn_resource_at(ResourceKind::Tree, Vec2::new(-50.0, 10.0));
        state.player_mut(player).unwrap().inventory.wood = 10;
        let at = state.player(player).unwrap().position;
        assert!(state.build(player, shared::StructureKind::Wall, at).is_some());
        state.tick(0.016);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.mobs.len(), 1);
        assert_eq!(snapshot.resources.len(), 1);
        assert_eq!(snapshot.structures.len(), 1);
        assert_eq!(snapshot.structures[0].owner_id, player);
    }

    #[test]
    fn test_handle_message_for_unknown_player() {
        let mut state = empty_world();
        state.handle_message(5, ClientMessage::Attack);
        state.handle_message(5, ClientMessage::Chat { text: "hi".into() });
        state.handle_message(
            5,
            ClientMessage::Craft {
                recipe: "wood_sword".into(),
            },
        );
        assert_eq!(state.player_count(), 0);
    }
}
