//! Types and constants shared between the world server and its clients:
//! the binary packet codec, the typed message protocol, entity kinds with
//! their stat tables, and the game balance constants.

pub mod codec;
pub mod entities;
pub mod protocol;

pub use codec::{Frame, Packet, PacketCodec, PacketError};
pub use entities::{Inventory, MobKind, Recipe, ResourceKind, StructureKind, Weapon};
pub use protocol::{ClientMessage, MessageError, MoveKeys, ServerMessage, Snapshot};

/// Side length of the square world, centered on the origin.
pub const MAP_SIZE: f32 = 4000.0;
pub const HALF_MAP: f32 = MAP_SIZE / 2.0;

pub const PLAYER_SPEED: f32 = 220.0;
pub const PLAYER_MAX_HP: u32 = 100;

/// Players hit the nearest target strictly closer than this.
pub const ATTACK_RANGE: f32 = 80.0;
/// Seconds between two attack swings of the same player.
pub const ATTACK_COOLDOWN: f64 = 0.5;
/// Maximum distance between a builder and the structure being placed.
pub const BUILD_RANGE: f32 = 150.0;

pub const CHAT_MAX_LEN: usize = 30;
/// Seconds a chat bubble stays visible.
pub const CHAT_DURATION: f64 = 3.0;

pub const MOB_AGGRO_RADIUS: f32 = 300.0;
pub const MOB_MELEE_RANGE: f32 = 40.0;
pub const MOB_DAMAGE: u32 = 10;
pub const MOB_ATTACK_COOLDOWN: f32 = 1.0;
/// Per-tick chance for an idle mob to pick a new heading.
pub const MOB_WANDER_CHANCE: f64 = 0.02;
pub const MOB_KILL_REWARD: Inventory = Inventory::new(0, 0, 10);

/// Chance that a depleted resource is replaced by one of the same kind.
pub const RESOURCE_RESPAWN_CHANCE: f64 = 0.5;
