//! # Survival World Server Library
//!
//! Authoritative server for a shared top-down survival world. Players move,
//! gather resources, craft weapons, build walls, chat and fight mobs and each
//! other; the server owns every decision and broadcasts the result.
//!
//! ## Architecture Design
//!
//! ### Single Owner Event Loop
//! One task owns the [`game::GameState`]. Connection tasks forward decoded
//! messages over a channel and the loop applies them between ticks, so the
//! world is never touched concurrently and the registry keeps a stable
//! iteration order.
//!
//! ### WebSocket Transport
//! Clients connect over WebSocket and exchange MessagePack packets of the
//! form `[type, [payload...]]`. Frames are decoded and validated in the
//! connection task before anything reaches the simulation.
//!
//! ## Module Organization
//!
//! - `network`: accept loop, per-connection tasks and the tick loop
//! - `client_manager`: connection to player mapping and outbound queues
//! - `config`: command-line and environment configuration
//! - `game`: entity registry, message dispatch and the per-tick update
//! - `intents`: movement, crafting, building and chat handlers
//! - `combat`: attack targeting and damage resolution
//! - `mob_ai`: mob aggro, pursuit, melee and wander
//! - `chat_filter`: pluggable profanity filter
//! - `entity`, `physics`: entity records and 2D vector math
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = ServerConfig {
//!         port: 3000,
//!         tick_rate: 60,
//!         ..ServerConfig::default()
//!     };
//!
//!     let mut server = Server::new(&config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod chat_filter;
pub mod client_manager;
pub mod combat;
pub mod config;
pub mod entity;
pub mod game;
pub mod intents;
pub mod mob_ai;
pub mod network;
pub mod physics;
