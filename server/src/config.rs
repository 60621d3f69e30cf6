//! Command-line and environment configuration for the server binary.

use crate::game::WorldConfig;
use clap::Parser;
use shared::codec::DEFAULT_MAX_PACKET_BYTES;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about = "Authoritative survival world server")]
pub struct ServerConfig {
    /// Address to bind to
    #[clap(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. 0 picks a free port.
    #[clap(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Simulation ticks per second
    #[clap(short, long, env = "TICK_RATE", default_value_t = 60)]
    pub tick_rate: u32,

    /// Maximum number of simultaneous connections
    #[clap(short, long, env = "MAX_CLIENTS", default_value_t = 200)]
    pub max_clients: usize,

    /// Largest inbound frame accepted, in bytes
    #[clap(long, env = "MAX_PACKET_BYTES", default_value_t = DEFAULT_MAX_PACKET_BYTES)]
    pub max_packet_bytes: usize,

    /// Mobs kept alive in the world
    #[clap(long, default_value_t = 20)]
    pub mob_population: usize,

    /// Resources spawned at startup
    #[clap(long, default_value_t = 60)]
    pub initial_resources: usize,

    /// Resources are topped up while fewer than this exist
    #[clap(long, default_value_t = 40)]
    pub resource_floor: usize,

    /// Fixed RNG seed for reproducible worlds
    #[clap(long)]
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tick period. A zero tick rate is treated as one tick per second.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }

    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            mob_population: self.mob_population,
            initial_resources: self.initial_resources,
            resource_floor: self.resource_floor,
            seed: self.seed,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            tick_rate: 60,
            max_clients: 200,
            max_packet_bytes: DEFAULT_MAX_PACKET_BYTES,
            mob_population: 20,
            initial_resources: 60,
            resource_floor: 40,
            seed: None,
        }
    }
}
