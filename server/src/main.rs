use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::{NetworkEvent, Server};

/// Parses configuration from flags and environment, then runs the server
/// until it fails or Ctrl+C is received.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    info!(
        "Starting server on {} at {}Hz, max {} clients",
        config.address(),
        config.tick_rate,
        config.max_clients
    );

    let mut server = Server::new(&config).await?;
    let shutdown = server.event_sender();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            let _ = shutdown.send(NetworkEvent::Shutdown);
        }
    });

    if let Err(e) = server.run().await {
        error!("Server stopped with error: {}", e);
        return Err(e);
    }
    Ok(())
}
