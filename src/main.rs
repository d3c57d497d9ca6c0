// HTTP-FLV live server
//
// Usage:
//   hdl-live [config.json]
//
// The config file is created on the first saved pull if it does not exist.

use std::sync::Arc;
use hdl::{HdlServer, HttpFlvPuller, JsonConfigStore, Result, StreamHub};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "hdl.json".to_string());
    let store = Arc::new(JsonConfigStore::new(config_path));
    let config = store.load()?;

    info!("Starting HDL server on {}", config.listen_addr);
    info!("Configuration:");
    info!("  - Path prefix: {}", config.path_prefix);
    info!("  - Track wait timeout: {:?}", config.wait_timeout());
    info!("  - Subscriber queue: {}", config.subscribe.queue_capacity);
    info!("  - Saved pulls: {}", config.pull.auto_pull_list.len());

    let puller = Arc::new(HttpFlvPuller::new(config.pull_connect_timeout())?);
    let hub = Arc::new(StreamHub::new(config.hub_config()).with_puller(puller));
    let server = Arc::new(HdlServer::new(config, hub, store)?);

    // Setup graceful shutdown
    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down server...");
                shutdown.cancel();
            }
            Err(err) => {
                error!("Error setting up signal handler: {}", err);
            }
        }
    });

    server.pull_on_start().await;

    info!("Press Ctrl+C to stop");
    server.listen().await?;

    info!("Server stopped");
    Ok(())
}
