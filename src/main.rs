use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use feedvault::bus::NotificationBus;
use feedvault::config::BackendConfig;
use feedvault::module::snapshot::{AcquisitionClient, CycleOrchestrator, FileStore, HttpFetcher};

const CONFIG_PATH: &str = "feedvault.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (defaults if no config file is present)
    let config = BackendConfig::from_file(CONFIG_PATH).unwrap_or_default();

    // Initialize logging
    let _logging_guard = feedvault::logging::init_logging("logs", "feedvault", &config.log_level);

    tracing::info!("feedvault starting...");
    tracing::info!(
        "Polling {} and {} every {}s until both succeed",
        config.posts_url,
        config.likes_url,
        config.retry_interval_seconds
    );

    let bus = NotificationBus::new();

    let fetcher = Arc::new(HttpFetcher::new(
        &config.posts_url,
        &config.likes_url,
        config.request_timeout_seconds,
    )?);
    let client = AcquisitionClient::new(fetcher, bus.clone());
    let store = Arc::new(FileStore::new(&config.data_dir));

    let orchestrator = CycleOrchestrator::new(
        bus,
        client,
        store,
        Duration::from_secs(config.retry_interval_seconds),
    );

    // Show past records before the first cycle, like the admin table does
    orchestrator.hydrate().await?;

    orchestrator.start().await?;

    tokio::signal::ctrl_c().await?;
    orchestrator.cancel().await;
    tracing::info!("feedvault shutting down");

    Ok(())
}
