use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showsync_core::{
    load_config, metrics, validate_config, CatalogStore, CycleConfig, CycleRunner,
    EpisodateClient, EpisodateConfig, SchedulerConfig, ShowProvider, SqliteCatalogStore,
    SyncScheduler,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("showsync {} starting", VERSION);

    let config_path = std::env::var("SHOWSYNC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Sync interval: {} hours", config.sync.interval_hours);
    info!("Provider: {}", config.provider.base_url);
    info!("Database path: {:?}", config.database.path);

    let store = Arc::new(
        SqliteCatalogStore::new(&config.database.path).context("Failed to open show catalog")?,
    );
    info!(
        "Show catalog initialized ({} shows)",
        store.count().context("Failed to count catalog shows")?
    );

    let provider: Arc<dyn ShowProvider> = Arc::new(
        EpisodateClient::new(EpisodateConfig::from(&config.provider))
            .context("Failed to create provider client")?,
    );

    let runner = CycleRunner::new(
        provider,
        store as Arc<dyn CatalogStore>,
        CycleConfig::default(),
    );
    let scheduler = SyncScheduler::new(Arc::new(runner), SchedulerConfig::from(&config.sync));
    scheduler.start().await;

    shutdown_signal().await;

    info!("Stopping sync scheduler...");
    scheduler.stop().await;

    let status = scheduler.status().await;
    info!(
        "Completed {} sync cycles this run",
        status.cycles_completed
    );
    log_metrics();

    info!("showsync stopped");
    Ok(())
}

/// Dump the final metric values at debug level.
fn log_metrics() {
    match metrics::registry().and_then(|registry| metrics::encode(&registry)) {
        Ok(text) => debug!("Final metrics:\n{}", text),
        Err(e) => warn!("Failed to encode metrics: {}", e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
