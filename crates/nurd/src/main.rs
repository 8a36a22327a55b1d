//! NURD - cluster job resource collector
//!
//! Periodically polls the configured cluster schedulers, aggregates
//! per-job resource usage and requests, and appends the snapshots to
//! the local store. Stored snapshots are served over a read-only API.

use anyhow::{Context, Result};
use nurd_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    scheduler::{ClientConfig, HttpSchedulerClient},
    store::{FileStore, SnapshotStore},
    CollectionLoopBuilder,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const NURD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting nurd");

    let config = config::NurdConfig::load()?;
    info!(
        clusters = ?config.clusters,
        policy = %config.failure_policy,
        store = %config.store_path,
        "Collector configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::COLLECTOR).await;
    health_registry.register(components::SCHEDULER_API).await;
    health_registry.register(components::STORE).await;

    let logger = StructuredLogger::new("nurd");
    logger.log_startup(NURD_VERSION, &config.clusters, config.poll_interval_secs);

    let store: Arc<dyn SnapshotStore> = Arc::new(
        FileStore::open(&config.store_path)
            .await
            .context("Failed to open snapshot store")?,
    );

    let scheduler = HttpSchedulerClient::new(ClientConfig {
        request_timeout: config.request_timeout(),
        ..ClientConfig::default()
    })?;

    let collection_loop = CollectionLoopBuilder::new()
        .scheduler(Arc::new(scheduler))
        .store(store.clone())
        .clusters(config.clusters.clone())
        .health(health_registry.clone())
        .poll_interval(config.poll_interval())
        .cycle_timeout(config.cycle_timeout())
        .failure_policy(config.failure_policy)
        .build()?;

    let app_state = Arc::new(api::AppState::new(store, health_registry));
    let api_port = config.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server stopped");
        }
    });

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    match collection_loop.run(shutdown_rx).await {
        Ok(()) => {
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
            Ok(())
        }
        Err(e) => {
            logger.log_shutdown("collection cycle aborted");
            error!(error = %e, "Fatal collection error");
            Err(e.into())
        }
    }
}
