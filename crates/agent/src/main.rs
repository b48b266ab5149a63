//! Component Monitor - host component health analysis service
//!
//! Samples the local host on an interval, raises threshold alerts against
//! per-entity baselines and serves root-cause and trend analysis over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use component_monitor::{api, config::MonitorConfig};
use monitor_lib::{
    anomaly::BaselineStore,
    collector::{CollectionLoopBuilder, SysinfoCollector},
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    store::InMemoryMetricStore,
    MonitorService,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting component-monitor");

    let config = MonitorConfig::load()?;
    info!(
        node_name = %config.node_name,
        api_port = config.api_port,
        disk_correlation = ?config.disk_correlation,
        "Monitor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let baselines = Arc::new(BaselineStore::new());
    for (entity, baseline) in &config.baselines {
        if !baselines.seed(entity.clone(), *baseline) {
            info!(entity = %entity, "Baseline already present, keeping existing profile");
        }
    }
    health_registry.set_healthy(components::BASELINE_STORE).await;

    let logger = StructuredLogger::new(&config.node_name);
    logger.log_startup(MONITOR_VERSION);

    let service = Arc::new(
        MonitorService::new(
            Arc::new(InMemoryMetricStore::with_config(config.store_config())),
            Arc::new(SysinfoCollector::new()),
            baselines,
            logger.clone(),
        )
        .with_disk_correlation(config.disk_correlation),
    );
    service
        .metrics()
        .set_baselines_tracked(service.baselines().len());

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let collection_loop = CollectionLoopBuilder::new()
        .service(service.clone())
        .health(health_registry.clone())
        .interval(config.collection_interval())
        .jitter(config.collection_jitter())
        .build()
        .context("failed to build collection loop")?;
    let collection_handle = tokio::spawn(collection_loop.run(shutdown_tx.subscribe()));

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        service,
        config.history_window(),
    ));

    // Mark monitor as ready after initialization
    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(
        config.api_port,
        app_state,
        shutdown_tx.subscribe(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    logger.log_shutdown("SIGINT received");
    health_registry.set_ready(false).await;

    // receivers may already be gone if a task exited early
    let _ = shutdown_tx.send(());

    collection_handle
        .await
        .context("collection loop panicked")?;
    api_handle.await.context("API server panicked")??;

    info!("Shutdown complete");
    Ok(())
}
