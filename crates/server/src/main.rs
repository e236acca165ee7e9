//! Iris classifier server
//!
//! Trains the initial model at startup, serves predictions on the public
//! port and retrains in the background on a schedule or on demand through
//! the admin listener.

use anyhow::{Context, Result};
use classifier_lib::{
    classifier::DecisionTreeClassifier,
    dataset::{CsvDatasetProvider, DatasetProvider, IrisDatasetProvider},
    health::{components, HealthRegistry},
    models::Schema,
    observability::StructuredLogger,
    PredictionService, RefreshPipeline, RefreshTrigger, RetrainScheduler,
};
use iris_server::{api, config::AppConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting iris-server");

    let config = AppConfig::load()?;
    info!(
        api_port = config.api_port,
        admin_addr = %config.admin_addr(),
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_STORE).await;
    health_registry.register(components::SCHEDULER).await;

    let logger = StructuredLogger::new(&config.instance);

    let provider: Arc<dyn DatasetProvider> = match &config.dataset_path {
        Some(path) => Arc::new(CsvDatasetProvider::new(path, Schema::iris())),
        None => Arc::new(IrisDatasetProvider::new()),
    };
    logger.log_startup(SERVICE_VERSION, &provider.describe());

    let pipeline = Arc::new(
        RefreshPipeline::builder()
            .provider(provider)
            .classifier(Arc::new(DecisionTreeClassifier::new(config.tree_config())))
            .split(config.split_config())
            .timeout(config.refresh_timeout())
            .health(health_registry.clone())
            .logger(logger.clone())
            .build()?,
    );

    // No model, no service: a failed startup refresh is fatal
    pipeline
        .refresh(RefreshTrigger::Startup)
        .await
        .context("initial model training failed")?;
    health_registry.set_ready(true).await;

    let scheduler = Arc::new(RetrainScheduler::new(
        Arc::clone(&pipeline),
        config.cadence()?,
        health_registry.clone(),
    ));

    let service = PredictionService::new(Arc::clone(pipeline.store())).with_logger(logger.clone());
    let app_state = Arc::new(api::AppState::new(service, health_registry.clone()));
    let admin_state = Arc::new(api::AdminState::new(Arc::clone(&scheduler)));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let scheduler_handle = tokio::spawn(Arc::clone(&scheduler).run(shutdown_tx.subscribe()));
    let api_handle = tokio::spawn(api::serve(
        "public",
        config.api_addr(),
        api::create_router(app_state),
        shutdown_tx.subscribe(),
    ));
    let admin_handle = tokio::spawn(api::serve(
        "admin",
        config.admin_addr(),
        api::create_admin_router(admin_state),
        shutdown_tx.subscribe(),
    ));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    let _ = shutdown_tx.send(());

    for (name, handle) in [("public", api_handle), ("admin", admin_handle)] {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(listener = name, error = %e, "HTTP server failed"),
            Err(e) => error!(listener = name, error = %e, "HTTP server task panicked"),
        }
    }
    scheduler_handle.await?;

    info!("Shutdown complete");
    Ok(())
}
