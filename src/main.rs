use anyhow::Context;
use glucoscore::api::{self, app_state::AppState};
use glucoscore::config::loader::ConfigLoader;
use glucoscore::observability::{
    AppMetrics, ObservabilityState, create_observability_router, init_tracing,
};
use glucoscore::predictor::Predictor;
use glucoscore::services::create_prediction_service;
use glucoscore::storage::StorageFactory;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    ConfigLoader::validate(&config)?;

    let _log_guard = init_tracing(&config.app_name, &config.logging);
    info!(
        environment = %config.environment,
        "Starting {}...", config.app_name
    );

    let store = StorageFactory::create(&config.database).await?;
    info!(backend = store.backend_name(), "Entry store initialized");

    let predictor = Predictor::new(&config.predictor);
    let prediction_service = create_prediction_service(store.clone(), predictor);
    info!("Prediction service initialized");

    let metrics = Arc::new(AppMetrics::default());
    let app_state = AppState::new(prediction_service, metrics.clone());

    // 创建可观测性状态并集成路由
    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics,
        store,
    ));
    let api_router = api::create_router(app_state, &config.server);
    let router = create_observability_router(observability_state).merge(api_router);
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
