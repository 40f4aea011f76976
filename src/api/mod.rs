//! API 模块
//!
//! 提供 REST API 支持。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

use crate::api::app_state::AppState;
use crate::api::middleware::security_headers_middleware;
use crate::config::ServerConfig;
use crate::observability::metrics_middleware;
use axum::{Router, extract::DefaultBodyLimit};
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub fn create_router(app_state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        .merge(routes::entry_routes::create_entry_router())
        .merge(routes::predict_routes::create_predict_router());

    let mut router = Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn_with_state(
            app_state.metrics.clone(),
            metrics_middleware,
        ))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive());

    if server.max_request_size > 0 {
        router = router.layer(DefaultBodyLimit::max(server.max_request_size));
    }
    if server.request_timeout > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout)));
    }

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}
