//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{generate_video, health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, hide_internal_errors, rate_limit_middleware, request_id, request_logging,
    security_headers, ClientRateLimiter,
};
use crate::state::AppState;

pub const GENERATE_PATH: &str = "/generate-video";
pub const METRICS_PATH: &str = "/metrics";

/// Liveness and readiness endpoints.
pub const HEALTH_PATHS: [&str; 3] = ["/health", "/healthz", "/ready"];

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = Arc::new(ClientRateLimiter::per_second(state.config.rate_limit_rps));

    let render_routes = Router::new()
        .route(GENERATE_PATH, post(generate_video))
        .route(&format!("{}/", GENERATE_PATH), post(generate_video))
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let [health_path, healthz_path, ready_path] = HEALTH_PATHS;
    let health_routes = Router::new()
        .route(health_path, get(health))
        .route(healthz_path, get(health))
        .route(ready_path, get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route(METRICS_PATH, get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(render_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Multipart has its own 2MB default; the layer below is the real limit
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn_with_state(state.clone(), hide_internal_errors))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
