//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /generate-video`: image upload in, panning MP4 out
//! - Health and readiness checks
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
