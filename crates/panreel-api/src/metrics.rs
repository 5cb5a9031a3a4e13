//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

use crate::routes::{GENERATE_PATH, HEALTH_PATHS, METRICS_PATH};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "panreel_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "panreel_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "panreel_http_requests_in_flight";

    // Render metrics
    pub const RENDER_DURATION_SECONDS: &str = "panreel_render_duration_seconds";
    pub const RENDERS_IN_FLIGHT: &str = "panreel_renders_in_flight";
    pub const UPLOAD_BYTES: &str = "panreel_upload_bytes";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "panreel_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the wall-clock time of a finished render request.
pub fn record_render_duration(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Keeps a gauge raised while alive.
///
/// Concurrent holders each add one and take it back on drop, so the gauge
/// tracks live work even when a request future is dropped mid-render.
#[must_use = "the gauge drops back as soon as the guard is dropped"]
pub struct InFlightGuard {
    gauge: &'static str,
}

impl InFlightGuard {
    pub fn enter(name: &'static str) -> Self {
        gauge!(name).increment(1.0);
        Self { gauge: name }
    }

    /// Count one render that holds a permit.
    pub fn render() -> Self {
        Self::enter(names::RENDERS_IN_FLIGHT)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(self.gauge).decrement(1.0);
    }
}

pub fn record_upload_size(bytes: usize) {
    histogram!(names::UPLOAD_BYTES).record(bytes as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse paths into a bounded label set.
fn sanitize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let known = trimmed == GENERATE_PATH || trimmed == METRICS_PATH || HEALTH_PATHS.contains(&trimmed);
    if trimmed.is_empty() {
        "/".to_string()
    } else if known {
        trimmed.to_string()
    } else {
        "other".to_string()
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let in_flight = InFlightGuard::enter(names::HTTP_REQUESTS_IN_FLIGHT);
    let response = next.run(request).await;
    drop(in_flight);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
