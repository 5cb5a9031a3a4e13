//! Application state.

use std::sync::Arc;

use tokio::sync::Semaphore;

use panreel_media::PanRenderer;
use panreel_models::EncodingConfig;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub renderer: Arc<PanRenderer>,
    /// Permits for concurrently running renders
    pub render_permits: Arc<Semaphore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Self {
        let renderer = PanRenderer::new(EncodingConfig::default()).with_timeout(config.request_timeout);
        let render_permits = Arc::new(Semaphore::new(config.max_concurrent_renders.max(1)));

        Self {
            config,
            renderer: Arc::new(renderer),
            render_permits,
        }
    }
}
