//! Structured render logging.
//!
//! Provides consistent, structured logging for render requests with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use panreel_models::PanningPlan;

use crate::error::MediaError;

/// Logger carrying the render id and source file through every event.
#[derive(Debug, Clone)]
pub struct RenderLogger {
    render_id: String,
    source: String,
}

impl RenderLogger {
    pub fn new(render_id: Uuid, source: impl Into<String>) -> Self {
        Self {
            render_id: render_id.to_string(),
            source: source.into(),
        }
    }

    pub fn log_start(&self, duration_secs: f64) {
        info!(
            render_id = %self.render_id,
            source = %self.source,
            duration_secs,
            "Render started"
        );
    }

    /// Log the computed geometry.
    pub fn log_plan(&self, plan: &PanningPlan) {
        info!(
            render_id = %self.render_id,
            source_size = %plan.source,
            orientation = %plan.orientation,
            crop = %plan.crop_size(),
            y_offset = plan.y_offset,
            output = %plan.output_resolution(),
            encoded = %plan.encoded_resolution(),
            pan_range = plan.pan_range_pixels,
            velocity = plan.pan_velocity_px_per_sec,
            "Pan plan computed"
        );
        if plan.is_static() {
            warn!(
                render_id = %self.render_id,
                "Image has no horizontal room to pan, rendering a still video"
            );
        }
    }

    pub fn log_completion(&self, elapsed_ms: u128) {
        info!(
            render_id = %self.render_id,
            elapsed_ms = %elapsed_ms,
            "Render completed"
        );
    }

    pub fn log_failure(&self, err: &MediaError) {
        error!(
            render_id = %self.render_id,
            source = %self.source,
            diagnostics = err.diagnostics().unwrap_or(""),
            "Render failed: {}", err
        );
    }

    /// Span that wraps the whole render.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("render", render_id = %self.render_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_logger_creation() {
        let id = Uuid::new_v4();
        let logger = RenderLogger::new(id, "photo.jpg");
        assert_eq!(logger.render_id, id.to_string());
        assert_eq!(logger.source, "photo.jpg");
    }
}
