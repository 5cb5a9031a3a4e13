//! Shared data models for panreel.
//!
//! This crate provides:
//! - Source image dimensions and accepted input formats
//! - The pan geometry planner (crop window, output size, pan velocity)
//! - Encoding configuration

pub mod dimensions;
pub mod encoding;
pub mod format;
pub mod plan;

// Re-export common types
pub use dimensions::{ImageDimensions, InvalidDimensions};
pub use encoding::EncodingConfig;
pub use format::{ImageFormat, UnsupportedImageFormat, SUPPORTED_EXTENSIONS};
pub use plan::{
    compute_panning_plan, crop_geometry, output_resolution, validate_duration, InvalidDuration,
    Orientation, PanningPlan, Resolution, DEFAULT_DURATION_SECS, MAX_OUTPUT_HEIGHT,
    MAX_OUTPUT_WIDTH,
};
