//! Pan geometry planning.
//!
//! Derives the crop window, the output resolution and the horizontal pan
//! velocity for a still image rendered as a 9:16 portrait video that slides
//! from the left edge of the image towards the right edge.
//!
//! All dimension arithmetic is done on integers: `floor(x * 9 / 16)` is
//! computed as `x * 9 / 16` in `u64`, and the wide/narrow test
//! `width / height > 9 / 16` as `16 * width > 9 * height`. This keeps the
//! results exact for every input size and identical across platforms.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dimensions::ImageDimensions;

/// Width term of the 9:16 target aspect ratio.
pub const ASPECT_WIDTH: u32 = 9;
/// Height term of the 9:16 target aspect ratio.
pub const ASPECT_HEIGHT: u32 = 16;

/// Upper bound for the encoded frame width.
pub const MAX_OUTPUT_WIDTH: u32 = 720;
/// Upper bound for the encoded frame height.
pub const MAX_OUTPUT_HEIGHT: u32 = 1280;

/// Duration used when the caller does not ask for one.
pub const DEFAULT_DURATION_SECS: f64 = 3.0;

/// How the source image relates to the 9:16 target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Wider than 9:16; the crop spans the full height.
    Wide,
    /// Exactly 9:16 or taller; the crop spans the full width.
    Narrow,
}

impl Orientation {
    /// Classify an image. Exact 9:16 counts as narrow.
    pub fn classify(source: ImageDimensions) -> Self {
        let lhs = u64::from(source.width()) * u64::from(ASPECT_HEIGHT);
        let rhs = u64::from(source.height()) * u64::from(ASPECT_WIDTH);
        if lhs > rhs {
            Orientation::Wide
        } else {
            Orientation::Narrow
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Wide => write!(f, "wide"),
            Orientation::Narrow => write!(f, "narrow"),
        }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Round both sides down to an even number, never below 2.
    ///
    /// libx264 with 4:2:0 chroma subsampling rejects odd frame sizes.
    pub fn to_even(self) -> Self {
        Self {
            width: make_even(self.width),
            height: make_even(self.height),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Round down to the nearest even number, with 2 as the floor.
#[inline]
pub fn make_even(value: u32) -> u32 {
    ((value / 2) * 2).max(2)
}

/// `floor(height * 9 / 16)`.
fn width_for_height(height: u32) -> u64 {
    u64::from(height) * u64::from(ASPECT_WIDTH) / u64::from(ASPECT_HEIGHT)
}

/// `floor(width * 16 / 9)`.
fn height_for_width(width: u32) -> u64 {
    u64::from(width) * u64::from(ASPECT_HEIGHT) / u64::from(ASPECT_WIDTH)
}

/// Saturating narrowing for values already bounded by a `u32` input.
fn narrow(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Size of the crop window cut out of the source image.
///
/// Wide images keep the full height; narrow images keep the full width and
/// fall back to the full height if rounding pushes the crop past it. The width
/// is clamped to the source width as a last step so the window always fits.
pub fn crop_geometry(source: ImageDimensions) -> Resolution {
    let (width, height) = match Orientation::classify(source) {
        Orientation::Wide => {
            let height = source.height();
            (narrow(width_for_height(height)), height)
        }
        Orientation::Narrow => {
            let width = source.width();
            let height = height_for_width(width);
            if height > u64::from(source.height()) {
                let height = source.height();
                (narrow(width_for_height(height)), height)
            } else {
                (width, narrow(height))
            }
        }
    };

    Resolution::new(
        width.clamp(1, source.width()),
        height.clamp(1, source.height()),
    )
}

/// Final frame size of the rendered video, capped at 720x1280.
///
/// Derived from the source dimensions, not from the crop window.
pub fn output_resolution(source: ImageDimensions) -> Resolution {
    match Orientation::classify(source) {
        Orientation::Wide => {
            let height = source.height().min(MAX_OUTPUT_HEIGHT);
            Resolution::new(narrow(width_for_height(height)).max(1), height)
        }
        Orientation::Narrow => {
            let width = source.width().min(MAX_OUTPUT_WIDTH);
            Resolution::new(width, narrow(height_for_width(width)).max(1))
        }
    }
}

/// Pan velocity in pixels per second. Zero unless both the range and the
/// duration are strictly positive.
pub fn pan_velocity(pan_range_pixels: u32, duration_secs: f64) -> f64 {
    if duration_secs > 0.0 && pan_range_pixels > 0 {
        f64::from(pan_range_pixels) / duration_secs
    } else {
        0.0
    }
}

/// Everything the encoder needs to render one panning video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PanningPlan {
    /// Source image size the plan was computed for
    pub source: ImageDimensions,
    /// Wide or narrow classification
    pub orientation: Orientation,
    /// Crop window width
    pub crop_width: u32,
    /// Crop window height
    pub crop_height: u32,
    /// Planned output frame width
    pub output_width: u32,
    /// Planned output frame height
    pub output_height: u32,
    /// Fixed vertical crop origin
    pub y_offset: u32,
    /// Horizontal distance travelled by the crop window
    pub pan_range_pixels: u32,
    /// Horizontal crop velocity
    pub pan_velocity_px_per_sec: f64,
    /// Video length
    pub duration_seconds: f64,
}

impl PanningPlan {
    /// Compute the plan for a source image and a duration in seconds.
    pub fn compute(source: ImageDimensions, duration_secs: f64) -> Self {
        let orientation = Orientation::classify(source);
        let crop = crop_geometry(source);
        let output = output_resolution(source);

        let y_offset = (source.height() - crop.height) / 2;
        let pan_range_pixels = source.width().saturating_sub(crop.width);
        let pan_velocity_px_per_sec = pan_velocity(pan_range_pixels, duration_secs);

        Self {
            source,
            orientation,
            crop_width: crop.width,
            crop_height: crop.height,
            output_width: output.width,
            output_height: output.height,
            y_offset,
            pan_range_pixels,
            pan_velocity_px_per_sec,
            duration_seconds: duration_secs,
        }
    }

    pub fn crop_size(&self) -> Resolution {
        Resolution::new(self.crop_width, self.crop_height)
    }

    pub fn output_resolution(&self) -> Resolution {
        Resolution::new(self.output_width, self.output_height)
    }

    /// Output resolution rounded down to even sides for the H.264 encoder.
    pub fn encoded_resolution(&self) -> Resolution {
        self.output_resolution().to_even()
    }

    /// Whether the crop window moves at all.
    pub fn is_static(&self) -> bool {
        self.pan_range_pixels == 0 || self.pan_velocity_px_per_sec == 0.0
    }

    /// Horizontal crop origin `t` seconds into the video.
    ///
    /// Linear in `t` until the window reaches the right edge, then held there.
    /// Negative `t` is treated as 0.
    pub fn crop_x_at(&self, t: f64) -> f64 {
        if self.is_static() {
            return 0.0;
        }
        (self.pan_velocity_px_per_sec * t.max(0.0)).min(f64::from(self.pan_range_pixels))
    }

    /// Crop origin as an FFmpeg expression over the frame time `t`.
    ///
    /// The comma is not escaped; see the media crate's filter builder.
    pub fn crop_x_expression(&self) -> String {
        if self.is_static() {
            "0".to_string()
        } else {
            format!(
                "min({}*t,{})",
                self.pan_velocity_px_per_sec, self.pan_range_pixels
            )
        }
    }
}

/// Free-function form of [`PanningPlan::compute`].
pub fn compute_panning_plan(source: ImageDimensions, duration_secs: f64) -> PanningPlan {
    PanningPlan::compute(source, duration_secs)
}

/// A duration that cannot be used for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Duration must be a positive number of seconds, got {0}")]
pub struct InvalidDuration(pub f64);

/// Accept only finite, strictly positive durations.
pub fn validate_duration(duration_secs: f64) -> Result<f64, InvalidDuration> {
    if duration_secs.is_finite() && duration_secs > 0.0 {
        Ok(duration_secs)
    } else {
        Err(InvalidDuration(duration_secs))
    }
}
