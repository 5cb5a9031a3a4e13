//! Source image dimensions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel size of a still image. Both sides are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RawImageDimensions")]
pub struct ImageDimensions {
    width: u32,
    height: u32,
}

#[derive(Deserialize, JsonSchema)]
struct RawImageDimensions {
    width: u32,
    height: u32,
}

impl TryFrom<RawImageDimensions> for ImageDimensions {
    type Error = InvalidDimensions;

    fn try_from(raw: RawImageDimensions) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height)
    }
}

impl ImageDimensions {
    /// Create dimensions, rejecting a zero width or height.
    pub fn new(width: u32, height: u32) -> Result<Self, InvalidDimensions> {
        if width == 0 || height == 0 {
            return Err(InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Create dimensions from signed values as reported by external tools.
    pub fn from_signed(width: i64, height: i64) -> Result<Self, InvalidDimensions> {
        let clamp = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
        if width <= 0 || height <= 0 {
            return Err(InvalidDimensions {
                width: clamp(width),
                height: clamp(height),
            });
        }
        Self::new(clamp(width), clamp(height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl std::fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Width or height was not a positive number of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Image dimensions must be positive, got {width}x{height}")]
pub struct InvalidDimensions {
    pub width: u32,
    pub height: u32,
}
