//! Supported still-image input formats.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Image formats accepted as pan sources, recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

/// Extensions accepted on input, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

impl ImageFormat {
    /// Detect the format from a file path's final suffix.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UnsupportedImageFormat> {
        let path = path.as_ref();
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::from_suffix)
            .ok_or_else(|| UnsupportedImageFormat(path.display().to_string()))
    }

    /// Detect the format from an uploaded file name.
    ///
    /// Only the text after the last dot counts, so a bare `.png` is a PNG.
    pub fn from_filename(name: &str) -> Result<Self, UnsupportedImageFormat> {
        Self::from_suffix(name).ok_or_else(|| UnsupportedImageFormat(name.to_string()))
    }

    fn from_suffix(name: &str) -> Option<Self> {
        let (_, suffix) = name.rsplit_once('.')?;
        suffix.parse().ok()
    }

    /// Canonical extension used when the file is written to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = UnsupportedImageFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            _ => Err(UnsupportedImageFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported image format: {0} (supported: PNG, JPG, JPEG, WEBP)")]
pub struct UnsupportedImageFormat(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename_is_case_insensitive() {
        assert_eq!(ImageFormat::from_filename("a.PNG").unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::from_filename("a.Jpeg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_filename("a.jpg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_filename("photo.webp").unwrap(), ImageFormat::Webp);
    }

    #[test]
    fn test_rejects_other_extensions() {
        assert!(ImageFormat::from_filename("clip.gif").is_err());
        assert!(ImageFormat::from_filename("noext").is_err());
        assert!(ImageFormat::from_filename("archive.png.zip").is_err());
        assert!(ImageFormat::from_filename("trailing.").is_err());
        assert!(ImageFormat::from_path("/tmp/png").is_err());
    }

    #[test]
    fn test_name_that_is_only_a_suffix() {
        assert_eq!(ImageFormat::from_filename(".png").unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::from_filename(".JPEG").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_path("/tmp/.webp").unwrap(), ImageFormat::Webp);
        assert_eq!(ImageFormat::from_path("uploads/.png").unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_every_supported_extension_parses() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(ext.parse::<ImageFormat>().is_ok(), "{ext}");
        }
    }

    #[test]
    fn test_canonical_extension() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Webp.extension(), "webp");
    }
}
