//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use panreel_models::{InvalidDimensions, InvalidDuration, UnsupportedImageFormat};

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing or rendering.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error(transparent)]
    InvalidInputFormat(#[from] UnsupportedImageFormat),

    #[error("Could not read image {}: {message}", path.display())]
    Probe {
        path: PathBuf,
        message: String,
        stderr: Option<String>,
    },

    #[error("Encoding failed: {message}")]
    Encoding {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Invalid render request: {0}")]
    ContractViolation(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a probe failure error.
    pub fn probe_failed(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        stderr: Option<String>,
    ) -> Self {
        Self::Probe {
            path: path.into(),
            message: message.into(),
            stderr,
        }
    }

    /// Create an encoder failure error.
    pub fn encoding_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::Encoding {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Diagnostic output captured from the external tool, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            MediaError::Probe { stderr, .. } | MediaError::Encoding { stderr, .. } => {
                stderr.as_deref().filter(|s| !s.trim().is_empty())
            }
            _ => None,
        }
    }

    /// Whether the caller sent something unusable, as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MediaError::InvalidInputFormat(_)
                | MediaError::ContractViolation(_)
                | MediaError::Probe { .. }
                | MediaError::FileNotFound(_)
        )
    }
}

impl From<InvalidDimensions> for MediaError {
    fn from(err: InvalidDimensions) -> Self {
        MediaError::ContractViolation(err.to_string())
    }
}

impl From<InvalidDuration> for MediaError {
    fn from(err: InvalidDuration) -> Self {
        MediaError::ContractViolation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_only_for_tool_errors() {
        let err = MediaError::encoding_failed("exit 1", Some("width not divisible by 2".into()), Some(1));
        assert_eq!(err.diagnostics(), Some("width not divisible by 2"));

        let err = MediaError::encoding_failed("exit 1", Some("  \n".into()), Some(1));
        assert_eq!(err.diagnostics(), None);

        assert_eq!(MediaError::Timeout(5).diagnostics(), None);
    }

    #[test]
    fn test_contract_violation_conversions() {
        let err: MediaError = InvalidDuration(0.0).into();
        assert!(matches!(err, MediaError::ContractViolation(_)));
        assert!(err.is_client_error());

        let err: MediaError = UnsupportedImageFormat("a.gif".into()).into();
        assert!(matches!(err, MediaError::InvalidInputFormat(_)));
    }
}
