//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use panreel_media::MediaError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    UnprocessableImage(String),

    #[error("Rendering took longer than {0} seconds")]
    Timeout(u64),

    #[error("Service is shutting down")]
    Unavailable,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Media error: {0}")]
    Media(MediaError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            ApiError::UnprocessableImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) | ApiError::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::UnsupportedFormat(_) => "invalid_input_format",
            ApiError::UnprocessableImage(_) => "probe_error",
            ApiError::Timeout(_) => "timeout",
            ApiError::Unavailable => "unavailable",
            ApiError::Internal(_) => "internal_error",
            ApiError::Media(MediaError::Encoding { .. }) => "encoding_error",
            ApiError::Media(_) => "internal_error",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, ApiError::Internal(_) | ApiError::Media(_))
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidInputFormat(e) => ApiError::UnsupportedFormat(e.to_string()),
            MediaError::ContractViolation(msg) => ApiError::BadRequest(msg),
            MediaError::Probe { .. } | MediaError::FileNotFound(_) => {
                ApiError::UnprocessableImage(err.to_string())
            }
            MediaError::Timeout(secs) => ApiError::Timeout(secs),
            MediaError::Cancelled => ApiError::Unavailable,
            other => ApiError::Media(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

fn error_response(status: StatusCode, detail: String, code: &'static str) -> Response {
    let body = ErrorResponse {
        detail,
        code: Some(code.to_string()),
    };
    (status, Json(body)).into_response()
}

/// Response extension marking a body that carries internal error text.
///
/// `middleware::hide_internal_errors` swaps such bodies for a generic one in
/// production.
#[derive(Debug, Clone, Copy)]
pub struct InternalErrorDetail {
    pub code: &'static str,
}

impl InternalErrorDetail {
    /// Same status and code, without the detail.
    pub fn redacted(self, status: StatusCode) -> Response {
        error_response(status, "An internal error occurred".to_string(), self.code)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let mut response = error_response(self.status_code(), self.to_string(), code);
        if self.is_internal() {
            response
                .extensions_mut()
                .insert(InternalErrorDetail { code });
        }
        response
    }
}
