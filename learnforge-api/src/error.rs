//! Error Types for the LearnForge API
//!
//! Maps [`LearnforgeError`] kinds onto HTTP statuses and a JSON body of the
//! form `{"error": {"code": "...", "message": "..."}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use learnforge_core::{ErrorKind, LearnforgeError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses, one per [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request validation failed (400)
    InvalidArgument,
    /// Requested result does not exist (404)
    NotFound,
    /// The generation provider did not answer in time (504)
    UpstreamTimeout,
    /// The generation provider failed (502)
    UpstreamError,
    /// Unexpected server-side failure (500)
    Internal,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "Invalid request",
            ErrorCode::NotFound => "Result not found",
            ErrorCode::UpstreamTimeout => "Content generation timed out",
            ErrorCode::UpstreamError => "Content generation failed",
            ErrorCode::Internal => "Internal server error",
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidArgument => ErrorCode::InvalidArgument,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::UpstreamTimeout => ErrorCode::UpstreamTimeout,
            ErrorKind::UpstreamError => ErrorCode::UpstreamError,
            ErrorKind::Internal => ErrorCode::Internal,
        }
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// Structured error returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a ApiError,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Client-facing errors keep their message; server-side ones are logged in
/// full and replaced by the code's default message.
impl From<LearnforgeError> for ApiError {
    fn from(err: LearnforgeError) -> Self {
        let code = ErrorCode::from(err.kind());
        match code {
            ErrorCode::InvalidArgument | ErrorCode::NotFound => Self::new(code, err.to_string()),
            _ => {
                tracing::error!(error = %err, code = ?code, "Request failed");
                Self::from_code(code)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorEnvelope { error: &self })).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use learnforge_core::{ProviderError, StorageError, ValidationError};

    #[test]
    fn test_status_per_kind() {
        let cases = [
            (
                LearnforgeError::from(ValidationError::RequiredFieldMissing {
                    field: "text".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                LearnforgeError::from(StorageError::NotFound { id: "x".to_string() }),
                StatusCode::NOT_FOUND,
            ),
            (
                LearnforgeError::upstream("openai-compatible", ProviderError::Timeout),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                LearnforgeError::upstream("gemini", ProviderError::EmptyResponse),
                StatusCode::BAD_GATEWAY,
            ),
            (
                LearnforgeError::internal("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = LearnforgeError::from(StorageError::ConnectionFailed {
            reason: "password authentication failed for user admin".to_string(),
        });
        let api = ApiError::from(err);
        assert_eq!(api.code, ErrorCode::Internal);
        assert!(!api.message.contains("password"));
    }

    #[test]
    fn test_client_errors_keep_message() {
        let err = LearnforgeError::from(ValidationError::RequiredFieldMissing {
            field: "text".to_string(),
        });
        assert!(ApiError::from(err).message.contains("text"));
    }

    #[test]
    fn test_envelope_shape() {
        let api = ApiError::invalid_argument("bad mode");
        let body = serde_json::to_value(ErrorEnvelope { error: &api }).unwrap();
        assert_eq!(body["error"]["code"], "invalid_argument");
        assert_eq!(body["error"]["message"], "bad mode");
    }
}
