//! Upstream chat backends
//!
//! Each backend turns a prompt into one raw model reply. Retry and
//! normalization live in [`crate::ContentGenerator`], not here.

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAIClient;

use learnforge_core::ProviderError;
use std::time::Duration;

/// Default HTTP client timeout for upstream calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest upstream error body kept in a [`ProviderError::Status`] message.
const MAX_ERROR_BODY: usize = 512;

/// Classify a transport error by its structured category.
///
/// The request URL is dropped first so nothing carried in it reaches
/// error messages or logs.
pub(crate) fn classify_reqwest_error(err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_connect() {
        ProviderError::Connection {
            reason: err.to_string(),
        }
    } else if err.is_builder() {
        ProviderError::RequestBuild {
            reason: err.to_string(),
        }
    } else if err.is_decode() {
        ProviderError::MalformedResponse {
            reason: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        ProviderError::Status {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else {
        // Request/body failures mid-transfer.
        ProviderError::Network {
            reason: err.to_string(),
        }
    }
}

/// Build a status error from a non-success response body.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let mut message = body.trim().to_string();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    ProviderError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Build the shared reqwest client with the given request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::RequestBuild {
            reason: e.to_string(),
        })
}
