//! Error types for LearnForge operations

use thiserror::Error;

/// Stable error kinds surfaced to callers of the orchestration layer.
///
/// Every [`LearnforgeError`] maps onto exactly one kind; transports translate
/// kinds (not individual variants) into their own status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input. Never retried.
    InvalidArgument,
    /// Missing identifier.
    NotFound,
    /// The generation provider ran out of time.
    UpstreamTimeout,
    /// The generation provider failed for any other reason.
    UpstreamError,
    /// Unexpected local failure.
    Internal,
}

impl ErrorKind {
    /// Wire representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {value:?} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Result store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Result not found: {id}")]
    NotFound { id: String },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Migration {version} failed: {reason}")]
    MigrationFailed { version: i32, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Store is closed")]
    Closed,
}

/// Cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache key not found: {key}")]
    NotFound { key: String },

    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("Cache is closed")]
    Closed,
}

/// Failures of a single upstream generation attempt.
///
/// Classified structurally at the transport boundary so the retry policy never
/// has to inspect error text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {reason}")]
    Connection { reason: String },

    #[error("Network failure: {reason}")]
    Network { reason: String },

    #[error("Upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Upstream returned no content")]
    EmptyResponse,

    #[error("Failed to build request: {reason}")]
    RequestBuild { reason: String },
}

impl ProviderError {
    /// Whether another attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout
            | ProviderError::Connection { .. }
            | ProviderError::Network { .. } => true,
            ProviderError::Status { status, .. } => *status >= 500,
            ProviderError::MalformedResponse { .. }
            | ProviderError::EmptyResponse
            | ProviderError::RequestBuild { .. } => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Provider not supported: {provider}")]
    ProviderNotSupported { provider: String },

    #[error("Failed to read config file {path}: {reason}")]
    FileRead { path: String, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Master error type for all LearnForge errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LearnforgeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream error from {provider}: {source}")]
    Upstream {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl LearnforgeError {
    /// Wrap a provider failure with the id of the provider that raised it.
    pub fn upstream(provider: impl Into<String>, source: ProviderError) -> Self {
        LearnforgeError::Upstream {
            provider: provider.into(),
            source,
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        LearnforgeError::Internal {
            reason: reason.into(),
        }
    }

    /// Stable kind used by transports and metrics.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LearnforgeError::Validation(_) => ErrorKind::InvalidArgument,
            LearnforgeError::Storage(StorageError::NotFound { .. }) => ErrorKind::NotFound,
            LearnforgeError::Cache(CacheError::NotFound { .. }) => ErrorKind::NotFound,
            LearnforgeError::Upstream { source, .. } if source.is_timeout() => {
                ErrorKind::UpstreamTimeout
            }
            LearnforgeError::Upstream { .. } => ErrorKind::UpstreamError,
            LearnforgeError::Storage(_)
            | LearnforgeError::Cache(_)
            | LearnforgeError::Config(_)
            | LearnforgeError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type alias for LearnForge operations.
pub type LearnforgeResult<T> = Result<T, LearnforgeError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_invalid_value() {
        let err = ValidationError::InvalidValue {
            field: "mode".to_string(),
            value: "essay".to_string(),
            reason: "must be one of: lesson, flashcards, quiz".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("mode"));
        assert!(msg.contains("essay"));
        assert!(msg.contains("lesson, flashcards, quiz"));
    }

    #[test]
    fn test_provider_error_retryable_classification() {
        assert!(ProviderError::Timeout.is_retryable());
        assert!(ProviderError::Connection {
            reason: "refused".to_string()
        }
        .is_retryable());
        assert!(ProviderError::Network {
            reason: "reset".to_string()
        }
        .is_retryable());
        assert!(ProviderError::Status {
            status: 503,
            message: String::new()
        }
        .is_retryable());

        assert!(!ProviderError::Status {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!ProviderError::Status {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!ProviderError::MalformedResponse {
            reason: "eof".to_string()
        }
        .is_retryable());
        assert!(!ProviderError::EmptyResponse.is_retryable());
        assert!(!ProviderError::RequestBuild {
            reason: "bad url".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_kind_mapping() {
        let validation = LearnforgeError::from(ValidationError::RequiredFieldMissing {
            field: "text".to_string(),
        });
        assert_eq!(validation.kind(), ErrorKind::InvalidArgument);

        let missing = LearnforgeError::from(StorageError::NotFound {
            id: "abc".to_string(),
        });
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert!(missing.is_not_found());

        let query = LearnforgeError::from(StorageError::QueryFailed {
            reason: "boom".to_string(),
        });
        assert_eq!(query.kind(), ErrorKind::Internal);
        assert!(!query.is_not_found());

        let timeout = LearnforgeError::upstream("openai-compatible", ProviderError::Timeout);
        assert_eq!(timeout.kind(), ErrorKind::UpstreamTimeout);

        let status = LearnforgeError::upstream(
            "gemini",
            ProviderError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            },
        );
        assert_eq!(status.kind(), ErrorKind::UpstreamError);

        let config = LearnforgeError::from(ConfigError::MissingRequired {
            field: "ai.api_key".to_string(),
        });
        assert_eq!(config.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_upstream_display_includes_provider_and_cause() {
        let err = LearnforgeError::upstream(
            "gemini",
            ProviderError::Connection {
                reason: "refused".to_string(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("gemini"));
        assert!(msg.contains("refused"));
    }

    #[test]
    fn test_error_kind_wire_strings() {
        assert_eq!(ErrorKind::InvalidArgument.as_str(), "invalid_argument");
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::UpstreamTimeout.as_str(), "upstream_timeout");
        assert_eq!(ErrorKind::UpstreamError.as_str(), "upstream_error");
        assert_eq!(ErrorKind::Internal.to_string(), "internal");
    }
}
