//! LearnForge Core - Domain Types
//!
//! Requests, results, persisted records, validation and the error taxonomy
//! shared by every other LearnForge crate. No I/O lives here.

use chrono::{DateTime, Utc};

// ============================================================================
// MODULES
// ============================================================================

mod entities;
mod enums;
mod error;
mod identity;
mod validation;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use entities::{
    Flashcard, GenerationRequest, GenerationResult, ProviderRequest, QuizItem, ResultMeta,
    StoredRecord, ValidatedRequest,
};
pub use enums::{DifficultyLevel, EnumParseError, OutputMode, TopicSource};
pub use error::{
    CacheError, ConfigError, ErrorKind, LearnforgeError, LearnforgeResult, ProviderError,
    StorageError, ValidationError,
};
pub use identity::{derive_request_id, new_request_id, request_id_for, DERIVED_ID_LEN};
pub use validation::{validate_request, DEFAULT_LANGUAGE};

// ============================================================================
// SHARED TYPES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
