//! Request, result and persistence entities.

use crate::{DifficultyLevel, OutputMode, StorageError, Timestamp, TopicSource};
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUESTS
// ============================================================================

/// Inbound generation request, exactly as the caller sent it.
///
/// Enumerated fields are kept as raw strings so that out-of-range values are
/// rejected by validation with an invalid-argument error instead of failing
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// A request that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub text: String,
    pub mode: OutputMode,
    pub topic: Option<String>,
    pub level: Option<DifficultyLevel>,
    pub language: String,
    pub idempotency_key: Option<String>,
}

impl ValidatedRequest {
    /// The subset of the request the generation provider sees.
    pub fn provider_request(&self) -> ProviderRequest {
        ProviderRequest {
            text: self.text.clone(),
            mode: self.mode,
            topic: self.topic.clone(),
            level: self.level,
            language: self.language.clone(),
        }
    }
}

/// Input to a generation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub text: String,
    pub mode: OutputMode,
    pub topic: Option<String>,
    pub level: Option<DifficultyLevel>,
    pub language: String,
}

// ============================================================================
// RESULTS
// ============================================================================

/// A question/answer pair. Fields a model leaves out decode as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(rename = "q", default)]
    pub question: String,
    #[serde(rename = "a", default)]
    pub answer: String,
}

/// A multiple-choice question. Fields a model leaves out decode as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    #[serde(rename = "q", default)]
    pub question: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub answer: String,
}

/// Processing metadata attached to every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMeta {
    pub model: String,
    pub provider: String,
    pub processing_ms: u64,
}

/// Structured learning material produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: String,
    pub topic: String,
    pub topic_source: TopicSource,
    pub topic_confidence: f64,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
    #[serde(default)]
    pub quiz: Vec<QuizItem>,
    pub meta: ResultMeta,
    pub created_at: Timestamp,
}

impl GenerationResult {
    /// Reconcile topic provenance with what the caller asked for.
    ///
    /// A caller topic always wins: provenance becomes `User` and confidence
    /// exactly 1.0. Without one the provider cannot claim user provenance.
    pub fn attribute_topic(&mut self, caller_topic: Option<&str>) {
        match caller_topic {
            Some(topic) => {
                self.topic = topic.to_string();
                self.topic_source = TopicSource::User;
                self.topic_confidence = 1.0;
            }
            None => {
                self.topic_source = TopicSource::Inferred;
            }
        }
    }
}

// ============================================================================
// PERSISTENCE
// ============================================================================

/// One persisted generation outcome.
///
/// Topic, provenance and confidence are denormalized out of `result` so the
/// store can index them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub request: serde_json::Value,
    pub result: serde_json::Value,
    pub topic: String,
    pub topic_source: TopicSource,
    pub topic_confidence: f64,
    pub created_at: Timestamp,
}

impl StoredRecord {
    /// Serialize a request/result pair into a record keyed by the result id.
    pub fn from_parts(
        request: &GenerationRequest,
        result: &GenerationResult,
    ) -> Result<Self, StorageError> {
        let request_json = serde_json::to_value(request).map_err(|e| StorageError::Serialization {
            reason: format!("request: {}", e),
        })?;
        let result_json = serde_json::to_value(result).map_err(|e| StorageError::Serialization {
            reason: format!("result: {}", e),
        })?;

        Ok(Self {
            id: result.id.clone(),
            request: request_json,
            result: result_json,
            topic: result.topic.clone(),
            topic_source: result.topic_source,
            topic_confidence: result.topic_confidence,
            created_at: result.created_at,
        })
    }

    /// Decode the stored result payload.
    pub fn decode_result(&self) -> Result<GenerationResult, StorageError> {
        serde_json::from_value(self.result.clone()).map_err(|e| StorageError::Serialization {
            reason: format!("stored result {}: {}", self.id, e),
        })
    }
}
