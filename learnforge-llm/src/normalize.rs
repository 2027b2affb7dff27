//! Mapping raw model replies onto validated results.

use learnforge_core::{
    Flashcard, GenerationResult, ProviderError, QuizItem, ResultMeta, Timestamp, TopicSource,
};
use serde::Deserialize;

/// Payload the model is instructed to return.
#[derive(Debug, Clone, Default, Deserialize)]
struct GeneratedContent {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    topic_source: String,
    #[serde(default)]
    topic_confidence: Option<f64>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    flashcards: Vec<Flashcard>,
    #[serde(default)]
    quiz: Vec<QuizItem>,
}

/// Clamp a confidence into `[0, 1]`. Non-finite values become 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Strip a surrounding markdown code fence, if the model added one anyway.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

/// Parse a model reply into a [`GenerationResult`].
///
/// The returned result has an empty id and zero processing time; the
/// orchestration layer fills both in.
pub fn normalize_reply(
    content: &str,
    provider: &str,
    model: &str,
    created_at: Timestamp,
) -> Result<GenerationResult, ProviderError> {
    let payload = strip_code_fence(content);
    if payload.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    let generated: GeneratedContent =
        serde_json::from_str(payload).map_err(|e| ProviderError::MalformedResponse {
            reason: format!("failed to parse JSON content: {}", e),
        })?;

    Ok(GenerationResult {
        id: String::new(),
        topic: generated.topic,
        topic_source: TopicSource::from_provider(&generated.topic_source),
        topic_confidence: clamp_confidence(generated.topic_confidence.unwrap_or(0.0)),
        summary: generated.summary,
        key_points: generated.key_points,
        flashcards: generated.flashcards,
        quiz: generated.quiz,
        meta: ResultMeta {
            model: model.to_string(),
            provider: provider.to_string(),
            processing_ms: 0,
        },
        created_at,
    })
}
