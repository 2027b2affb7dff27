//! LearnForge LLM - Provider Abstraction
//!
//! Turns a validated request into structured learning material by prompting
//! one of several interchangeable upstream backends. Backends only move bytes;
//! retry, deadline handling and reply normalization are shared here.

use async_trait::async_trait;
use chrono::Utc;
use learnforge_core::{
    GenerationResult, LearnforgeError, LearnforgeResult, ProviderError, ProviderRequest,
};
use tokio::time::Instant;

mod normalize;
mod prompt;
pub mod providers;
mod retry;

pub use normalize::{clamp_confidence, normalize_reply};
pub use prompt::build_prompt;
pub use providers::{GeminiClient, OpenAIClient};
pub use retry::RetryPolicy;

// ============================================================================
// GENERATION PROVIDER TRAIT
// ============================================================================

/// Produces a [`GenerationResult`] for a request.
///
/// Implementations must be thread-safe (Send + Sync) and must never let the
/// call run past `deadline`.
///
/// # Returns
/// * `Ok(GenerationResult)` - With an empty id and zero processing time
/// * `Err(LearnforgeError::Upstream)` - Once retries are exhausted or on a non-retryable failure
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Stable provider name reported in result metadata.
    fn provider_id(&self) -> &str;

    async fn generate(
        &self,
        request: &ProviderRequest,
        deadline: Instant,
    ) -> LearnforgeResult<GenerationResult>;
}

// ============================================================================
// CHAT BACKEND TRAIT
// ============================================================================

/// Raw reply from one upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    /// Text content the model produced.
    pub content: String,
    /// Model name the upstream reported, or the configured one.
    pub model: String,
}

/// A single upstream text-generation endpoint.
///
/// One call to [`ChatBackend::complete`] is one HTTP POST. Failures must be
/// classified into [`ProviderError`] at this boundary.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn provider_id(&self) -> &str;

    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<BackendReply, ProviderError>;
}

// ============================================================================
// CONTENT GENERATOR
// ============================================================================

/// [`GenerationProvider`] over any [`ChatBackend`].
#[derive(Debug)]
pub struct ContentGenerator<B> {
    backend: B,
    retry: RetryPolicy,
}

impl<B: ChatBackend> ContentGenerator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn attempt(&self, prompt: &str) -> Result<GenerationResult, ProviderError> {
        let reply = self.backend.complete(prompt).await?;
        normalize_reply(
            &reply.content,
            self.backend.provider_id(),
            &reply.model,
            Utc::now(),
        )
    }
}

#[async_trait]
impl<B: ChatBackend> GenerationProvider for ContentGenerator<B> {
    fn provider_id(&self) -> &str {
        self.backend.provider_id()
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
        deadline: Instant,
    ) -> LearnforgeResult<GenerationResult> {
        let prompt_text = build_prompt(request);
        let prompt = prompt_text.as_str();
        let provider = self.backend.provider_id();

        self.retry
            .run(deadline, |attempt| {
                tracing::debug!(provider, model = self.backend.model(), attempt, "Calling upstream");
                self.attempt(prompt)
            })
            .await
            .map_err(|err| {
                tracing::warn!(provider, error = %err, "Generation failed");
                LearnforgeError::upstream(provider, err)
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================
