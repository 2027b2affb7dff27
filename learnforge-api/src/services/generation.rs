//! Generation Service
//!
//! Validates a request, resolves its idempotency key, calls the provider
//! under a fixed deadline, finalizes the result and saves it best-effort.

use learnforge_core::{
    request_id_for, validate_request, GenerationRequest, GenerationResult, LearnforgeError,
    LearnforgeResult, ProviderError, StoredRecord,
};
use learnforge_llm::GenerationProvider;
use learnforge_storage::ResultStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::constants::GENERATION_TIMEOUT;
use crate::telemetry::ServiceMetrics;

/// Orchestrates one generation request end to end.
///
/// Holds no per-request state; concurrent calls only share the store and
/// the provider. Two concurrent requests with the same idempotency key may
/// both reach the provider, in which case the later save wins.
pub struct GenerationService {
    store: Arc<dyn ResultStore>,
    provider: Arc<dyn GenerationProvider>,
    metrics: Arc<ServiceMetrics>,
    timeout: Duration,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn ResultStore>,
        provider: Arc<dyn GenerationProvider>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            store,
            provider,
            metrics,
            timeout: GENERATION_TIMEOUT,
        }
    }

    /// Override the generation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Process a request into learning material.
    ///
    /// # Errors
    /// * `InvalidArgument` - Empty text, or mode/level outside their enumerations
    /// * `UpstreamTimeout` / `UpstreamError` - The provider failed
    /// * `Internal` - The idempotency lookup failed for a reason other than not-found
    pub async fn process(&self, request: GenerationRequest) -> LearnforgeResult<GenerationResult> {
        let outcome = self.process_inner(&request).await;
        if let Err(err) = &outcome {
            self.metrics.record_failure(err.kind());
        }
        outcome
    }

    async fn process_inner(&self, request: &GenerationRequest) -> LearnforgeResult<GenerationResult> {
        let validated = validate_request(request)?;
        let id = request_id_for(validated.idempotency_key.as_deref());

        if validated.idempotency_key.is_some() {
            if let Some(existing) = self.lookup_existing(&id).await? {
                tracing::info!(request_id = %id, "Returning stored result for idempotency key");
                self.metrics.record_replay();
                return Ok(existing);
            }
        }

        let provider_request = validated.provider_request();
        let started = Instant::now();
        let deadline = started
            .checked_add(self.timeout)
            .unwrap_or_else(|| started + GENERATION_TIMEOUT);

        let generated = tokio::time::timeout_at(
            deadline,
            self.provider.generate(&provider_request, deadline),
        )
        .await;
        let elapsed = started.elapsed();
        self.metrics.observe_provider_latency(elapsed);

        let mut result = match generated {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::warn!(
                    request_id = %id,
                    provider = self.provider.provider_id(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "Generation failed"
                );
                return Err(err);
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %id,
                    provider = self.provider.provider_id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Generation deadline exceeded"
                );
                return Err(LearnforgeError::upstream(
                    self.provider.provider_id(),
                    ProviderError::Timeout,
                ));
            }
        };

        result.id = id;
        result.attribute_topic(validated.topic.as_deref());
        result.meta.processing_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        self.persist(request, &result).await;
        self.metrics.record_success();

        tracing::info!(
            request_id = %result.id,
            mode = %validated.mode,
            topic = %result.topic,
            topic_source = %result.topic_source.as_str(),
            processing_ms = result.meta.processing_ms,
            "Generated learning material"
        );
        Ok(result)
    }

    /// Fetch a stored result by id.
    pub async fn get_result(&self, id: &str) -> LearnforgeResult<GenerationResult> {
        let record = self.store.get(id).await?;
        Ok(record.decode_result()?)
    }

    /// Not-found falls through to generation; any other failure is surfaced.
    async fn lookup_existing(&self, id: &str) -> LearnforgeResult<Option<GenerationResult>> {
        match self.store.get(id).await {
            Ok(record) => Ok(Some(record.decode_result()?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => {
                tracing::error!(request_id = %id, error = %err, "Idempotency lookup failed");
                Err(err)
            }
        }
    }

    /// Save failures are logged and counted, never returned.
    async fn persist(&self, request: &GenerationRequest, result: &GenerationResult) {
        let saved = match StoredRecord::from_parts(request, result) {
            Ok(record) => self.store.save(&record).await,
            Err(err) => Err(err.into()),
        };

        if let Err(err) = saved {
            self.metrics.record_persistence_failure();
            tracing::error!(
                request_id = %result.id,
                error = %err,
                "Failed to persist result"
            );
        }
    }
}

impl std::fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationService")
            .field("provider", &self.provider.provider_id())
            .field("timeout", &self.timeout)
            .finish()
    }
}
