//! LearnForge Test Utilities
//!
//! Shared test infrastructure for the LearnForge workspace:
//! - Scripted mock generation provider
//! - Result stores and caches that fail on demand
//! - Proptest generators for domain types
//! - Fixtures for common scenarios

pub use learnforge_core::{
    CacheError, DifficultyLevel, ErrorKind, Flashcard, GenerationRequest, GenerationResult,
    LearnforgeError, LearnforgeResult, OutputMode, ProviderError, ProviderRequest, QuizItem,
    ResultMeta, StorageError, StoredRecord, Timestamp, TopicSource,
};
pub use learnforge_llm::GenerationProvider;
pub use learnforge_storage::{CacheBackend, CacheStats, InMemoryResultStore, ResultStore};

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// MOCK GENERATION PROVIDER
// ============================================================================

/// Provider id reported by [`MockGenerationProvider`].
pub const MOCK_PROVIDER_ID: &str = "mock";

/// Generation provider with scripted outcomes.
///
/// Scripted outcomes are consumed in order; once the script is empty every
/// call returns the template result. Each call is counted and the last
/// request is kept for inspection.
#[derive(Debug)]
pub struct MockGenerationProvider {
    template: GenerationResult,
    script: Mutex<VecDeque<Result<GenerationResult, ProviderError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ProviderRequest>>,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self {
            template: fixtures::provider_result(),
            script: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Replace the result returned once the script is exhausted.
    pub fn with_result(mut self, result: GenerationResult) -> Self {
        self.template = result;
        self
    }

    /// Report this topic attribution from the provider side.
    pub fn with_topic(mut self, topic: impl Into<String>, source: TopicSource, confidence: f64) -> Self {
        self.template.topic = topic.into();
        self.template.topic_source = source;
        self.template.topic_confidence = confidence;
        self
    }

    /// Wait this long before answering. The wait is cut short at the
    /// caller's deadline, which then yields [`ProviderError::Timeout`].
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a failure for the next unscripted call.
    pub fn then_fail(self, error: ProviderError) -> Self {
        self.push(Err(error));
        self
    }

    /// Queue a success for the next unscripted call.
    pub fn then_succeed(self, result: GenerationResult) -> Self {
        self.push(Ok(result));
        self
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The request seen by the most recent call.
    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn push(&self, outcome: Result<GenerationResult, ProviderError>) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(outcome);
    }

    fn next_outcome(&self) -> Result<GenerationResult, ProviderError> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(self.template.clone()))
    }
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    fn provider_id(&self) -> &str {
        MOCK_PROVIDER_ID
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
        deadline: Instant,
    ) -> LearnforgeResult<GenerationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        if let Some(delay) = self.delay {
            if tokio::time::timeout_at(deadline, tokio::time::sleep(delay))
                .await
                .is_err()
            {
                return Err(LearnforgeError::upstream(MOCK_PROVIDER_ID, ProviderError::Timeout));
            }
        }

        let mut result = self
            .next_outcome()
            .map_err(|e| LearnforgeError::upstream(MOCK_PROVIDER_ID, e))?;
        result.id = String::new();
        result.meta.processing_ms = 0;
        result.created_at = Utc::now();
        Ok(result)
    }
}

// ============================================================================
// FAILING RESULT STORE
// ============================================================================

/// Result store that fails selected operations with a fixed error.
///
/// Operations that are not set to fail delegate to an in-memory store, so a
/// store that only fails saves still answers lookups with `NotFound`.
#[derive(Debug)]
pub struct FailingResultStore {
    inner: InMemoryResultStore,
    error: StorageError,
    fail_saves: bool,
    fail_reads: bool,
    save_attempts: AtomicUsize,
}

impl FailingResultStore {
    /// Every save fails; reads behave like an empty store.
    pub fn failing_saves() -> Self {
        Self::build(true, false)
    }

    /// Every read fails; saves succeed.
    pub fn failing_reads() -> Self {
        Self::build(false, true)
    }

    /// Every operation fails.
    pub fn failing_all() -> Self {
        Self::build(true, true)
    }

    /// Use `error` instead of the default connection failure.
    pub fn with_error(mut self, error: StorageError) -> Self {
        self.error = error;
        self
    }

    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }

    fn build(fail_saves: bool, fail_reads: bool) -> Self {
        Self {
            inner: InMemoryResultStore::new(),
            error: StorageError::ConnectionFailed {
                reason: "database unavailable".to_string(),
            },
            fail_saves,
            fail_reads,
            save_attempts: AtomicUsize::new(0),
        }
    }

    fn check_reads(&self) -> LearnforgeResult<()> {
        if self.fail_reads {
            return Err(self.error.clone().into());
        }
        Ok(())
    }
}

#[async_trait]
impl ResultStore for FailingResultStore {
    async fn save(&self, record: &StoredRecord) -> LearnforgeResult<()> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(self.error.clone().into());
        }
        self.inner.save(record).await
    }

    async fn get(&self, id: &str) -> LearnforgeResult<StoredRecord> {
        self.check_reads()?;
        self.inner.get(id).await
    }

    async fn get_by_topic(&self, topic: &str, limit: usize) -> LearnforgeResult<Vec<StoredRecord>> {
        self.check_reads()?;
        self.inner.get_by_topic(topic, limit).await
    }

    async fn get_by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> LearnforgeResult<Vec<StoredRecord>> {
        self.check_reads()?;
        self.inner.get_by_date_range(start, end).await
    }

    async fn close(&self) -> LearnforgeResult<()> {
        Ok(())
    }
}

// ============================================================================
// UNAVAILABLE CACHE
// ============================================================================

/// Cache whose every operation reports the backend as unavailable.
#[derive(Debug, Default)]
pub struct UnavailableCache {
    set_attempts: AtomicUsize,
}

impl UnavailableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attempts(&self) -> usize {
        self.set_attempts.load(Ordering::SeqCst)
    }

    fn unavailable() -> LearnforgeError {
        CacheError::Unavailable {
            reason: "cache offline".to_string(),
        }
        .into()
    }
}

#[async_trait]
impl CacheBackend for UnavailableCache {
    async fn get(&self, _key: &str) -> LearnforgeResult<String> {
        Err(Self::unavailable())
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> LearnforgeResult<()> {
        self.set_attempts.fetch_add(1, Ordering::SeqCst);
        Err(Self::unavailable())
    }

    async fn delete(&self, _key: &str) -> LearnforgeResult<()> {
        Err(Self::unavailable())
    }

    async fn exists(&self, _key: &str) -> LearnforgeResult<bool> {
        Err(Self::unavailable())
    }

    async fn stats(&self) -> LearnforgeResult<CacheStats> {
        Err(Self::unavailable())
    }

    async fn close(&self) -> LearnforgeResult<()> {
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for LearnForge domain types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    pub fn arb_output_mode() -> impl Strategy<Value = OutputMode> {
        prop_oneof![
            Just(OutputMode::Lesson),
            Just(OutputMode::Flashcards),
            Just(OutputMode::Quiz),
        ]
    }

    pub fn arb_difficulty_level() -> impl Strategy<Value = DifficultyLevel> {
        prop_oneof![
            Just(DifficultyLevel::Beginner),
            Just(DifficultyLevel::Intermediate),
            Just(DifficultyLevel::Advanced),
        ]
    }

    pub fn arb_topic_source() -> impl Strategy<Value = TopicSource> {
        prop_oneof![Just(TopicSource::User), Just(TopicSource::Inferred)]
    }

    /// Any confidence a provider might report, out-of-range and non-finite included.
    pub fn arb_raw_confidence() -> impl Strategy<Value = f64> {
        prop_oneof![
            4 => -10.0f64..10.0,
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
            1 => Just(f64::NEG_INFINITY),
        ]
    }

    /// Non-blank topic label.
    pub fn arb_topic() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{2,12}( [a-z]{2,10}){0,2}"
    }

    pub fn arb_idempotency_key() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,40}"
    }

    /// A request that passes validation.
    pub fn arb_valid_request() -> impl Strategy<Value = GenerationRequest> {
        (
            "[A-Za-z][A-Za-z ,.]{0,200}",
            proptest::option::of(arb_output_mode()),
            proptest::option::of(arb_topic()),
            proptest::option::of(arb_difficulty_level()),
            proptest::option::of(arb_idempotency_key()),
        )
            .prop_map(|(text, mode, topic, level, key)| GenerationRequest {
                text,
                mode: mode.map(|m| m.as_str().to_string()),
                topic,
                level: level.map(|l| l.as_str().to_string()),
                language: None,
                idempotency_key: key,
            })
    }

    /// A provider-shaped result with arbitrary attribution.
    pub fn arb_generation_result() -> impl Strategy<Value = GenerationResult> {
        (arb_topic(), arb_topic_source(), 0.0f64..=1.0, arb_timestamp()).prop_map(
            |(topic, topic_source, topic_confidence, created_at)| GenerationResult {
                topic,
                topic_source,
                topic_confidence,
                created_at,
                ..fixtures::provider_result()
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;
    use chrono::TimeZone;

    /// Text used across end-to-end scenarios.
    pub const PHOTOSYNTHESIS: &str = "Photosynthesis converts light into chemical energy.";

    pub fn sample_request() -> GenerationRequest {
        GenerationRequest::new(PHOTOSYNTHESIS)
    }

    pub fn flashcards_request() -> GenerationRequest {
        GenerationRequest::new(PHOTOSYNTHESIS).with_mode("flashcards")
    }

    /// What a provider returns before the service finalizes it.
    pub fn provider_result() -> GenerationResult {
        GenerationResult {
            id: String::new(),
            topic: "Photosynthesis".to_string(),
            topic_source: TopicSource::Inferred,
            topic_confidence: 0.85,
            summary: "Plants turn light into stored chemical energy.".to_string(),
            key_points: vec![
                "Chlorophyll absorbs light".to_string(),
                "Glucose stores the energy".to_string(),
            ],
            flashcards: vec![
                Flashcard {
                    question: "What pigment absorbs light?".to_string(),
                    answer: "Chlorophyll".to_string(),
                },
                Flashcard {
                    question: "What sugar is produced?".to_string(),
                    answer: "Glucose".to_string(),
                },
            ],
            quiz: vec![QuizItem {
                question: "Where does photosynthesis occur?".to_string(),
                choices: vec![
                    "Mitochondria".to_string(),
                    "Chloroplast".to_string(),
                    "Nucleus".to_string(),
                ],
                answer: "Chloroplast".to_string(),
            }],
            meta: ResultMeta {
                model: "mock-model".to_string(),
                provider: MOCK_PROVIDER_ID.to_string(),
                processing_ms: 0,
            },
            created_at: Utc::now(),
        }
    }

    /// A finalized result with the given id.
    pub fn sample_result(id: &str) -> GenerationResult {
        GenerationResult {
            id: id.to_string(),
            meta: ResultMeta {
                processing_ms: 12,
                ..provider_result().meta
            },
            ..provider_result()
        }
    }

    /// A stored record for `topic` created at `created_at`.
    pub fn sample_record(id: &str, topic: &str, created_at: Timestamp) -> StoredRecord {
        let result = GenerationResult {
            topic: topic.to_string(),
            created_at,
            ..sample_result(id)
        };
        StoredRecord {
            id: id.to_string(),
            request: serde_json::json!({ "text": PHOTOSYNTHESIS }),
            result: serde_json::to_value(&result).unwrap_or_default(),
            topic: result.topic,
            topic_source: result.topic_source,
            topic_confidence: result.topic_confidence,
            created_at,
        }
    }

    /// Noon UTC on the given day.
    pub fn noon(year: i32, month: u32, day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for LearnForge error kinds.

    use super::*;

    /// Assert that a result failed with the given kind.
    #[track_caller]
    pub fn assert_kind<T: std::fmt::Debug>(result: &LearnforgeResult<T>, kind: ErrorKind) {
        match result {
            Err(err) => assert_eq!(err.kind(), kind, "unexpected error: {:?}", err),
            Ok(value) => panic!("Expected {} error, got Ok: {:?}", kind, value),
        }
    }

    /// Assert that a confidence is a finite value in [0, 1].
    #[track_caller]
    pub fn assert_confidence_in_range(confidence: f64) {
        assert!(
            confidence.is_finite() && (0.0..=1.0).contains(&confidence),
            "confidence out of range: {}",
            confidence
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_request() -> ProviderRequest {
        ProviderRequest {
            text: fixtures::PHOTOSYNTHESIS.to_string(),
            mode: OutputMode::Lesson,
            topic: None,
            level: Some(DifficultyLevel::Beginner),
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_provider_follows_script_then_template() {
        let provider = MockGenerationProvider::new()
            .then_fail(ProviderError::Timeout)
            .with_topic("Botany", TopicSource::Inferred, 0.4);
        let deadline = Instant::now() + Duration::from_secs(10);

        let first = provider.generate(&provider_request(), deadline).await;
        assertions::assert_kind(&first, ErrorKind::UpstreamTimeout);

        let second = provider.generate(&provider_request(), deadline).await.unwrap();
        assert_eq!(second.topic, "Botany");
        assert!(second.id.is_empty());
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.last_request(), Some(provider_request()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_provider_delay_respects_deadline() {
        let provider = MockGenerationProvider::new().with_delay(Duration::from_secs(30));
        let deadline = Instant::now() + Duration::from_secs(1);

        let result = provider.generate(&provider_request(), deadline).await;
        assertions::assert_kind(&result, ErrorKind::UpstreamTimeout);
    }

    #[tokio::test]
    async fn test_failing_saves_store_still_answers_not_found() {
        let store = FailingResultStore::failing_saves();
        let record = fixtures::sample_record("r1", "Biology", fixtures::noon(2025, 1, 2));

        assert!(store.save(&record).await.is_err());
        assertions::assert_kind(&store.get("r1").await, ErrorKind::NotFound);
        assert_eq!(store.save_attempts(), 1);
    }

    #[tokio::test]
    async fn test_failing_reads_store_reports_internal() {
        let store = FailingResultStore::failing_reads();
        assertions::assert_kind(&store.get("r1").await, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_unavailable_cache_counts_writes() {
        let cache = UnavailableCache::new();
        assert!(cache.set("k", "v".to_string(), None).await.is_err());
        assertions::assert_kind(&cache.get("k").await, ErrorKind::Internal);
        assert_eq!(cache.set_attempts(), 1);
    }

    #[test]
    fn test_sample_record_decodes() {
        let record = fixtures::sample_record("r1", "Biology", fixtures::noon(2025, 1, 2));
        let decoded = record.decode_result().unwrap();
        assert_eq!(decoded.id, "r1");
        assert_eq!(decoded.topic, "Biology");
    }
}
