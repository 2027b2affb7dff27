//! Prometheus Metrics Definitions
//!
//! Metrics live in a registry owned by [`ServiceMetrics`], which is passed
//! to the components that record into it. Nothing is registered globally.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use learnforge_core::{ErrorKind, LearnforgeError, LearnforgeResult};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Provider latency buckets (seconds), topping out at the generation deadline.
const PROVIDER_LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 7.5, 10.0];

/// Outcome label for a successful generation.
pub const OUTCOME_SUCCESS: &str = "success";

/// Outcome label for a request answered from a stored result.
pub const OUTCOME_REPLAYED: &str = "replayed";

/// Container for all LearnForge service metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,

    /// Generation requests by outcome - labels: outcome
    pub generation_outcomes_total: IntCounterVec,

    /// Requests answered from a previously stored result
    pub idempotent_replays_total: IntCounter,

    /// Best-effort saves that failed
    pub persistence_failures_total: IntCounter,

    /// Wall-clock time spent in the generation provider
    pub provider_latency_seconds: Histogram,
}

fn register_failed(name: &str, e: prometheus::Error) -> LearnforgeError {
    LearnforgeError::internal(format!("Failed to register {}: {}", name, e))
}

impl ServiceMetrics {
    /// Create the metrics and register them in a fresh registry.
    pub fn new() -> LearnforgeResult<Self> {
        let registry = Registry::new();

        let generation_outcomes_total = IntCounterVec::new(
            Opts::new(
                "learnforge_generation_outcomes_total",
                "Generation requests by outcome",
            ),
            &["outcome"],
        )
        .map_err(|e| register_failed("generation_outcomes_total", e))?;

        let idempotent_replays_total = IntCounter::new(
            "learnforge_idempotent_replays_total",
            "Requests answered from a stored result",
        )
        .map_err(|e| register_failed("idempotent_replays_total", e))?;

        let persistence_failures_total = IntCounter::new(
            "learnforge_persistence_failures_total",
            "Best-effort result saves that failed",
        )
        .map_err(|e| register_failed("persistence_failures_total", e))?;

        let provider_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "learnforge_provider_latency_seconds",
                "Generation provider latency in seconds",
            )
            .buckets(PROVIDER_LATENCY_BUCKETS.to_vec()),
        )
        .map_err(|e| register_failed("provider_latency_seconds", e))?;

        registry
            .register(Box::new(generation_outcomes_total.clone()))
            .map_err(|e| register_failed("generation_outcomes_total", e))?;
        registry
            .register(Box::new(idempotent_replays_total.clone()))
            .map_err(|e| register_failed("idempotent_replays_total", e))?;
        registry
            .register(Box::new(persistence_failures_total.clone()))
            .map_err(|e| register_failed("persistence_failures_total", e))?;
        registry
            .register(Box::new(provider_latency_seconds.clone()))
            .map_err(|e| register_failed("provider_latency_seconds", e))?;

        Ok(Self {
            registry,
            generation_outcomes_total,
            idempotent_replays_total,
            persistence_failures_total,
            provider_latency_seconds,
        })
    }

    pub fn record_success(&self) {
        self.generation_outcomes_total
            .with_label_values(&[OUTCOME_SUCCESS])
            .inc();
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.generation_outcomes_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn record_replay(&self) {
        self.idempotent_replays_total.inc();
        self.generation_outcomes_total
            .with_label_values(&[OUTCOME_REPLAYED])
            .inc();
    }

    pub fn record_persistence_failure(&self) {
        self.persistence_failures_total.inc();
    }

    pub fn observe_provider_latency(&self, elapsed: Duration) {
        self.provider_latency_seconds.observe(elapsed.as_secs_f64());
    }

    /// Current count for one outcome label.
    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.generation_outcomes_total
            .with_label_values(&[outcome])
            .get()
    }

    /// Encode every registered metric in the text exposition format.
    pub fn render(&self) -> LearnforgeResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| LearnforgeError::internal(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| LearnforgeError::internal(format!("Metrics are not UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for ServiceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMetrics")
            .field("idempotent_replays", &self.idempotent_replays_total.get())
            .field("persistence_failures", &self.persistence_failures_total.get())
            .finish()
    }
}

/// Handler for GET /metrics.
pub async fn metrics_handler(State(metrics): State<Arc<ServiceMetrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}
