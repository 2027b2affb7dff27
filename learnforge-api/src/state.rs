//! Shared application state for Axum routers.

use axum::extract::FromRef;
use learnforge_core::{ConfigError, LearnforgeResult, ProviderError};
use learnforge_llm::{ContentGenerator, GeminiClient, GenerationProvider, OpenAIClient};
use learnforge_storage::{
    CacheBackend, InMemoryCache, InMemoryResultStore, PostgresResultStore, ResultStore,
};
use std::sync::Arc;

use crate::config::{AiConfig, AppConfig, ProviderKind, StorageBackend};
use crate::reporter::{ErrorReporter, TracingErrorReporter};
use crate::services::{GenerationService, ReportService};
use crate::telemetry::ServiceMetrics;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<GenerationService>,
    pub reports: Arc<ReportService>,
    pub metrics: Arc<ServiceMetrics>,
    pub reporter: Arc<dyn ErrorReporter>,
    pub store: Arc<dyn ResultStore>,
    pub cache: Arc<dyn CacheBackend>,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Wire services over already-built collaborators.
    pub fn new(
        store: Arc<dyn ResultStore>,
        cache: Arc<dyn CacheBackend>,
        provider: Arc<dyn GenerationProvider>,
        metrics: Arc<ServiceMetrics>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let generation = Arc::new(GenerationService::new(
            store.clone(),
            provider,
            metrics.clone(),
        ));
        let reports = Arc::new(ReportService::new(
            store.clone(),
            cache.clone(),
            reporter.clone(),
        ));
        Self {
            generation,
            reports,
            metrics,
            reporter,
            store,
            cache,
            start_time: std::time::Instant::now(),
        }
    }

    /// Build the configured store, cache and provider.
    ///
    /// Connecting to PostgreSQL also applies pending migrations.
    pub async fn from_config(config: &AppConfig) -> LearnforgeResult<Self> {
        let store: Arc<dyn ResultStore> = match config.storage {
            StorageBackend::Memory => Arc::new(InMemoryResultStore::new()),
            StorageBackend::Postgres => {
                Arc::new(PostgresResultStore::connect(&config.db_config()).await?)
            }
        };
        let cache: Arc<dyn CacheBackend> =
            Arc::new(InMemoryCache::new(config.cache_sweep_interval()));
        let provider = build_provider(&config.ai)?;
        let metrics = Arc::new(ServiceMetrics::new()?);

        tracing::info!(
            storage = ?config.storage,
            provider = provider.provider_id(),
            model = config.ai.model(),
            "Application state initialized"
        );

        Ok(Self::new(
            store,
            cache,
            provider,
            metrics,
            Arc::new(TracingErrorReporter),
        ))
    }

    /// Stop the cache sweeper and release store connections.
    pub async fn shutdown(&self) {
        if let Err(e) = self.cache.close().await {
            tracing::warn!(error = %e, "Failed to close cache");
        }
        if let Err(e) = self.store.close().await {
            tracing::warn!(error = %e, "Failed to close result store");
        }
        tracing::info!("Application state shut down");
    }
}

impl FromRef<AppState> for Arc<ServiceMetrics> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// Build the generation provider selected by `ai`.
pub fn build_provider(ai: &AiConfig) -> LearnforgeResult<Arc<dyn GenerationProvider>> {
    let invalid = |e: ProviderError| ConfigError::InvalidValue {
        field: "ai".to_string(),
        value: ai.base_url().to_string(),
        reason: e.to_string(),
    };

    let provider: Arc<dyn GenerationProvider> = match ai.provider {
        ProviderKind::OpenAI => {
            let client = OpenAIClient::new(ai.base_url(), ai.api_key.clone(), ai.model(), ai.timeout())
                .map_err(invalid)?;
            Arc::new(ContentGenerator::new(client))
        }
        ProviderKind::Gemini => {
            let client = GeminiClient::new(ai.base_url(), ai.api_key.clone(), ai.model(), ai.timeout())
                .map_err(invalid)?;
            Arc::new(ContentGenerator::new(client))
        }
    };
    Ok(provider)
}
