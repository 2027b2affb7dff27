//! LearnForge API - Orchestration and Transport
//!
//! Hosts the generation and report services, their configuration and
//! telemetry, and a thin Axum transport over them.

pub mod config;
pub mod constants;
pub mod error;
pub mod reporter;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::{AppConfig, LogFormat, ProviderKind, StorageBackend};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use reporter::{ErrorReporter, TracingErrorReporter};
pub use routes::create_router;
pub use services::{DailySummary, GenerationService, ReportService, TopicCount};
pub use state::{build_provider, AppState};
pub use telemetry::{init_tracing, ServiceMetrics};
