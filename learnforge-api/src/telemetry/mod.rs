//! LearnForge Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus metrics held in an
//! injected registry.

pub mod metrics;
pub mod tracer;

pub use metrics::{metrics_handler, ServiceMetrics};
pub use tracer::init_tracing;
