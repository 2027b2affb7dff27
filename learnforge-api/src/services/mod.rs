//! Services Module
//!
//! Business logic behind the HTTP handlers.

pub mod generation;
pub mod report;

pub use generation::GenerationService;
pub use report::{summary_cache_key, DailySummary, ReportService, TopicCount};
