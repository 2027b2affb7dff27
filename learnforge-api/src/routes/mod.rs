//! REST API Routes
//!
//! Thin handlers over the services in [`crate::services`].

pub mod health;
pub mod process;
pub mod report;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::telemetry::metrics_handler;

/// Build the complete router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/process", post(process::process_text))
        .route("/v1/process/:id", get(process::get_result))
        .route("/v1/results/:id", get(process::get_result))
        .route("/v1/reports/daily", get(report::daily_summary))
        .route("/v1/reports/topics/:topic", get(report::recent_by_topic))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
