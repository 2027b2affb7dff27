//! Health Check Endpoints
//!
//! - /healthz - Liveness
//! - /readyz - Readiness

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub version: String,
}

fn health(state: &AppState, status: &str) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        time: Utc::now(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state, "ok"))
}

pub async fn readyz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state, "ready"))
}
