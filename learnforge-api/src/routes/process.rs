//! Generation REST Routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use learnforge_core::{ErrorKind, GenerationRequest, GenerationResult};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /v1/process
pub async fn process_text(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> ApiResult<Json<GenerationResult>> {
    let Json(request) = payload.map_err(|e| {
        ApiError::invalid_argument(format!("invalid request body: {}", e.body_text()))
    })?;

    match state.generation.process(request).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            if !matches!(err.kind(), ErrorKind::InvalidArgument | ErrorKind::NotFound) {
                state.reporter.report(&err, "POST /v1/process");
            }
            Err(err.into())
        }
    }
}

/// GET /v1/results/:id
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<GenerationResult>> {
    if id.trim().is_empty() {
        return Err(ApiError::invalid_argument("id is required"));
    }
    Ok(Json(state.generation.get_result(&id).await?))
}
