//! Axum route handlers for listing and deleting candidates.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::candidates::store::DeleteOutcome;
use crate::errors::AppError;
use crate::models::candidate::Candidate;
use crate::state::AppState;

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    Ok(Json(state.store.list_all().await?))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Candidate>, AppError> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

/// DELETE /api/v1/candidates/:id
///
/// Idempotent: deleting a missing candidate is `{"deleted": false}`, not an error.
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteOutcome>, AppError> {
    Ok(Json(state.store.delete_by_id(id).await?))
}
