//! Axum route handler for natural-language search.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::candidate::Candidate;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// POST /api/v1/search
///
/// An empty array means "no matches"; a failed search is always an error body.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    let candidates = state.searcher.search(&request.query).await?;
    Ok(Json(candidates))
}
