use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and the current candidate count.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let database = match state.store.count().await {
        Ok(candidates) => json!({ "status": "ok", "candidates": candidates }),
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {e}");
            json!({ "status": "unavailable" })
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "database": database
    }))
}
