use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::candidates::store::StoreError;
use crate::ingest::pipeline::IngestError;
use crate::search::executor::{ExecutionError, SearchError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Ingest(e) => {
                let status = match e {
                    IngestError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    IngestError::CorruptDocument(_) | IngestError::ExtractionParse { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    IngestError::ModelCall(_) => StatusCode::BAD_GATEWAY,
                    IngestError::Store(_) | IngestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = match e {
                    IngestError::Store(_) => "A database error occurred".to_string(),
                    IngestError::Storage(_) => "A storage error occurred".to_string(),
                    other => other.to_string(),
                };
                (status, e.code(), message)
            }
            AppError::Search(SearchError::EmptyQuery) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Query is required".to_string(),
            ),
            AppError::Search(SearchError::Translation(e)) => {
                (StatusCode::BAD_GATEWAY, "TRANSLATION_ERROR", e.to_string())
            }
            AppError::Search(SearchError::Execution(e)) => {
                let status = match e {
                    ExecutionError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, "EXECUTION_ERROR", e.to_string())
            }
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "A database error occurred".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!("{code}: {self}");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
