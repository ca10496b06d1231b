//! Axum route handlers for resume uploads.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::ingest::pipeline::{BatchReport, Upload};
use crate::models::candidate::Candidate;
use crate::state::AppState;

/// Multipart field carrying a single resume.
const RESUME_FIELD: &str = "resume";

/// POST /api/v1/candidates/upload
///
/// Accepts one file in the `resume` field and returns the created candidate.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Candidate>, AppError> {
    let upload = read_uploads(multipart)
        .await?
        .into_iter()
        .find(|(field, _)| field == RESUME_FIELD)
        .map(|(_, upload)| upload)
        .ok_or_else(|| AppError::Validation("No file uploaded in field 'resume'".to_string()))?;

    let candidate = state.ingestor.submit_document(upload).await?;
    Ok(Json(candidate))
}

/// POST /api/v1/candidates/batch
///
/// Every file field is processed independently. Always 200 with a per-file report.
pub async fn handle_batch_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchReport>, AppError> {
    let uploads: Vec<Upload> = read_uploads(multipart)
        .await?
        .into_iter()
        .map(|(_, upload)| upload)
        .collect();

    if uploads.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }

    Ok(Json(state.ingestor.submit_batch(uploads).await))
}

/// Collects all file fields as `(field name, upload)` pairs. Non-file fields are skipped.
async fn read_uploads(mut multipart: Multipart) -> Result<Vec<(String, Upload)>, AppError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let field_name = field.name().unwrap_or_default().to_owned();
        let media_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read file '{file_name}': {e}")))?;

        uploads.push((
            field_name,
            Upload {
                file_name,
                media_type,
                bytes,
            },
        ));
    }

    Ok(uploads)
}
