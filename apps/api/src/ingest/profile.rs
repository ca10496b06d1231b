//! Profile Extraction Service: resume transcript → `CandidateProfile` via the model.

use thiserror::Error;
use tracing::error;

use crate::ingest::prompts::{PROFILE_EXTRACT_PROMPT, PROFILE_EXTRACT_SYSTEM};
use crate::llm_client::{strip_code_fences, LlmError, TextModel};
use crate::models::candidate::CandidateProfile;
use crate::models::schema::{extraction_field_list, extraction_json_skeleton, validate_profile};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("model call failed: {0}")]
    ModelCall(#[from] LlmError),

    #[error("model response is not a valid profile: {reason}")]
    Parse { reason: String, raw_response: String },
}

/// Builds the extraction prompt. Same transcript in, same prompt out.
pub fn build_extraction_prompt(resume_text: &str) -> String {
    PROFILE_EXTRACT_PROMPT
        .replace("{fields}", &extraction_field_list())
        .replace("{schema}", &extraction_json_skeleton())
        .replace("{resume_text}", resume_text)
}

/// Parses a raw model response. An optional code fence around the whole
/// response is removed first; anything else that is not exactly one JSON
/// object matching the candidate schema is rejected.
pub fn parse_profile_response(raw: &str) -> Result<CandidateProfile, ProfileError> {
    let parse_error = |reason: String| ProfileError::Parse {
        reason,
        raw_response: raw.to_string(),
    };

    let body = strip_code_fences(raw);
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| parse_error(e.to_string()))?;
    validate_profile(&value).map_err(|e| parse_error(e.to_string()))
}

/// Prompts the model with the transcript and parses its answer. Single attempt.
pub async fn extract_profile(
    model: &dyn TextModel,
    resume_text: &str,
) -> Result<CandidateProfile, ProfileError> {
    let prompt = build_extraction_prompt(resume_text);
    let raw = model.complete(&prompt, PROFILE_EXTRACT_SYSTEM).await?;

    parse_profile_response(&raw).inspect_err(|e| {
        if let ProfileError::Parse { reason, raw_response } = e {
            error!(%reason, raw_response = %raw_response, "Failed to parse model profile response");
        }
    })
}
