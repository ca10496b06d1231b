use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Profile fields extracted from a resume by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub skills: Vec<String>,
    pub experience_years: f64,
    pub education: Vec<String>,
}

impl CandidateProfile {
    pub(crate) fn set_text(&mut self, field: &str, value: String) {
        match field {
            "name" => self.name = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            "location" => self.location = value,
            _ => {}
        }
    }

    pub(crate) fn set_list(&mut self, field: &str, value: Vec<String>) {
        match field {
            "skills" => self.skills = value,
            "education" => self.education = value,
            _ => {}
        }
    }

    pub(crate) fn set_number(&mut self, field: &str, value: f64) {
        if field == "experience_years" {
            self.experience_years = value;
        }
    }
}

/// Everything needed to insert a candidate; id and created_at are store-assigned.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub profile: CandidateProfile,
    pub resume_text: String,
    pub resume_path: String,
}

/// A stored candidate, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub skills: Vec<String>,
    pub experience_years: f64,
    pub education: Vec<String>,
    pub resume_text: String,
    pub resume_path: String,
    pub created_at: DateTime<Utc>,
}

/// Raw `candidates` row. List columns hold JSON-encoded arrays.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub skills: String,
    pub experience_years: f64,
    pub education: String,
    pub resume_text: String,
    pub resume_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[error("candidate {id}: column `{column}` is not a JSON string array: {source}")]
pub struct ListColumnError {
    pub id: i64,
    pub column: &'static str,
    #[source]
    pub source: serde_json::Error,
}

impl CandidateRow {
    pub fn into_candidate(self) -> Result<Candidate, ListColumnError> {
        let skills = decode_list(self.id, "skills", &self.skills)?;
        let education = decode_list(self.id, "education", &self.education)?;
        Ok(Candidate {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            location: self.location,
            skills,
            experience_years: self.experience_years,
            education,
            resume_text: self.resume_text,
            resume_path: self.resume_path,
            created_at: self.created_at,
        })
    }
}

/// Serializes an ordered string list for a list column.
pub fn encode_list(items: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn decode_list(id: i64, column: &'static str, raw: &str) -> Result<Vec<String>, ListColumnError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|source| ListColumnError { id, column, source })
}
