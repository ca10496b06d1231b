//! Candidate schema descriptor.
//!
//! The profile fields a model is asked to extract are declared once in
//! `CANDIDATE_FIELDS`. The extraction prompt, the SQL table description handed
//! to the query translator, and the validator for extraction responses are all
//! generated from it, so the three cannot drift apart.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::candidate::CandidateProfile;

/// Shape of a single profile field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text. Absent → empty string.
    Text,
    /// Ordered list of strings, stored as a JSON array in a TEXT column. Absent → `[]`.
    TextList,
    /// Non-negative real number. Absent → `0`.
    Number,
}

impl FieldKind {
    fn prompt_type(self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::TextList => "array of strings",
            FieldKind::Number => "number",
        }
    }

    fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
            FieldKind::TextList => "TEXT -- JSON array of strings, e.g. '[\"Python\",\"SQL\"]'",
            FieldKind::Number => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

pub const CANDIDATE_TABLE: &str = "candidates";

/// Model-extracted profile fields, in prompt order.
pub const CANDIDATE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        kind: FieldKind::Text,
        description: "full name of the candidate",
    },
    FieldSpec {
        name: "email",
        kind: FieldKind::Text,
        description: "primary email address",
    },
    FieldSpec {
        name: "phone",
        kind: FieldKind::Text,
        description: "primary phone number",
    },
    FieldSpec {
        name: "location",
        kind: FieldKind::Text,
        description: "city and region the candidate is based in",
    },
    FieldSpec {
        name: "skills",
        kind: FieldKind::TextList,
        description: "skills in the order they appear in the resume",
    },
    FieldSpec {
        name: "experience_years",
        kind: FieldKind::Number,
        description: "total years of professional experience",
    },
    FieldSpec {
        name: "education",
        kind: FieldKind::TextList,
        description: "degrees and qualifications, e.g. [\"B.Tech in CS\", \"MBA\"]",
    },
];

/// Store-owned columns that are never extracted by the model.
const SYSTEM_COLUMNS: &[(&str, &str)] = &[
    ("resume_text", "TEXT -- full resume transcript"),
    ("resume_path", "TEXT"),
    ("created_at", "TEXT -- ISO-8601 UTC timestamp"),
];

/// Bullet list of fields for the extraction prompt.
pub fn extraction_field_list() -> String {
    CANDIDATE_FIELDS
        .iter()
        .map(|f| format!("- {} ({}): {}", f.name, f.kind.prompt_type(), f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The exact JSON skeleton the extraction model must return.
pub fn extraction_json_skeleton() -> String {
    let body = CANDIDATE_FIELDS
        .iter()
        .map(|f| {
            let example = match f.kind {
                FieldKind::Text => "\"\"",
                FieldKind::TextList => "[]",
                FieldKind::Number => "0",
            };
            format!("  \"{}\": {}", f.name, example)
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{{\n{body}\n}}")
}

/// `CREATE TABLE`-style description of the candidates relation for the translator prompt.
pub fn table_description() -> String {
    let mut columns = vec!["  id INTEGER PRIMARY KEY".to_string()];
    columns.extend(
        CANDIDATE_FIELDS
            .iter()
            .map(|f| format!("  {} {}", f.name, f.kind.sql_type())),
    );
    columns.extend(
        SYSTEM_COLUMNS
            .iter()
            .map(|(name, ty)| format!("  {name} {ty}")),
    );
    format!("{CANDIDATE_TABLE} (\n{}\n)", columns.join(",\n"))
}

/// Profile column names of one kind, in declaration order.
pub fn columns_of(kind: FieldKind) -> impl Iterator<Item = &'static str> {
    CANDIDATE_FIELDS
        .iter()
        .filter(move |f| f.kind == kind)
        .map(|f| f.name)
}

// ────────────────────────────────────────────────────────────────────────────
// Response validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("field `{field}` must be {expected}, found {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field `{field}` must be a finite non-negative number")]
    OutOfRange { field: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    TextList(Vec<String>),
    Number(f64),
}

/// Validates a decoded model response against `CANDIDATE_FIELDS`.
///
/// Absent or `null` fields take their kind's default. Unknown keys are ignored.
/// Text fields accept JSON numbers verbatim (phone numbers are often emitted
/// unquoted) and `experience_years` accepts numeric strings. Anything else of
/// the wrong shape is a violation.
pub fn validate_profile(value: &Value) -> Result<CandidateProfile, SchemaViolation> {
    let object = value
        .as_object()
        .ok_or_else(|| SchemaViolation::NotAnObject(json_type(value)))?;

    let mut profile = CandidateProfile::default();
    for field in CANDIDATE_FIELDS {
        match read_field(object, field)? {
            FieldValue::Text(s) => profile.set_text(field.name, s),
            FieldValue::TextList(items) => profile.set_list(field.name, items),
            FieldValue::Number(n) => profile.set_number(field.name, n),
        }
    }
    Ok(profile)
}

fn read_field(object: &Map<String, Value>, field: &FieldSpec) -> Result<FieldValue, SchemaViolation> {
    let value = match object.get(field.name) {
        None | Some(Value::Null) => return Ok(default_for(field.kind)),
        Some(v) => v,
    };

    let wrong_type = || SchemaViolation::WrongType {
        field: field.name,
        expected: field.kind.prompt_type(),
        found: json_type(value),
    };

    match field.kind {
        FieldKind::Text => match value {
            Value::String(s) => Ok(FieldValue::Text(s.trim().to_string())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            _ => Err(wrong_type()),
        },
        FieldKind::TextList => {
            let items = value.as_array().ok_or_else(wrong_type)?;
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong_type))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::TextList)
        }
        FieldKind::Number => {
            let n = match value {
                Value::Number(n) => n.as_f64().ok_or_else(wrong_type)?,
                Value::String(s) => s.trim().parse::<f64>().map_err(|_| wrong_type())?,
                _ => return Err(wrong_type()),
            };
            if !n.is_finite() || n < 0.0 {
                return Err(SchemaViolation::OutOfRange { field: field.name });
            }
            Ok(FieldValue::Number(n))
        }
    }
}

fn default_for(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Text => FieldValue::Text(String::new()),
        FieldKind::TextList => FieldValue::TextList(Vec::new()),
        FieldKind::Number => FieldValue::Number(0.0),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
