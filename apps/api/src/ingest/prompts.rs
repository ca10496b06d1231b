// Profile extraction prompt templates.

pub const PROFILE_EXTRACT_SYSTEM: &str = "\
You are a precise resume parser. \
Extract candidate details from resume text into a single JSON object. \
You MUST respond with valid JSON only. No markdown fences, no explanations. \
Never invent details that are not present in the resume.";

pub const PROFILE_EXTRACT_PROMPT: &str = r#"Extract the following fields from the resume text below.

FIELDS:
{fields}

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{schema}

RULES:
1. If a field is not present in the resume, use "" for strings, [] for arrays and 0 for numbers.
2. Keep skills and education in the order they appear in the resume. Do not merge or deduplicate.
3. experience_years is the total years of professional experience as a number, e.g. 3.5.
4. Return ONLY the JSON object and nothing else."#;
