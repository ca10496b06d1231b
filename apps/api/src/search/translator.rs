//! Query Translator: free-text search → SQL text via the model.
//!
//! Pure text-to-text. The output is NOT validated here; see `search::guard`.

use thiserror::Error;
use tracing::debug;

use crate::llm_client::{strip_code_fences, LlmError, TextModel};
use crate::models::schema::{columns_of, table_description, FieldKind};
use crate::search::prompts::{QUERY_TRANSLATE_PROMPT, SQL_ONLY_SYSTEM};

#[derive(Debug, Error)]
#[error("query translation failed: {0}")]
pub struct TranslationError(#[from] pub LlmError);

pub fn build_translation_prompt(query: &str) -> String {
    QUERY_TRANSLATE_PROMPT
        .replace("{table}", &table_description())
        .replace("{text_columns}", &column_list(FieldKind::Text))
        .replace("{list_columns}", &column_list(FieldKind::TextList))
        .replace("{number_columns}", &column_list(FieldKind::Number))
        .replace("{query}", query.trim())
}

fn column_list(kind: FieldKind) -> String {
    columns_of(kind).collect::<Vec<_>>().join(", ")
}

pub async fn translate(model: &dyn TextModel, query: &str) -> Result<String, TranslationError> {
    let prompt = build_translation_prompt(query);
    let raw = model.complete(&prompt, SQL_ONLY_SYSTEM).await?;
    let statement = strip_code_fences(&raw).to_string();
    debug!(query, statement = %statement, "Translated search query");
    Ok(statement)
}
