//! Search Executor: validates a translated statement, runs it, shapes rows.
//!
//! `Searcher` composes the translator and the executor into the `search`
//! boundary operation.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::candidates::store::CandidateStore;
use crate::llm_client::TextModel;
use crate::models::candidate::{Candidate, ListColumnError};
use crate::search::guard::{validate, Rejection};
use crate::search::translator::{translate, TranslationError};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("statement rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("statement failed to execute: {0}")]
    Execution(#[from] sqlx::Error),

    #[error(transparent)]
    RowShape(#[from] ListColumnError),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Validates and runs `statement`, returning candidates in the statement's own order.
/// Nothing is executed unless validation passes.
pub async fn execute(store: &CandidateStore, statement: &str) -> Result<Vec<Candidate>, ExecutionError> {
    let validated = validate(statement).inspect_err(|reason| {
        warn!(statement, %reason, "Rejected translated statement");
    })?;

    let rows = store.get_raw(&validated).await.inspect_err(|e| {
        warn!(statement = validated.as_sql(), "Translated statement failed: {e}");
    })?;

    let candidates = rows
        .into_iter()
        .map(|row| row.into_candidate())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(candidates)
}

#[derive(Clone)]
pub struct Searcher {
    store: CandidateStore,
    model: Arc<dyn TextModel>,
}

impl Searcher {
    pub fn new(store: CandidateStore, model: Arc<dyn TextModel>) -> Self {
        Self { store, model }
    }

    /// Free text → translated statement → validated execution. No retries, no fallback.
    pub async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let statement = translate(self.model.as_ref(), query).await?;
        let candidates = execute(&self.store, &statement).await?;
        info!(query, matches = candidates.len(), "Search completed");
        Ok(candidates)
    }
}
