//! Candidate Store: durable persistence of candidates in SQLite.
//!
//! Every insert is a single `INSERT … RETURNING` statement, so a row is either
//! written whole or not at all, and SQLite's write lock serializes concurrent
//! inserts onto distinct `AUTOINCREMENT` ids.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::models::candidate::{encode_list, Candidate, CandidateRow, ListColumnError, NewCandidate};
use crate::search::guard::ValidatedSelect;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    CorruptRow(#[from] ListColumnError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: bool,
}

#[derive(Clone)]
pub struct CandidateStore {
    pool: SqlitePool,
}

impl CandidateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a candidate and returns it with its store-assigned id and created_at.
    pub async fn insert(&self, record: &NewCandidate) -> Result<Candidate, StoreError> {
        let profile = &record.profile;
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            INSERT INTO candidates
                (name, email, phone, location, skills, experience_years, education,
                 resume_text, resume_path)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.location)
        .bind(encode_list(&profile.skills))
        .bind(profile.experience_years)
        .bind(encode_list(&profile.education))
        .bind(&record.resume_text)
        .bind(&record.resume_path)
        .fetch_one(&self.pool)
        .await?;

        info!(candidate_id = row.id, "Inserted candidate");
        Ok(row.into_candidate()?)
    }

    /// All candidates, newest first; equal timestamps fall back to id descending.
    pub async fn list_all(&self) -> Result<Vec<Candidate>, StoreError> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.into_candidate().map_err(StoreError::from))
            .collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        let row = sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_candidate().map_err(StoreError::from))
            .transpose()
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM candidates")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Runs a caller-built query body and returns its rows in the query's own order.
    ///
    /// Only statements that passed `search::guard::validate` can reach this
    /// method. The read runs in a transaction that is always rolled back.
    pub async fn get_raw(&self, statement: &ValidatedSelect) -> Result<Vec<CandidateRow>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query_as::<_, CandidateRow>(statement.as_sql())
            .fetch_all(&mut *tx)
            .await;
        tx.rollback().await?;
        rows
    }

    /// Deletes by id. Deleting an absent id reports `deleted: false`.
    pub async fn delete_by_id(&self, id: i64) -> Result<DeleteOutcome, StoreError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(candidate_id = id, "Deleted candidate");
        }
        Ok(DeleteOutcome { deleted })
    }
}
