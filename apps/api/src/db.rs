use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Schema statements, applied in order on every start. All are idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS candidates (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        name             TEXT NOT NULL DEFAULT '',
        email            TEXT NOT NULL DEFAULT '',
        phone            TEXT NOT NULL DEFAULT '',
        location         TEXT NOT NULL DEFAULT '',
        skills           TEXT NOT NULL DEFAULT '[]',
        experience_years REAL NOT NULL DEFAULT 0 CHECK (experience_years >= 0),
        education        TEXT NOT NULL DEFAULT '[]',
        resume_text      TEXT NOT NULL,
        resume_path      TEXT NOT NULL,
        created_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_candidates_created_at ON candidates (created_at DESC, id DESC)",
    // resume_text is write-once.
    r#"
    CREATE TRIGGER IF NOT EXISTS candidates_resume_text_immutable
    BEFORE UPDATE OF resume_text ON candidates
    BEGIN
        SELECT RAISE(ABORT, 'resume_text is immutable');
    END
    "#,
];

/// Creates and returns a SQLite connection pool, creating the database file if needed.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Connecting to SQLite at {database_url}...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Applies the candidates schema.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Candidate schema ready");
    Ok(())
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    migrate(&pool).await.expect("apply schema");
    pool
}
