//! Database access for folio-ar
//!
//! The entries/media tables are shared with the CRUD layer (created by
//! `folio_common::db`); the archival job table belongs to this daemon.

pub mod entries;
pub mod jobs;
pub mod media;

use chrono::{DateTime, Utc};
use folio_common::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the shared folio.db and creates this daemon's tables.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let pool = folio_common::db::init_database_pool(db_path).await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create folio-ar specific tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS archive_jobs (
            id TEXT PRIMARY KEY,
            job_key TEXT NOT NULL,
            media_guid TEXT NOT NULL,
            operation TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            attempts INTEGER NOT NULL DEFAULT 0,
            intended_archive_date TEXT NOT NULL,
            last_error TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The job key is unique only among queued/running jobs: finished jobs
    // are kept for inspection and must not block a later re-archival of the
    // same item.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_archive_jobs_inflight
        ON archive_jobs(job_key) WHERE status IN ('PENDING', 'RUNNING')
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_archive_jobs_media ON archive_jobs(media_guid)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (archive_jobs)");

    Ok(())
}

/// Parse an RFC 3339 column value.
pub(crate) fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Malformed timestamp '{}': {}", value, e)))
}

/// Parse an optional RFC 3339 column value.
pub(crate) fn parse_datetime_opt(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_datetime).transpose()
}
