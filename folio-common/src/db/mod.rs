//! Shared database access for Folio services

pub mod models;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the shared folio.db and creates the core tables if missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the shared entries/media tables if they don't exist
///
/// The CRUD layer owns most columns; the archival daemon writes back only
/// `archive_id`, `archive_uri`, `archive_date` and `archive_status`.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            guid TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            subtitle TEXT,
            type_source TEXT,
            type_label TEXT,
            data TEXT NOT NULL DEFAULT '{}',
            texts TEXT NOT NULL DEFAULT '[]',
            keywords TEXT NOT NULL DEFAULT '[]',
            published INTEGER NOT NULL DEFAULT 0,
            archive_id TEXT,
            archive_uri TEXT,
            archive_date TEXT,
            date_created TEXT NOT NULL,
            date_changed TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media (
            guid TEXT PRIMARY KEY,
            entry_guid TEXT NOT NULL REFERENCES entries(guid),
            file_path TEXT NOT NULL,
            original_filename TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            license_source TEXT,
            license_label TEXT,
            archive_id TEXT,
            archive_uri TEXT,
            archive_date TEXT,
            archive_status TEXT NOT NULL DEFAULT 'NOT_ARCHIVED',
            date_changed TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_media_entry ON media(entry_guid)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (entries, media)");

    Ok(())
}
