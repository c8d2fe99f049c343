//! Media database operations
//!
//! Status transitions use single-statement conditional updates so that
//! concurrent enqueue attempts serialize on the database rather than on any
//! in-memory state.

use chrono::{DateTime, Utc};
use folio_common::{ArchiveStatus, Concept, Error, Media, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_datetime, parse_datetime_opt};

/// Load a media item by guid
pub async fn load_media(pool: &SqlitePool, guid: Uuid) -> Result<Option<Media>> {
    let row = sqlx::query(
        r#"
        SELECT guid, entry_guid, file_path, original_filename, mime_type,
               license_source, license_label,
               archive_id, archive_uri, archive_date, archive_status, date_changed
        FROM media
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(media_from_row).transpose()
}

/// Load all media attached to an entry
pub async fn load_media_for_entry(pool: &SqlitePool, entry_guid: Uuid) -> Result<Vec<Media>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, entry_guid, file_path, original_filename, mime_type,
               license_source, license_label,
               archive_id, archive_uri, archive_date, archive_status, date_changed
        FROM media
        WHERE entry_guid = ?
        ORDER BY guid
        "#,
    )
    .bind(entry_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(media_from_row).collect()
}

fn media_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Media> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Malformed media guid '{}': {}", guid_str, e)))?;

    let entry_guid_str: String = row.get("entry_guid");
    let entry_guid = Uuid::parse_str(&entry_guid_str)
        .map_err(|e| Error::Internal(format!("Malformed entry guid '{}': {}", entry_guid_str, e)))?;

    let license_label: Option<String> = row.get("license_label");
    let license = license_label.map(|label| Concept {
        source: row.get("license_source"),
        label,
    });

    let status_str: String = row.get("archive_status");
    let archive_status = ArchiveStatus::parse(&status_str)
        .ok_or_else(|| Error::Internal(format!("Unknown archive status '{}'", status_str)))?;

    let date_changed: String = row.get("date_changed");

    Ok(Media {
        guid,
        entry_guid,
        file_path: row.get("file_path"),
        original_filename: row.get("original_filename"),
        mime_type: row.get("mime_type"),
        license,
        archive_id: row.get("archive_id"),
        archive_uri: row.get("archive_uri"),
        archive_date: parse_datetime_opt(row.get("archive_date"))?,
        archive_status,
        date_changed: parse_datetime(&date_changed)?,
    })
}

/// Atomically move a media item from one of `from` to `to`.
///
/// Returns whether the transition happened; a `false` result means another
/// caller got there first (or the item was not in an eligible state), which
/// the dispatcher treats as a no-op.
pub async fn transition_status(
    pool: &SqlitePool,
    guid: Uuid,
    from: &[ArchiveStatus],
    to: ArchiveStatus,
) -> Result<bool> {
    // Bounded set of states, so the placeholder list is built inline.
    let placeholders = vec!["?"; from.len()].join(", ");
    let sql = format!(
        "UPDATE media SET archive_status = ? WHERE guid = ? AND archive_status IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql).bind(to.as_str()).bind(guid.to_string());
    for status in from {
        query = query.bind(status.as_str());
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected() == 1)
}

/// Set a media item's status unconditionally (worker-driven transitions).
pub async fn set_status(pool: &SqlitePool, guid: Uuid, status: ArchiveStatus) -> Result<()> {
    sqlx::query("UPDATE media SET archive_status = ? WHERE guid = ?")
        .bind(status.as_str())
        .bind(guid.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Write back the archival triad and mark the item archived.
pub async fn record_member_archived(
    pool: &SqlitePool,
    guid: Uuid,
    archive_id: &str,
    archive_uri: &str,
    archive_date: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE media
        SET archive_id = ?, archive_uri = ?, archive_date = ?, archive_status = ?
        WHERE guid = ?
        "#,
    )
    .bind(archive_id)
    .bind(archive_uri)
    .bind(archive_date.to_rfc3339())
    .bind(ArchiveStatus::Archived.as_str())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert or replace a full media row (fixtures and integration tests).
pub async fn save_media(pool: &SqlitePool, media: &Media) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO media
            (guid, entry_guid, file_path, original_filename, mime_type,
             license_source, license_label,
             archive_id, archive_uri, archive_date, archive_status, date_changed)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(media.guid.to_string())
    .bind(media.entry_guid.to_string())
    .bind(&media.file_path)
    .bind(&media.original_filename)
    .bind(&media.mime_type)
    .bind(media.license.as_ref().and_then(|l| l.source.clone()))
    .bind(media.license.as_ref().map(|l| l.label.clone()))
    .bind(&media.archive_id)
    .bind(&media.archive_uri)
    .bind(media.archive_date.map(|d| d.to_rfc3339()))
    .bind(media.archive_status.as_str())
    .bind(media.date_changed.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
