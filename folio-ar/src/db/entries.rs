//! Entry database operations
//!
//! The CRUD layer owns entry mutation; the archival daemon reads entries
//! and writes back only the archival triad.

use chrono::{DateTime, Utc};
use folio_common::{Concept, Entry, Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_datetime, parse_datetime_opt};

/// Load an entry by guid
pub async fn load_entry(pool: &SqlitePool, guid: Uuid) -> Result<Option<Entry>> {
    let row = sqlx::query(
        r#"
        SELECT guid, owner_id, title, subtitle, type_source, type_label,
               data, texts, keywords, published,
               archive_id, archive_uri, archive_date, date_created, date_changed
        FROM entries
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(entry_from_row).transpose()
}

fn entry_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Entry> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Malformed entry guid '{}': {}", guid_str, e)))?;

    let type_label: Option<String> = row.get("type_label");
    let entry_type = type_label.map(|label| Concept {
        source: row.get("type_source"),
        label,
    });

    let data_str: String = row.get("data");
    let data = serde_json::from_str(&data_str)
        .map_err(|e| Error::Internal(format!("Malformed entry data: {}", e)))?;

    let texts_str: String = row.get("texts");
    let texts = serde_json::from_str(&texts_str)
        .map_err(|e| Error::Internal(format!("Malformed entry texts: {}", e)))?;

    let keywords_str: String = row.get("keywords");
    let keywords = serde_json::from_str(&keywords_str)
        .map_err(|e| Error::Internal(format!("Malformed entry keywords: {}", e)))?;

    let date_created: String = row.get("date_created");
    let date_changed: String = row.get("date_changed");

    Ok(Entry {
        guid,
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        subtitle: row.get("subtitle"),
        entry_type,
        data,
        texts,
        keywords,
        published: row.get::<i64, _>("published") != 0,
        archive_id: row.get("archive_id"),
        archive_uri: row.get("archive_uri"),
        archive_date: parse_datetime_opt(row.get("archive_date"))?,
        date_created: parse_datetime(&date_created)?,
        date_changed: parse_datetime(&date_changed)?,
    })
}

/// Write back the archival triad after a successful container push/update.
pub async fn record_container_archived(
    pool: &SqlitePool,
    guid: Uuid,
    archive_id: &str,
    archive_uri: &str,
    archive_date: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE entries
        SET archive_id = ?, archive_uri = ?, archive_date = ?
        WHERE guid = ?
        "#,
    )
    .bind(archive_id)
    .bind(archive_uri)
    .bind(archive_date.to_rfc3339())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert or replace a full entry row.
///
/// Entry mutation belongs to the CRUD collaborator; this exists for
/// fixtures and integration tests.
pub async fn save_entry(pool: &SqlitePool, entry: &Entry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO entries
            (guid, owner_id, title, subtitle, type_source, type_label,
             data, texts, keywords, published,
             archive_id, archive_uri, archive_date, date_created, date_changed)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.guid.to_string())
    .bind(&entry.owner_id)
    .bind(&entry.title)
    .bind(&entry.subtitle)
    .bind(entry.entry_type.as_ref().and_then(|t| t.source.clone()))
    .bind(entry.entry_type.as_ref().map(|t| t.label.clone()))
    .bind(entry.data.to_string())
    .bind(serde_json::to_string(&entry.texts).map_err(|e| Error::Internal(e.to_string()))?)
    .bind(serde_json::to_string(&entry.keywords).map_err(|e| Error::Internal(e.to_string()))?)
    .bind(entry.published as i64)
    .bind(&entry.archive_id)
    .bind(&entry.archive_uri)
    .bind(entry.archive_date.map(|d| d.to_rfc3339()))
    .bind(entry.date_created.to_rfc3339())
    .bind(entry.date_changed.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
