//! Archival job persistence
//!
//! One row per archival attempt of one media item. The job key is derived
//! from the media identity and unique among queued/running rows, which
//! guarantees at most one in-flight job per item. Finished jobs are kept
//! for inspection and pruned after the configured retention window.

use chrono::{DateTime, Duration, Utc};
use folio_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_datetime;

/// What the job does when it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOperation {
    /// First archival: create member, link into container.
    Create,
    /// Re-archival of an already archived member.
    Update,
}

impl JobOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOperation::Create => "CREATE",
            JobOperation::Update => "UPDATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(JobOperation::Create),
            "UPDATE" => Some(JobOperation::Update),
            _ => None,
        }
    }
}

/// Job lifecycle in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Done => "DONE",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(JobStatus::Pending),
            "RUNNING" => Some(JobStatus::Running),
            "DONE" => Some(JobStatus::Done),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// One persisted archival job
#[derive(Debug, Clone)]
pub struct ArchivalJob {
    pub id: Uuid,
    pub job_key: String,
    pub media_guid: Uuid,
    pub operation: JobOperation,
    pub status: JobStatus,
    pub attempts: i64,
    /// The archive date this job will record on success; the reconciler
    /// compares against it while the job is still in flight.
    pub intended_archive_date: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArchivalJob {
    pub fn new(media_guid: Uuid, operation: JobOperation) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_key: job_key_for(media_guid),
            media_guid,
            operation,
            status: JobStatus::Pending,
            attempts: 0,
            intended_archive_date: now,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Stable job key for a media item.
pub fn job_key_for(media_guid: Uuid) -> String {
    format!("archive-media-{}", media_guid)
}

/// Insert a job unless one is already in flight for the same key.
///
/// Returns whether the row was inserted; `false` means a queued or running
/// job already exists and this enqueue is a no-op.
pub async fn insert_in_flight(pool: &SqlitePool, job: &ArchivalJob) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO archive_jobs
            (id, job_key, media_guid, operation, status, attempts,
             intended_archive_date, last_error, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(job.id.to_string())
    .bind(&job.job_key)
    .bind(job.media_guid.to_string())
    .bind(job.operation.as_str())
    .bind(job.status.as_str())
    .bind(job.attempts)
    .bind(job.intended_archive_date.to_rfc3339())
    .bind(&job.last_error)
    .bind(job.created_at.to_rfc3339())
    .bind(job.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Claim the oldest pending job, marking it running and counting the
/// attempt. Returns `None` when the queue is empty.
pub async fn claim_next(pool: &SqlitePool) -> Result<Option<ArchivalJob>> {
    loop {
        let row = sqlx::query(
            r#"
            SELECT id FROM archive_jobs
            WHERE status = 'PENDING'
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let id: String = row.get("id");

        let claimed = sqlx::query(
            r#"
            UPDATE archive_jobs
            SET status = 'RUNNING', attempts = attempts + 1, updated_at = ?
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(&id)
        .execute(pool)
        .await?;

        // Lost the race to another worker; look for the next candidate.
        if claimed.rows_affected() == 1 {
            return load_job(pool, &id).await;
        }
    }
}

async fn load_job(pool: &SqlitePool, id: &str) -> Result<Option<ArchivalJob>> {
    let row = sqlx::query(
        r#"
        SELECT id, job_key, media_guid, operation, status, attempts,
               intended_archive_date, last_error, created_at, updated_at
        FROM archive_jobs
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(job_from_row).transpose()
}

/// Jobs currently in flight for a media item (at most one by construction).
pub async fn in_flight_for_media(pool: &SqlitePool, media_guid: Uuid) -> Result<Vec<ArchivalJob>> {
    let rows = sqlx::query(
        r#"
        SELECT id, job_key, media_guid, operation, status, attempts,
               intended_archive_date, last_error, created_at, updated_at
        FROM archive_jobs
        WHERE media_guid = ? AND status IN ('PENDING', 'RUNNING')
        "#,
    )
    .bind(media_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(job_from_row).collect()
}

/// In-flight jobs for every media item of an entry.
pub async fn in_flight_for_entry(pool: &SqlitePool, entry_guid: Uuid) -> Result<Vec<ArchivalJob>> {
    let rows = sqlx::query(
        r#"
        SELECT j.id, j.job_key, j.media_guid, j.operation, j.status, j.attempts,
               j.intended_archive_date, j.last_error, j.created_at, j.updated_at
        FROM archive_jobs j
        JOIN media m ON m.guid = j.media_guid
        WHERE m.entry_guid = ? AND j.status IN ('PENDING', 'RUNNING')
        "#,
    )
    .bind(entry_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(job_from_row).collect()
}

fn job_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ArchivalJob> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Malformed job id '{}': {}", id_str, e)))?;

    let media_guid_str: String = row.get("media_guid");
    let media_guid = Uuid::parse_str(&media_guid_str)
        .map_err(|e| Error::Internal(format!("Malformed media guid '{}': {}", media_guid_str, e)))?;

    let operation_str: String = row.get("operation");
    let operation = JobOperation::parse(&operation_str)
        .ok_or_else(|| Error::Internal(format!("Unknown job operation '{}'", operation_str)))?;

    let status_str: String = row.get("status");
    let status = JobStatus::parse(&status_str)
        .ok_or_else(|| Error::Internal(format!("Unknown job status '{}'", status_str)))?;

    let intended: String = row.get("intended_archive_date");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(ArchivalJob {
        id,
        job_key: row.get("job_key"),
        media_guid,
        operation,
        status,
        attempts: row.get("attempts"),
        intended_archive_date: parse_datetime(&intended)?,
        last_error: row.get("last_error"),
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// Mark a job finished successfully.
pub async fn mark_done(pool: &SqlitePool, id: Uuid) -> Result<()> {
    finish(pool, id, JobStatus::Done, None).await
}

/// Mark a job terminally failed; the row is kept for inspection until
/// pruned past the retention window.
pub async fn mark_failed(pool: &SqlitePool, id: Uuid, error: &str) -> Result<()> {
    finish(pool, id, JobStatus::Failed, Some(error)).await
}

/// Put a job back in the queue after a transient failure.
pub async fn release_for_retry(pool: &SqlitePool, id: Uuid, error: &str) -> Result<()> {
    finish(pool, id, JobStatus::Pending, Some(error)).await
}

async fn finish(
    pool: &SqlitePool,
    id: Uuid,
    status: JobStatus,
    error: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "UPDATE archive_jobs SET status = ?, last_error = ?, updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(error)
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete finished jobs older than the retention window.
pub async fn prune_finished(pool: &SqlitePool, retention_days: i64) -> Result<u64> {
    let cutoff = Utc::now() - Duration::days(retention_days);

    let result = sqlx::query(
        "DELETE FROM archive_jobs WHERE status IN ('DONE', 'FAILED') AND updated_at < ?",
    )
    .bind(cutoff.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
