//! Async archival job dispatch
//!
//! One background job per media item. The enqueue path is a conditional
//! status update (check-and-set) followed by an insert that is unique among
//! in-flight job keys, so two concurrent enqueue attempts for the same item
//! produce exactly one job and one status transition; the loser is a no-op.

use folio_common::{ArchiveStatus, Media};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::jobs::{ArchivalJob, JobOperation};
use crate::db::{jobs, media as media_db};
use crate::error::ArchivalError;

pub struct JobDispatcher {
    db: SqlitePool,
}

impl JobDispatcher {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Enqueue one archival job per media item.
    ///
    /// Items already queued, running or archived (for the create lifecycle)
    /// are skipped. Returns the guids actually enqueued.
    pub async fn enqueue(&self, media_items: &[Media]) -> Result<Vec<Uuid>, ArchivalError> {
        let mut enqueued = Vec::new();

        for media in media_items {
            if self.enqueue_one(media).await? {
                enqueued.push(media.guid);
            }
        }

        Ok(enqueued)
    }

    async fn enqueue_one(&self, media: &Media) -> Result<bool, ArchivalError> {
        // An item that already has an archive identity re-enters the
        // lifecycle as an update; everything else is a first-time create.
        let (operation, eligible_from, queued_status) = if media.is_archived() {
            (
                JobOperation::Update,
                [ArchiveStatus::Archived, ArchiveStatus::ArchiveError],
                ArchiveStatus::InUpdate,
            )
        } else {
            (
                JobOperation::Create,
                [ArchiveStatus::NotArchived, ArchiveStatus::ArchiveError],
                ArchiveStatus::ToBeArchived,
            )
        };

        let moved =
            media_db::transition_status(&self.db, media.guid, &eligible_from, queued_status)
                .await?;
        if !moved {
            tracing::debug!(
                media_guid = %media.guid,
                status = media.archive_status.as_str(),
                "Enqueue skipped, item not in an eligible state"
            );
            return Ok(false);
        }

        let job = ArchivalJob::new(media.guid, operation);
        let inserted = jobs::insert_in_flight(&self.db, &job).await?;
        if !inserted {
            // A job for this key is still queued or running; the status
            // transition above already reflects the pending work.
            tracing::warn!(
                media_guid = %media.guid,
                job_key = %job.job_key,
                "Job already in flight, enqueue is a no-op"
            );
            return Ok(false);
        }

        tracing::info!(
            media_guid = %media.guid,
            job_id = %job.id,
            operation = job.operation.as_str(),
            "Archival job enqueued"
        );

        Ok(true)
    }
}
