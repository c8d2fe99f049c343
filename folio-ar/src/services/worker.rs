//! Background archival worker
//!
//! Drains the job table: claims the oldest pending job, runs the member
//! push through the controller, and settles the job row. Transient archive
//! failures go back in the queue until the attempt budget is exhausted;
//! authentication failures and ordering bugs fail immediately. A stalled
//! archive blocks only this worker, never the request path.

use std::sync::Arc;
use std::time::Duration;

use folio_common::config::JobsConfig;
use folio_common::ArchiveStatus;
use sqlx::SqlitePool;
use tokio::time::{interval, MissedTickBehavior};

use crate::db::jobs::{self, ArchivalJob};
use crate::db::media as media_db;
use crate::services::controller::ArchiveController;

/// Seconds between retention prunes of finished jobs.
const PRUNE_INTERVAL_SECS: u64 = 3600;

/// Run the worker loop until the process exits.
pub async fn run_worker(db: SqlitePool, controller: Arc<ArchiveController>, config: JobsConfig) {
    tracing::info!(
        poll_interval = config.poll_interval_seconds,
        max_attempts = config.max_attempts,
        retention_days = config.retention_days,
        "Archival worker started"
    );

    let mut prune_timer = interval(Duration::from_secs(PRUNE_INTERVAL_SECS));
    prune_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        match jobs::claim_next(&db).await {
            Ok(Some(job)) => {
                process_job(&db, &controller, job, config.max_attempts).await;
            }
            Ok(None) => {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(config.poll_interval_seconds)) => {}
                    _ = prune_timer.tick() => {
                        match jobs::prune_finished(&db, config.retention_days).await {
                            Ok(0) => {}
                            Ok(pruned) => {
                                tracing::info!(pruned, "Pruned finished archival jobs");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Job prune failed");
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Job claim failed");
                tokio::time::sleep(Duration::from_secs(config.poll_interval_seconds)).await;
            }
        }
    }
}

async fn process_job(
    db: &SqlitePool,
    controller: &ArchiveController,
    job: ArchivalJob,
    max_attempts: i64,
) {
    tracing::info!(
        job_id = %job.id,
        media_guid = %job.media_guid,
        operation = job.operation.as_str(),
        attempt = job.attempts,
        "Processing archival job"
    );

    match controller.push_media(&job).await {
        Ok(()) => {
            if let Err(e) = jobs::mark_done(db, job.id).await {
                tracing::error!(job_id = %job.id, error = %e, "Failed to settle job");
            }
        }
        Err(e) => {
            let retry = e.is_retryable() && job.attempts < max_attempts;

            if retry {
                tracing::warn!(
                    job_id = %job.id,
                    media_guid = %job.media_guid,
                    attempt = job.attempts,
                    error = %e,
                    "Archival job failed, will retry"
                );
                if let Err(e) = jobs::release_for_retry(db, job.id, &e.to_string()).await {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to requeue job");
                }
            } else {
                tracing::error!(
                    job_id = %job.id,
                    media_guid = %job.media_guid,
                    attempt = job.attempts,
                    error = %e,
                    "Archival job failed terminally"
                );
                if let Err(e) = jobs::mark_failed(db, job.id, &e.to_string()).await {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to settle job");
                }
                if let Err(e) =
                    media_db::set_status(db, job.media_guid, ArchiveStatus::ArchiveError).await
                {
                    tracing::error!(media_guid = %job.media_guid, error = %e, "Failed to record error status");
                }
            }
        }
    }
}
