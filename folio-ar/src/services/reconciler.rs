//! Archival state reconciliation
//!
//! Read-only component answering "has this entry or any of its archived
//! media changed since it was last archived?". Media state is read through
//! the [`StatusRepository`] interface with two backing stores: the durable
//! media table, and the in-flight job table whose rows carry the archive
//! date a running job will record on success (the database has not been
//! updated yet while the job runs).

use chrono::{DateTime, Duration, Utc};
use folio_common::{Entry, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{jobs, media as media_db};

/// One media item's archival comparison input.
#[derive(Debug, Clone)]
pub struct ArchivalSnapshot {
    pub media_guid: Uuid,
    pub date_changed: DateTime<Utc>,
    /// When this state was (or will be) recorded as archived; `None` means
    /// the comparison is indeterminate.
    pub archived_at: Option<DateTime<Utc>>,
}

/// Read access to one backing store of archival state.
pub trait StatusRepository {
    fn snapshots_for_entry(
        &self,
        entry_guid: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ArchivalSnapshot>>> + Send;
}

/// Archival state as persisted on the media rows.
pub struct DurableStatusRepository {
    db: SqlitePool,
}

impl DurableStatusRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

impl StatusRepository for DurableStatusRepository {
    async fn snapshots_for_entry(&self, entry_guid: Uuid) -> Result<Vec<ArchivalSnapshot>> {
        let media = media_db::load_media_for_entry(&self.db, entry_guid).await?;

        Ok(media
            .into_iter()
            .filter(|m| m.is_archived() || m.archive_status == folio_common::ArchiveStatus::Archived)
            .map(|m| ArchivalSnapshot {
                media_guid: m.guid,
                date_changed: m.date_changed,
                archived_at: m.archive_date,
            })
            .collect())
    }
}

/// Archival state carried by jobs still queued or running.
pub struct InFlightStatusRepository {
    db: SqlitePool,
}

impl InFlightStatusRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

impl StatusRepository for InFlightStatusRepository {
    async fn snapshots_for_entry(&self, entry_guid: Uuid) -> Result<Vec<ArchivalSnapshot>> {
        let in_flight = jobs::in_flight_for_entry(&self.db, entry_guid).await?;

        let mut snapshots = Vec::with_capacity(in_flight.len());
        for job in in_flight {
            let Some(media) = media_db::load_media(&self.db, job.media_guid).await? else {
                continue;
            };
            snapshots.push(ArchivalSnapshot {
                media_guid: media.guid,
                date_changed: media.date_changed,
                archived_at: Some(job.intended_archive_date),
            });
        }

        Ok(snapshots)
    }
}

/// Answers whether local state diverged from the last archival.
pub struct Reconciler {
    durable: DurableStatusRepository,
    in_flight: InFlightStatusRepository,
    default_entry_threshold: i64,
    default_asset_threshold: i64,
}

impl Reconciler {
    pub fn new(db: SqlitePool, entry_threshold_seconds: i64, asset_threshold_seconds: i64) -> Self {
        Self {
            durable: DurableStatusRepository::new(db.clone()),
            in_flight: InFlightStatusRepository::new(db),
            default_entry_threshold: entry_threshold_seconds,
            default_asset_threshold: asset_threshold_seconds,
        }
    }

    /// Has the entry, or any of its archived media, changed since the last
    /// archival?
    ///
    /// `None` when the entry was never archived, or when nothing is known
    /// to have changed but at least one comparison had no data; never a
    /// guessed `false`. Thresholds (seconds) absorb clock skew between
    /// near-simultaneous save and push; call-site values override the
    /// configured defaults.
    pub async fn has_changed(
        &self,
        entry: &Entry,
        entry_threshold: Option<i64>,
        asset_threshold: Option<i64>,
    ) -> Result<Option<bool>> {
        let Some(archive_date) = entry.archive_date else {
            return Ok(None);
        };

        let entry_threshold = entry_threshold.unwrap_or(self.default_entry_threshold);
        let asset_threshold = asset_threshold.unwrap_or(self.default_asset_threshold);

        // Cheapest positive signal first: the entry's own timestamps.
        if changed_after(entry.date_changed, archive_date, entry_threshold) {
            return Ok(Some(true));
        }

        let mut indeterminate = false;

        let mut snapshots = self.durable.snapshots_for_entry(entry.guid).await?;
        snapshots.extend(self.in_flight.snapshots_for_entry(entry.guid).await?);

        for snapshot in snapshots {
            match snapshot.archived_at {
                Some(archived_at) => {
                    if changed_after(snapshot.date_changed, archived_at, asset_threshold) {
                        return Ok(Some(true));
                    }
                }
                None => indeterminate = true,
            }
        }

        if indeterminate {
            Ok(None)
        } else {
            Ok(Some(false))
        }
    }
}

fn changed_after(changed: DateTime<Utc>, archived: DateTime<Utc>, threshold_seconds: i64) -> bool {
    changed > archived + Duration::seconds(threshold_seconds)
}
