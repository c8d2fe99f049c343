//! Integration tests for archival job dispatch
//!
//! Covers the enqueue check-and-set, at-most-one in-flight job per media
//! item (including under concurrent enqueue attempts), the update
//! re-entry lifecycle, job claiming and retention pruning.

use chrono::{Duration, Utc};
use folio_ar::db::jobs::{self, ArchivalJob, JobOperation, JobStatus};
use folio_ar::services::dispatcher::JobDispatcher;
use folio_common::{ArchiveStatus, Concept, Entry, Media};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn setup_db(dir: &tempfile::TempDir) -> SqlitePool {
    let db_path = dir.path().join("folio.db");
    folio_ar::db::init_database_pool(&db_path)
        .await
        .expect("Should initialize test database")
}

fn entry_fixture() -> Entry {
    Entry {
        guid: Uuid::new_v4(),
        owner_id: "user-1".to_string(),
        title: "A Title".to_string(),
        subtitle: None,
        entry_type: None,
        data: serde_json::json!({}),
        texts: vec![],
        keywords: vec![],
        published: true,
        archive_id: None,
        archive_uri: None,
        archive_date: None,
        date_created: Utc::now(),
        date_changed: Utc::now(),
    }
}

fn media_fixture(entry_guid: Uuid) -> Media {
    Media {
        guid: Uuid::new_v4(),
        entry_guid,
        file_path: "/data/media/talk.mp4".to_string(),
        original_filename: "talk.mp4".to_string(),
        mime_type: "video/mp4".to_string(),
        license: Some(Concept::new(
            "https://creativecommons.org/licenses/by/4.0/",
            "CC BY 4.0",
        )),
        archive_id: None,
        archive_uri: None,
        archive_date: None,
        archive_status: ArchiveStatus::NotArchived,
        date_changed: Utc::now(),
    }
}

async fn save_fixture(pool: &SqlitePool, entry: &Entry, media: &Media) {
    folio_ar::db::entries::save_entry(pool, entry).await.unwrap();
    folio_ar::db::media::save_media(pool, media).await.unwrap();
}

async fn job_count(pool: &SqlitePool, media_guid: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM archive_jobs WHERE media_guid = ?")
        .bind(media_guid.to_string())
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn media_status(pool: &SqlitePool, guid: Uuid) -> ArchiveStatus {
    folio_ar::db::media::load_media(pool, guid)
        .await
        .unwrap()
        .unwrap()
        .archive_status
}

#[tokio::test]
async fn concurrent_enqueues_create_exactly_one_job() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_db(&dir).await;

    let entry = entry_fixture();
    let media = media_fixture(entry.guid);
    save_fixture(&pool, &entry, &media).await;

    let d1 = JobDispatcher::new(pool.clone());
    let d2 = JobDispatcher::new(pool.clone());

    let (r1, r2) = tokio::join!(
        d1.enqueue(std::slice::from_ref(&media)),
        d2.enqueue(std::slice::from_ref(&media)),
    );

    let enqueued = r1.unwrap().len() + r2.unwrap().len();
    assert_eq!(enqueued, 1, "exactly one enqueue must win");
    assert_eq!(job_count(&pool, media.guid).await, 1);
    assert_eq!(
        media_status(&pool, media.guid).await,
        ArchiveStatus::ToBeArchived
    );
}

#[tokio::test]
async fn second_sequential_enqueue_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_db(&dir).await;

    let entry = entry_fixture();
    let media = media_fixture(entry.guid);
    save_fixture(&pool, &entry, &media).await;

    let dispatcher = JobDispatcher::new(pool.clone());

    let first = dispatcher.enqueue(std::slice::from_ref(&media)).await.unwrap();
    assert_eq!(first.len(), 1);

    let second = dispatcher.enqueue(std::slice::from_ref(&media)).await.unwrap();
    assert!(second.is_empty());

    assert_eq!(job_count(&pool, media.guid).await, 1);
}

#[tokio::test]
async fn archived_media_reenters_as_update() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_db(&dir).await;

    let entry = entry_fixture();
    let mut media = media_fixture(entry.guid);
    media.archive_id = Some("o:42".to_string());
    media.archive_uri = Some("https://archive.example.org/detail/o:42".to_string());
    media.archive_date = Some(Utc::now() - Duration::hours(1));
    media.archive_status = ArchiveStatus::Archived;
    save_fixture(&pool, &entry, &media).await;

    let dispatcher = JobDispatcher::new(pool.clone());
    let enqueued = dispatcher.enqueue(std::slice::from_ref(&media)).await.unwrap();

    assert_eq!(enqueued.len(), 1);
    assert_eq!(media_status(&pool, media.guid).await, ArchiveStatus::InUpdate);

    let in_flight = jobs::in_flight_for_media(&pool, media.guid).await.unwrap();
    assert_eq!(in_flight.len(), 1);
    assert_eq!(in_flight[0].operation, JobOperation::Update);
}

#[tokio::test]
async fn finished_jobs_do_not_block_reenqueue() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_db(&dir).await;

    let entry = entry_fixture();
    let media = media_fixture(entry.guid);
    save_fixture(&pool, &entry, &media).await;

    let dispatcher = JobDispatcher::new(pool.clone());
    dispatcher.enqueue(std::slice::from_ref(&media)).await.unwrap();

    // Simulate the worker completing the create lifecycle.
    let job = jobs::claim_next(&pool).await.unwrap().unwrap();
    jobs::mark_done(&pool, job.id).await.unwrap();
    folio_ar::db::media::record_member_archived(
        &pool,
        media.guid,
        "o:7",
        "https://archive.example.org/detail/o:7",
        Utc::now(),
    )
    .await
    .unwrap();

    // The done row keeps its job key; a later update enqueue for the same
    // item must still be possible.
    let updated = folio_ar::db::media::load_media(&pool, media.guid)
        .await
        .unwrap()
        .unwrap();
    let enqueued = dispatcher.enqueue(std::slice::from_ref(&updated)).await.unwrap();

    assert_eq!(enqueued.len(), 1);
    assert_eq!(job_count(&pool, media.guid).await, 2);
    assert_eq!(media_status(&pool, media.guid).await, ArchiveStatus::InUpdate);
}

#[tokio::test]
async fn claim_marks_running_and_counts_the_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_db(&dir).await;

    let entry = entry_fixture();
    let media = media_fixture(entry.guid);
    save_fixture(&pool, &entry, &media).await;

    assert!(jobs::claim_next(&pool).await.unwrap().is_none());

    let dispatcher = JobDispatcher::new(pool.clone());
    dispatcher.enqueue(std::slice::from_ref(&media)).await.unwrap();

    let job = jobs::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.attempts, 1);
    assert_eq!(job.media_guid, media.guid);

    // Nothing else pending.
    assert!(jobs::claim_next(&pool).await.unwrap().is_none());
}

#[tokio::test]
async fn released_jobs_are_claimable_again() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_db(&dir).await;

    let entry = entry_fixture();
    let media = media_fixture(entry.guid);
    save_fixture(&pool, &entry, &media).await;

    let dispatcher = JobDispatcher::new(pool.clone());
    dispatcher.enqueue(std::slice::from_ref(&media)).await.unwrap();

    let job = jobs::claim_next(&pool).await.unwrap().unwrap();
    jobs::release_for_retry(&pool, job.id, "archive timed out")
        .await
        .unwrap();

    let retried = jobs::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(retried.id, job.id);
    assert_eq!(retried.attempts, 2);
    assert_eq!(retried.last_error.as_deref(), Some("archive timed out"));
}

#[tokio::test]
async fn prune_removes_only_old_finished_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_db(&dir).await;

    let entry = entry_fixture();
    let media = media_fixture(entry.guid);
    save_fixture(&pool, &entry, &media).await;

    let old_job = ArchivalJob::new(media.guid, JobOperation::Create);
    jobs::insert_in_flight(&pool, &old_job).await.unwrap();
    jobs::mark_failed(&pool, old_job.id, "archive rejected the object")
        .await
        .unwrap();

    // Age the failed row past the retention window.
    sqlx::query("UPDATE archive_jobs SET updated_at = ? WHERE id = ?")
        .bind((Utc::now() - Duration::days(30)).to_rfc3339())
        .bind(old_job.id.to_string())
        .execute(&pool)
        .await
        .unwrap();

    let recent_job = ArchivalJob::new(media.guid, JobOperation::Create);
    jobs::insert_in_flight(&pool, &recent_job).await.unwrap();
    jobs::mark_failed(&pool, recent_job.id, "archive rejected the object")
        .await
        .unwrap();

    let pruned = jobs::prune_finished(&pool, 14).await.unwrap();
    assert_eq!(pruned, 1);
    assert_eq!(job_count(&pool, media.guid).await, 1);
}
