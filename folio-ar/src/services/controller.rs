//! Archival orchestration
//!
//! The controller is the unit-of-work boundary for one entry and a set of
//! its media items: ownership checks, profile selection, concept mapping,
//! translation, validation, container push/update, and member job enqueue.
//! Members are only enqueued after the container result is durably
//! recorded; the worker re-checks the container identity immediately before
//! each member push.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use folio_common::{ArchiveStatus, Entry, Media};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::jobs::{ArchivalJob, JobOperation};
use crate::db::{entries as entries_db, media as media_db};
use crate::error::ArchivalError;
use crate::schema::{Profile, Schema};
use crate::services::archive_client::ArchiveClient;
use crate::services::concept_mapper::ConceptMapper;
use crate::services::dispatcher::JobDispatcher;
use crate::services::reconciler::Reconciler;
use crate::services::vocab_client::VocabularyClient;
use crate::translate::{media as media_translate, ErrorMap, TranslatorSet};

/// Synchronous result of a container push/update.
///
/// Member pushes run asynchronously and are not part of this result.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveResult {
    pub archive_id: String,
    pub archive_uri: String,
    pub archive_date: chrono::DateTime<Utc>,
}

pub struct ArchiveController {
    db: SqlitePool,
    archive: Arc<ArchiveClient>,
    vocab: Arc<VocabularyClient>,
    dispatcher: JobDispatcher,
    reconciler: Arc<Reconciler>,
    thesis_type_sources: Vec<String>,
    advisor_role_uri: String,
}

impl ArchiveController {
    pub fn new(
        db: SqlitePool,
        archive: Arc<ArchiveClient>,
        vocab: Arc<VocabularyClient>,
        reconciler: Arc<Reconciler>,
        thesis_type_sources: Vec<String>,
        advisor_role_uri: String,
    ) -> Self {
        Self {
            dispatcher: JobDispatcher::new(db.clone()),
            db,
            archive,
            vocab,
            reconciler,
            thesis_type_sources,
            advisor_role_uri,
        }
    }

    /// Metadata profile for an entry: type listed as a thesis type selects
    /// the stricter profile.
    pub fn profile_for(&self, entry: &Entry) -> Profile {
        let is_thesis = entry
            .entry_type
            .as_ref()
            .and_then(|t| t.source.as_deref())
            .is_some_and(|source| self.thesis_type_sources.iter().any(|t| t == source));

        if is_thesis {
            Profile::Thesis
        } else {
            Profile::Default
        }
    }

    /// Validate an entry and the requested media items.
    ///
    /// Ownership is resolved first; all metadata and media field errors are
    /// aggregated into one structured validation error.
    pub async fn validate(
        &self,
        entry_id: Uuid,
        media_ids: &[Uuid],
        user_id: &str,
    ) -> Result<(), ArchivalError> {
        let entry = self.load_owned_entry(entry_id, user_id).await?;
        let media = self.load_request_media(&entry, media_ids).await?;
        self.validate_loaded(&entry, &media).await.map(|_| ())
    }

    /// Push a never-archived entry: create the container, persist the
    /// archival triad, then enqueue one member job per media item.
    pub async fn push_to_archive(
        &self,
        entry_id: Uuid,
        media_ids: &[Uuid],
        user_id: &str,
    ) -> Result<ArchiveResult, ArchivalError> {
        let entry = self.load_owned_entry(entry_id, user_id).await?;
        if entry.is_archived() {
            return Err(ArchivalError::AlreadyArchived(entry.guid));
        }

        let media = self.load_request_media(&entry, media_ids).await?;
        let doc = self.validate_loaded(&entry, &media).await?;

        let pid = self.archive.create_container(&doc).await?;
        let archive_uri = self.archive.identifier_uri(&pid);
        let archive_date = Utc::now();

        entries_db::record_container_archived(&self.db, entry.guid, &pid, &archive_uri, archive_date)
            .await?;

        tracing::info!(
            entry_guid = %entry.guid,
            pid = %pid,
            "Container created in archive"
        );

        let enqueued = self.dispatcher.enqueue(&media).await?;
        tracing::info!(
            entry_guid = %entry.guid,
            enqueued = enqueued.len(),
            "Member archival jobs enqueued"
        );

        Ok(ArchiveResult {
            archive_id: pid,
            archive_uri,
            archive_date,
        })
    }

    /// Update an already-archived entry's container and re-enqueue its
    /// media.
    pub async fn update_archive(
        &self,
        entry_id: Uuid,
        media_ids: &[Uuid],
        user_id: &str,
    ) -> Result<ArchiveResult, ArchivalError> {
        let entry = self.load_owned_entry(entry_id, user_id).await?;
        let Some(pid) = entry.archive_id.clone() else {
            return Err(ArchivalError::NotArchivedYet(entry.guid));
        };

        let media = self.load_request_media(&entry, media_ids).await?;
        let doc = self.validate_loaded(&entry, &media).await?;

        // Succeeds only on a positive acknowledgment from the archive.
        self.archive.update_container(&pid, &doc).await?;

        let archive_uri = entry
            .archive_uri
            .clone()
            .unwrap_or_else(|| self.archive.identifier_uri(&pid));
        let archive_date = Utc::now();

        entries_db::record_container_archived(&self.db, entry.guid, &pid, &archive_uri, archive_date)
            .await?;

        tracing::info!(
            entry_guid = %entry.guid,
            pid = %pid,
            "Container updated in archive"
        );

        let enqueued = self.dispatcher.enqueue(&media).await?;
        tracing::info!(
            entry_guid = %entry.guid,
            enqueued = enqueued.len(),
            "Member archival jobs enqueued"
        );

        Ok(ArchiveResult {
            archive_id: pid,
            archive_uri,
            archive_date,
        })
    }

    /// Explicit lifecycle call for the CRUD collaborator: after committing
    /// a change, re-archive the entry if (and only if) it diverged from the
    /// archived state. Returns whether an update was performed.
    pub async fn maybe_schedule_update(&self, entry_id: Uuid) -> Result<bool, ArchivalError> {
        let entry = entries_db::load_entry(&self.db, entry_id)
            .await?
            .ok_or_else(|| ArchivalError::NotFound(format!("Entry {}", entry_id)))?;

        if !entry.is_archived() {
            return Ok(false);
        }

        let changed = self.reconciler.has_changed(&entry, None, None).await?;
        if changed != Some(true) {
            return Ok(false);
        }

        let media = media_db::load_media_for_entry(&self.db, entry.guid).await?;
        let media_ids: Vec<Uuid> = media.iter().map(|m| m.guid).collect();
        let owner = entry.owner_id.clone();

        self.update_archive(entry.guid, &media_ids, &owner).await?;
        Ok(true)
    }

    /// Archive one media item from a background job.
    ///
    /// A missing container identity is a caller ordering bug: fatal, and no
    /// HTTP call is made.
    pub async fn push_media(&self, job: &ArchivalJob) -> Result<(), ArchivalError> {
        let media = media_db::load_media(&self.db, job.media_guid)
            .await?
            .ok_or_else(|| ArchivalError::NotFound(format!("Media {}", job.media_guid)))?;

        let entry = entries_db::load_entry(&self.db, media.entry_guid)
            .await?
            .ok_or_else(|| ArchivalError::NotFound(format!("Entry {}", media.entry_guid)))?;

        let Some(container_pid) = entry.archive_id.as_deref() else {
            return Err(ArchivalError::Consistency(format!(
                "Media {} cannot be archived before its entry {} has a container",
                media.guid, entry.guid
            )));
        };

        let doc = media_translate::build_media_document(&media);

        match job.operation {
            JobOperation::Create => {
                media_db::set_status(&self.db, media.guid, ArchiveStatus::InProgress).await?;

                let pid = self
                    .archive
                    .create_member(
                        Path::new(&media.file_path),
                        &media.original_filename,
                        &media.mime_type,
                        &doc,
                    )
                    .await?;
                self.archive.link(container_pid, &pid).await?;

                let archive_uri = self.archive.identifier_uri(&pid);
                media_db::record_member_archived(
                    &self.db,
                    media.guid,
                    &pid,
                    &archive_uri,
                    job.intended_archive_date,
                )
                .await?;

                tracing::info!(
                    media_guid = %media.guid,
                    pid = %pid,
                    container_pid = %container_pid,
                    "Member created and linked in archive"
                );
            }
            JobOperation::Update => {
                let Some(member_pid) = media.archive_id.as_deref() else {
                    return Err(ArchivalError::Consistency(format!(
                        "Update job for media {} without a member identity",
                        media.guid
                    )));
                };

                self.archive.update_member(member_pid, &doc).await?;

                let archive_uri = media
                    .archive_uri
                    .clone()
                    .unwrap_or_else(|| self.archive.identifier_uri(member_pid));
                media_db::record_member_archived(
                    &self.db,
                    media.guid,
                    member_pid,
                    &archive_uri,
                    job.intended_archive_date,
                )
                .await?;

                tracing::info!(
                    media_guid = %media.guid,
                    pid = %member_pid,
                    "Member updated in archive"
                );
            }
        }

        Ok(())
    }

    async fn load_owned_entry(
        &self,
        entry_id: Uuid,
        user_id: &str,
    ) -> Result<Entry, ArchivalError> {
        let entry = entries_db::load_entry(&self.db, entry_id)
            .await?
            .ok_or_else(|| ArchivalError::NotFound(format!("Entry {}", entry_id)))?;

        if entry.owner_id != user_id {
            return Err(ArchivalError::Forbidden(format!(
                "Entry {} is not owned by the caller",
                entry_id
            )));
        }

        Ok(entry)
    }

    /// Load the requested media items and check each belongs to the entry.
    async fn load_request_media(
        &self,
        entry: &Entry,
        media_ids: &[Uuid],
    ) -> Result<Vec<Media>, ArchivalError> {
        let mut media = Vec::with_capacity(media_ids.len());

        for media_id in media_ids {
            let item = media_db::load_media(&self.db, *media_id)
                .await?
                .ok_or_else(|| ArchivalError::NotFound(format!("Media {}", media_id)))?;

            if item.entry_guid != entry.guid {
                return Err(ArchivalError::Forbidden(format!(
                    "Media {} does not belong to entry {}",
                    media_id, entry.guid
                )));
            }

            media.push(item);
        }

        Ok(media)
    }

    /// Translate and validate; returns the archive document on success.
    async fn validate_loaded(
        &self,
        entry: &Entry,
        media: &[Media],
    ) -> Result<crate::translate::ArchiveDocument, ArchivalError> {
        let profile = self.profile_for(entry);

        let mut mapper = ConceptMapper::build(&self.vocab, entry).await?;
        if profile == Profile::Thesis {
            // Must-use default role: the supervisor group is validated even
            // when no contributor currently carries the advisor role.
            mapper.add_uri(&self.advisor_role_uri).await?;
        }
        let mapping = mapper.into_mapping();

        let translator = TranslatorSet::for_profile(profile, &mapping, &self.advisor_role_uri);
        let schema = Schema::build(profile, &mapping);

        let doc = translator.translate_data(entry, false)?;
        let report = schema.validate(&doc);

        let mut errors = translator.translate_errors(report.as_map())?;
        merge_media_errors(&mut errors, media);

        if !errors.is_empty() {
            return Err(ArchivalError::Validation(errors));
        }

        Ok(doc)
    }
}

/// File/license checks for each media item in the request.
fn merge_media_errors(errors: &mut ErrorMap, media: &[Media]) {
    for item in media {
        if item.license.is_none() {
            errors
                .entry(format!("media.{}.license", item.guid))
                .or_default()
                .push("A license is required.".to_string());
        }
        if item.mime_type.trim().is_empty() {
            errors
                .entry(format!("media.{}.mime_type", item.guid))
                .or_default()
                .push("A mime type is required.".to_string());
        }
        if item.file_path.trim().is_empty() {
            errors
                .entry(format!("media.{}.file", item.guid))
                .or_default()
                .push("The media file is missing.".to_string());
        }
    }
}
