//! Database models shared across Folio services
//!
//! Entries and media are created and mutated by the CRUD layer; the archival
//! daemon reads them and writes back only the archival triad
//! (`archive_id`, `archive_uri`, `archive_date`) plus the media
//! `archive_status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vocabulary concept: a source URI plus a display label.
///
/// Used for entry types, contributor roles, licenses, locations and
/// keywords alike. `source` is absent for free-text values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub label: String,
}

impl Concept {
    pub fn new(source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            label: label.into(),
        }
    }

    pub fn free_text(label: impl Into<String>) -> Self {
        Self {
            source: None,
            label: label.into(),
        }
    }
}

/// A person (or institution) credited on an entry.
///
/// `roles` is empty for plain author-list entries whose role is implied by
/// the list they appear in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Concept>,
}

/// One language-tagged text segment within an entry text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    pub language: String,
    pub text: String,
}

/// A typed, language-tagged text (abstract, note, ...) attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryText {
    /// Text kind concept (e.g. an "abstract" vocabulary entry). Untyped
    /// texts carry `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Concept>,
    #[serde(default)]
    pub data: Vec<TextSegment>,
}

/// A keyword attached to an entry; `source` is absent for free keywords.
pub type Keyword = Concept;

/// Typed view over the free-form `Entry::data` JSON blob.
///
/// The CRUD layer stores whatever the entry editor produced; the archival
/// subsystem only cares about these fields and tolerates anything extra.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryData {
    #[serde(default)]
    pub authors: Vec<Contributor>,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Vec<Concept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 2-letter language codes as entered in the editor.
    #[serde(default)]
    pub language: Vec<String>,
}

/// A portfolio entry (one creative/academic work).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub guid: Uuid,
    pub owner_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// Entry type concept; selects the archival metadata profile.
    pub entry_type: Option<Concept>,
    /// Free-form nested JSON from the entry editor (see [`EntryData`]).
    pub data: serde_json::Value,
    pub texts: Vec<EntryText>,
    pub keywords: Vec<Keyword>,
    pub published: bool,
    /// Persistent identifier assigned by the archive; set at most once.
    pub archive_id: Option<String>,
    pub archive_uri: Option<String>,
    /// Wall-clock time of the last successful container push.
    pub archive_date: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
    pub date_changed: DateTime<Utc>,
}

impl Entry {
    /// Deserialize the typed archival view of `data`.
    ///
    /// Unknown fields are ignored, missing fields default to empty, so a
    /// malformed editor payload never aborts an archival attempt here (the
    /// schema validation reports what is actually missing).
    pub fn typed_data(&self) -> EntryData {
        serde_json::from_value(self.data.clone()).unwrap_or_default()
    }

    pub fn is_archived(&self) -> bool {
        self.archive_id.is_some()
    }
}

/// Archival lifecycle of a media item.
///
/// `NotArchived → ToBeArchived → InProgress → { Archived | ArchiveError }`;
/// from `Archived`, a content change re-enters at `InUpdate` with the same
/// terminal states. Only the archival controller, dispatcher and worker
/// drive these transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArchiveStatus {
    NotArchived,
    ToBeArchived,
    InProgress,
    InUpdate,
    Archived,
    ArchiveError,
}

impl ArchiveStatus {
    /// Text form stored in the `media.archive_status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveStatus::NotArchived => "NOT_ARCHIVED",
            ArchiveStatus::ToBeArchived => "TO_BE_ARCHIVED",
            ArchiveStatus::InProgress => "IN_PROGRESS",
            ArchiveStatus::InUpdate => "IN_UPDATE",
            ArchiveStatus::Archived => "ARCHIVED",
            ArchiveStatus::ArchiveError => "ARCHIVE_ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NOT_ARCHIVED" => Some(ArchiveStatus::NotArchived),
            "TO_BE_ARCHIVED" => Some(ArchiveStatus::ToBeArchived),
            "IN_PROGRESS" => Some(ArchiveStatus::InProgress),
            "IN_UPDATE" => Some(ArchiveStatus::InUpdate),
            "ARCHIVED" => Some(ArchiveStatus::Archived),
            "ARCHIVE_ERROR" => Some(ArchiveStatus::ArchiveError),
            _ => None,
        }
    }

    /// True while a job for this item is queued or running.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            ArchiveStatus::ToBeArchived | ArchiveStatus::InProgress | ArchiveStatus::InUpdate
        )
    }
}

/// A file attached to exactly one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub guid: Uuid,
    pub entry_guid: Uuid,
    pub file_path: String,
    pub original_filename: String,
    pub mime_type: String,
    pub license: Option<Concept>,
    pub archive_id: Option<String>,
    pub archive_uri: Option<String>,
    pub archive_date: Option<DateTime<Utc>>,
    pub archive_status: ArchiveStatus,
    pub date_changed: DateTime<Utc>,
}

impl Media {
    pub fn is_archived(&self) -> bool {
        self.archive_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_data_tolerates_unknown_and_missing_fields() {
        let entry = Entry {
            guid: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            title: "A Title".to_string(),
            subtitle: None,
            entry_type: None,
            data: json!({
                "authors": [{"label": "Ada Lovelace"}],
                "unrelated_editor_field": {"nested": true}
            }),
            texts: vec![],
            keywords: vec![],
            published: false,
            archive_id: None,
            archive_uri: None,
            archive_date: None,
            date_created: Utc::now(),
            date_changed: Utc::now(),
        };

        let data = entry.typed_data();
        assert_eq!(data.authors.len(), 1);
        assert_eq!(data.authors[0].label, "Ada Lovelace");
        assert!(data.contributors.is_empty());
        assert!(data.language.is_empty());
    }

    #[test]
    fn archive_status_round_trips_through_text() {
        for status in [
            ArchiveStatus::NotArchived,
            ArchiveStatus::ToBeArchived,
            ArchiveStatus::InProgress,
            ArchiveStatus::InUpdate,
            ArchiveStatus::Archived,
            ArchiveStatus::ArchiveError,
        ] {
            assert_eq!(ArchiveStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ArchiveStatus::parse("bogus"), None);
    }

    #[test]
    fn in_flight_states() {
        assert!(ArchiveStatus::ToBeArchived.is_in_flight());
        assert!(ArchiveStatus::InProgress.is_in_flight());
        assert!(ArchiveStatus::InUpdate.is_in_flight());
        assert!(!ArchiveStatus::Archived.is_in_flight());
        assert!(!ArchiveStatus::NotArchived.is_in_flight());
        assert!(!ArchiveStatus::ArchiveError.is_in_flight());
    }
}
