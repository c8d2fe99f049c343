//! Entry/media metadata translation
//!
//! Maps a portfolio entry (and, separately, a media item) to the archive's
//! role-keyed JSON-LD representation, and maps the archive's validation
//! errors back onto local field paths so API consumers never see
//! archive-internal key names.
//!
//! Each target field is one [`FieldTranslator`] unit; a profile is an
//! ordered list of units. Profile differences (Default vs. Thesis) are
//! expressed by swapping entries in that list, not by inheritance. Dynamic
//! role units are appended per relator code from the concept mapping.

pub mod fields;
pub mod langmap;
pub mod media;
pub mod person;
pub mod roles;

use std::collections::BTreeMap;

use folio_common::{Entry, EntryData};
use serde_json::Value;
use thiserror::Error;

use crate::schema::Profile;
use crate::services::concept_mapper::ConceptMapping;

/// Archive-side document: JSON-LD key → value.
pub type ArchiveDocument = serde_json::Map<String, Value>;

/// Field errors keyed by archive key (outbound) or local path (inbound).
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Translation errors
#[derive(Debug, Error)]
pub enum TranslationError {
    /// Required local data is missing or malformed (strict mode only).
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// The archive reported errors under a key no translator unit claims.
    /// Internal error; the archive key must not leak to the caller.
    #[error("Unrecognized archive error key: {0}")]
    UnknownErrorKey(String),
}

/// Per-attempt translation input shared by all units.
pub struct TranslationContext<'a> {
    pub entry: &'a Entry,
    pub data: EntryData,
    /// When set, units may fail on malformed required data instead of
    /// producing an empty fragment.
    pub strict: bool,
}

impl<'a> TranslationContext<'a> {
    pub fn new(entry: &'a Entry, strict: bool) -> Self {
        Self {
            entry,
            data: entry.typed_data(),
            strict,
        }
    }
}

/// One translator unit per target field.
///
/// `translate_data` is deterministic and total: absent optional data yields
/// an empty fragment, never an error. Error translation is the mirror
/// direction and is handled by the set via `key()`/`local_path()`.
pub trait FieldTranslator: Send + Sync {
    /// JSON-LD key this unit produces.
    fn key(&self) -> &str;

    /// Local field path the archive's errors for this key map back to.
    fn local_path(&self) -> &str;

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError>;
}

/// Ordered list of translator units for one profile.
pub struct TranslatorSet {
    units: Vec<Box<dyn FieldTranslator>>,
}

impl TranslatorSet {
    /// Assemble the unit list for a profile plus the dynamic role units
    /// derived from the concept mapping.
    pub fn for_profile(profile: Profile, mapping: &ConceptMapping, advisor_role_uri: &str) -> Self {
        let mut units: Vec<Box<dyn FieldTranslator>> = vec![
            Box::new(fields::TitleTranslator),
            Box::new(fields::TypeTranslator),
            Box::new(fields::KeywordsTranslator),
            Box::new(fields::LanguageTranslator),
            Box::new(fields::TextsTranslator),
            Box::new(fields::LocationTranslator),
            Box::new(fields::UrlTranslator),
            Box::new(roles::AuthorsTranslator),
        ];

        if profile == Profile::Thesis {
            units.push(Box::new(roles::SupervisorTranslator::new(advisor_role_uri)));
        }

        for code in mapping.codes() {
            let uris = mapping
                .uris_for_code(&code)
                .into_iter()
                .map(|u| u.to_string())
                .collect();
            units.push(Box::new(roles::DynamicRoleTranslator::new(code, uris)));
        }

        Self { units }
    }

    /// Translate an entry into the archive document.
    ///
    /// Units producing the same key are merged, never overwritten: array
    /// fragments are unioned, with entries already present left in place,
    /// so a contributor mapped through two routes appears once per group.
    pub fn translate_data(
        &self,
        entry: &Entry,
        strict: bool,
    ) -> Result<ArchiveDocument, TranslationError> {
        let cx = TranslationContext::new(entry, strict);
        let mut doc = ArchiveDocument::new();

        for unit in &self.units {
            let fragment = unit.translate_data(&cx)?;
            merge_fragment(&mut doc, unit.key(), fragment);
        }

        Ok(doc)
    }

    /// Translate archive-keyed validation errors to local field paths.
    ///
    /// When two units share a key (a static role group also reachable via a
    /// relator code), the first unit (the static one) claims the errors.
    pub fn translate_errors(&self, archive_errors: &ErrorMap) -> Result<ErrorMap, TranslationError> {
        let mut local = ErrorMap::new();

        for (archive_key, messages) in archive_errors {
            let unit = self
                .units
                .iter()
                .find(|u| u.key() == archive_key)
                .ok_or_else(|| TranslationError::UnknownErrorKey(archive_key.clone()))?;

            let slot = local.entry(unit.local_path().to_string()).or_default();
            for message in messages {
                if !slot.contains(message) {
                    slot.push(message.clone());
                }
            }
        }

        Ok(local)
    }
}

/// Merge one unit's fragment into the document under `key`.
///
/// Arrays union element-wise (idempotent; duplicates are not re-added).
/// A non-array fragment only fills an absent or empty slot.
fn merge_fragment(doc: &mut ArchiveDocument, key: &str, fragment: Value) {
    match doc.get_mut(key) {
        None => {
            doc.insert(key.to_string(), fragment);
        }
        Some(Value::Array(existing)) => {
            if let Value::Array(items) = fragment {
                for item in items {
                    if !existing.contains(&item) {
                        existing.push(item);
                    }
                }
            }
        }
        Some(existing) => {
            if existing.is_null() {
                *existing = fragment;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    use crate::services::concept_mapper::ConceptMapping;

    fn entry_with_data(data: serde_json::Value) -> Entry {
        Entry {
            guid: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            title: "A Title".to_string(),
            subtitle: None,
            entry_type: None,
            data,
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

    fn mapping_one(uri: &str, codes: &[&str]) -> ConceptMapping {
        std::iter::once((
            uri.to_string(),
            codes
                .iter()
                .map(|c| c.to_string())
                .collect::<BTreeSet<String>>(),
        ))
        .collect()
    }

    #[test]
    fn no_contributors_yields_all_static_fields_with_empty_groups() {
        let entry = entry_with_data(json!({}));
        let set = TranslatorSet::for_profile(Profile::Default, &ConceptMapping::default(), "");

        let doc = set.translate_data(&entry, false).unwrap();

        for key in [
            "dce:title",
            "edm:hasType",
            "dcterms:subject",
            "dcterms:language",
            "bf:note",
            "dcterms:spatial",
            "rdfs:seeAlso",
            "role:aut",
        ] {
            assert!(doc.contains_key(key), "missing static field {}", key);
        }
        assert_eq!(doc["role:aut"], json!([]));
        assert_eq!(doc["edm:hasType"], json!([]));
        assert_eq!(doc["dce:title"][0]["bf:mainTitle"][0]["@value"], "A Title");
    }

    #[test]
    fn role_with_two_codes_appears_in_both_groups_identically() {
        let role = "https://voc.example.org/roles/photography";
        let entry = entry_with_data(json!({
            "contributors": [{
                "label": "Grace Hopper",
                "source": "https://voc.example.org/persons/grace",
                "roles": [{"source": role, "label": "Photography"}]
            }]
        }));

        let mapping = mapping_one(role, &["pht", "art"]);
        let set = TranslatorSet::for_profile(Profile::Default, &mapping, "");

        let doc = set.translate_data(&entry, false).unwrap();

        let pht = doc["role:pht"].as_array().unwrap();
        let art = doc["role:art"].as_array().unwrap();
        assert_eq!(pht.len(), 1);
        assert_eq!(art.len(), 1);
        assert_eq!(pht[0], art[0]);
    }

    #[test]
    fn static_and_dynamic_author_groups_merge_idempotently() {
        let role = "https://voc.example.org/roles/author";
        let entry = entry_with_data(json!({
            "authors": [{
                "label": "Ada Lovelace",
                "roles": [{"source": role, "label": "Author"}]
            }]
        }));

        // The author role also resolves to the `aut` relator code, so the
        // static and dynamic units both write role:aut.
        let mapping = mapping_one(role, &["aut"]);
        let set = TranslatorSet::for_profile(Profile::Default, &mapping, "");

        let doc = set.translate_data(&entry, false).unwrap();
        assert_eq!(doc["role:aut"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn error_translation_maps_archive_keys_to_local_paths() {
        let set = TranslatorSet::for_profile(Profile::Thesis, &ConceptMapping::default(), "adv");

        let mut archive_errors = ErrorMap::new();
        archive_errors.insert(
            "dce:title".to_string(),
            vec!["This field is required.".to_string()],
        );
        archive_errors.insert(
            "bf:note".to_string(),
            vec!["An English abstract is required.".to_string()],
        );
        archive_errors.insert(
            "role:supervisor".to_string(),
            vec!["At least one entry is required.".to_string()],
        );

        let local = set.translate_errors(&archive_errors).unwrap();
        assert_eq!(local["title"], vec!["This field is required."]);
        assert_eq!(local["texts"], vec!["An English abstract is required."]);
        assert_eq!(
            local["data.contributors"],
            vec!["At least one entry is required."]
        );
        assert!(!local.contains_key("dce:title"));
    }

    #[test]
    fn empty_error_map_translates_to_empty() {
        let set = TranslatorSet::for_profile(Profile::Default, &ConceptMapping::default(), "");
        let local = set.translate_errors(&ErrorMap::new()).unwrap();
        assert!(local.is_empty());
    }

    #[test]
    fn unknown_archive_error_key_is_an_internal_error() {
        let set = TranslatorSet::for_profile(Profile::Default, &ConceptMapping::default(), "");

        let mut archive_errors = ErrorMap::new();
        archive_errors.insert(
            "phaidra:internalField".to_string(),
            vec!["whatever".to_string()],
        );

        let err = set.translate_errors(&archive_errors).unwrap_err();
        assert!(matches!(err, TranslationError::UnknownErrorKey(_)));
    }

    #[test]
    fn merge_unions_arrays_without_duplicates() {
        let mut doc = ArchiveDocument::new();
        merge_fragment(&mut doc, "role:aut", json!([{"schema:name": [{"@value": "A"}]}]));
        merge_fragment(
            &mut doc,
            "role:aut",
            json!([{"schema:name": [{"@value": "A"}]}, {"schema:name": [{"@value": "B"}]}]),
        );

        let group = doc.get("role:aut").unwrap().as_array().unwrap();
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn merge_never_loses_earlier_entries() {
        let mut doc = ArchiveDocument::new();
        merge_fragment(&mut doc, "role:pht", json!([{"schema:name": [{"@value": "A"}]}]));
        merge_fragment(&mut doc, "role:pht", json!([]));

        let group = doc.get("role:pht").unwrap().as_array().unwrap();
        assert_eq!(group.len(), 1);
    }
}
