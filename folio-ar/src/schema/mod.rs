//! Dynamic metadata validation schema
//!
//! A schema is an explicit field registry: an ordered list of field
//! descriptors plus profile-level document rules. Static fields come from
//! the profile; one optional repeated-person field is added per relator code
//! at build time. Insertion skips keys that are already defined, so a
//! dynamically discovered role can never override a hand-written rule such
//! as a mandatory role group.

pub mod profiles;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::concept_mapper::ConceptMapping;
use crate::translate::langmap;
use crate::translate::roles::role_key;
use crate::translate::ArchiveDocument;

/// Metadata validation profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Profile {
    Default,
    Thesis,
}

/// Shape of one document field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `bf:Title` objects with a non-empty main title
    TitleList,
    /// `skos:Concept` objects with a preferred label
    ConceptList,
    /// `{"@value": <iso 639-2 code>}` objects
    LanguageList,
    /// `bf:Note`/`bf:Summary` objects with labelled segments
    NoteList,
    /// `schema:Person` objects with a name
    PersonList,
    /// `{"@id": <url>}` objects
    LinkList,
}

/// One entry in the field registry
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub key: String,
    pub kind: FieldKind,
    /// Required fields must be present with at least one entry.
    pub required: bool,
}

/// Cross-field rule returning `(field key, message)` pairs.
type DocumentRule = fn(&ArchiveDocument) -> Vec<(String, String)>;

/// Nested validation errors mirroring the document shape.
///
/// Absence of errors is an explicitly empty report, never `None`, so error
/// translation can iterate without special cases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport(BTreeMap<String, Vec<String>>);

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        let slot = self.0.entry(key.into()).or_default();
        let message = message.into();
        if !slot.contains(&message) {
            slot.push(message);
        }
    }

    pub fn errors_for(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

/// Validation schema for one archival attempt
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    rules: Vec<DocumentRule>,
}

impl Schema {
    pub(crate) fn new(fields: Vec<FieldDescriptor>, rules: Vec<DocumentRule>) -> Self {
        Self { fields, rules }
    }

    /// Build the schema for a profile plus the mapping's dynamic role
    /// fields.
    pub fn build(profile: Profile, mapping: &ConceptMapping) -> Self {
        let mut schema = match profile {
            Profile::Default => profiles::default_schema(),
            Profile::Thesis => profiles::thesis_schema(),
        };

        for code in mapping.codes() {
            schema.add_dynamic_person_field(role_key(&code));
        }

        schema
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    /// Insert an optional repeated-person field unless the key is already
    /// statically defined (static definitions win).
    fn add_dynamic_person_field(&mut self, key: String) {
        if self.has_field(&key) {
            return;
        }
        self.fields.push(FieldDescriptor {
            key,
            kind: FieldKind::PersonList,
            required: false,
        });
    }

    /// Validate a translated document.
    pub fn validate(&self, doc: &ArchiveDocument) -> ValidationReport {
        let mut report = ValidationReport::default();

        for field in &self.fields {
            validate_field(field, doc.get(&field.key), &mut report);
        }

        for rule in &self.rules {
            for (key, message) in rule(doc) {
                report.add(key, message);
            }
        }

        report
    }
}

fn validate_field(field: &FieldDescriptor, value: Option<&Value>, report: &mut ValidationReport) {
    let items = match value {
        None | Some(Value::Null) => {
            if field.required {
                report.add(field.key.as_str(), "This field is required.");
            }
            return;
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            report.add(field.key.as_str(), "Expected a list.");
            return;
        }
    };

    if field.required && items.is_empty() {
        report.add(field.key.as_str(), "At least one entry is required.");
        return;
    }

    for item in items {
        if let Some(message) = validate_item(field.kind, item) {
            report.add(field.key.as_str(), message);
        }
    }
}

fn validate_item(kind: FieldKind, item: &Value) -> Option<&'static str> {
    match kind {
        FieldKind::TitleList => {
            let has_value = has_nonempty_string_list(item, "bf:mainTitle", "@value");
            (!has_value).then_some("Title entries need a non-empty main title.")
        }
        FieldKind::ConceptList => {
            let labelled = has_nonempty_string_list(item, "skos:prefLabel", "@value");
            (!labelled).then_some("Concept entries need a preferred label.")
        }
        FieldKind::LanguageList => {
            let code = item.get("@value").and_then(Value::as_str);
            code.map_or(true, |c| c.trim().is_empty())
                .then_some("Language entries need a code value.")
        }
        FieldKind::NoteList => {
            let typed = matches!(
                item.get("@type").and_then(Value::as_str),
                Some("bf:Note") | Some("bf:Summary")
            );
            let labelled = has_nonempty_string_list(item, "skos:prefLabel", "@value");
            (!(typed && labelled)).then_some("Note entries need a type and labelled text.")
        }
        FieldKind::PersonList => {
            let named = has_nonempty_string_list(item, "schema:name", "@value");
            (!named).then_some("Person entries need a name.")
        }
        FieldKind::LinkList => {
            let linked = item
                .get("@id")
                .and_then(Value::as_str)
                .is_some_and(|v| !v.trim().is_empty());
            (!linked).then_some("Link entries need a target.")
        }
    }
}

fn has_nonempty_string_list(item: &Value, list_key: &str, value_key: &str) -> bool {
    item.get(list_key)
        .and_then(Value::as_array)
        .is_some_and(|entries| {
            entries.iter().any(|e| {
                e.get(value_key)
                    .and_then(Value::as_str)
                    .is_some_and(|v| !v.trim().is_empty())
            })
        })
}

/// Thesis rule: every language must be a recognized 3-letter code.
pub(crate) fn recognized_language_rule(doc: &ArchiveDocument) -> Vec<(String, String)> {
    let key = "dcterms:language";
    let mut errors = Vec::new();

    // Presence is enforced by the field descriptor; only check entries.
    if let Some(languages) = doc.get(key).and_then(Value::as_array) {
        for language in languages {
            let code = language.get("@value").and_then(Value::as_str).unwrap_or("");
            if !langmap::is_recognized_iso639_2(code) {
                errors.push((key.to_string(), format!("Unrecognized language: {}", code)));
            }
        }
    }

    errors
}

/// Thesis rule: at least one English and one German abstract.
pub(crate) fn abstract_rule(doc: &ArchiveDocument) -> Vec<(String, String)> {
    let key = "bf:note";
    let mut errors = Vec::new();

    let summaries: Vec<&Value> = doc
        .get(key)
        .and_then(Value::as_array)
        .map(|notes| {
            notes
                .iter()
                .filter(|n| n.get("@type").and_then(Value::as_str) == Some("bf:Summary"))
                .collect()
        })
        .unwrap_or_default();

    let has_language = |language: &str| {
        summaries.iter().any(|summary| {
            summary
                .get("skos:prefLabel")
                .and_then(Value::as_array)
                .is_some_and(|labels| {
                    labels
                        .iter()
                        .any(|l| l.get("@language").and_then(Value::as_str) == Some(language))
                })
        })
    };

    if !has_language("eng") {
        errors.push((key.to_string(), "An English abstract is required.".to_string()));
    }
    if !has_language("ger") {
        errors.push((key.to_string(), "A German abstract is required.".to_string()));
    }

    errors
}
