//! Static profile schemas
//!
//! Default: title required, everything else optional. Thesis: additionally
//! at least one author, at least one supervisor, a recognized language and
//! one English plus one German abstract.

use super::{abstract_rule, recognized_language_rule, FieldDescriptor, FieldKind, Schema};

fn field(key: &str, kind: FieldKind, required: bool) -> FieldDescriptor {
    FieldDescriptor {
        key: key.to_string(),
        kind,
        required,
    }
}

/// Static fields shared by both profiles.
fn base_fields() -> Vec<FieldDescriptor> {
    vec![
        field("dce:title", FieldKind::TitleList, true),
        field("edm:hasType", FieldKind::ConceptList, false),
        field("dcterms:subject", FieldKind::ConceptList, false),
        field("dcterms:language", FieldKind::LanguageList, false),
        field("bf:note", FieldKind::NoteList, false),
        field("dcterms:spatial", FieldKind::ConceptList, false),
        field("rdfs:seeAlso", FieldKind::LinkList, false),
        field("role:aut", FieldKind::PersonList, false),
    ]
}

pub fn default_schema() -> Schema {
    Schema::new(base_fields(), Vec::new())
}

pub fn thesis_schema() -> Schema {
    let mut fields = base_fields();

    for f in &mut fields {
        match f.key.as_str() {
            "role:aut" | "dcterms:language" => f.required = true,
            _ => {}
        }
    }
    fields.push(field("role:supervisor", FieldKind::PersonList, true));

    Schema::new(fields, vec![recognized_language_rule, abstract_rule])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::concept_mapper::ConceptMapping;
    use crate::schema::Profile;
    use crate::schema::Schema;
    use serde_json::json;

    fn doc_from(value: serde_json::Value) -> crate::translate::ArchiveDocument {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn default_profile_accepts_title_only() {
        let schema = Schema::build(Profile::Default, &ConceptMapping::default());
        let doc = doc_from(json!({
            "dce:title": [{
                "@type": "bf:Title",
                "bf:mainTitle": [{"@value": "A Title", "@language": "und"}],
            }],
            "edm:hasType": [],
        }));

        let report = schema.validate(&doc);
        assert!(report.is_empty(), "unexpected errors: {:?}", report);
    }

    #[test]
    fn default_profile_requires_title() {
        let schema = Schema::build(Profile::Default, &ConceptMapping::default());
        let report = schema.validate(&doc_from(json!({"dce:title": []})));

        assert!(!report.is_empty());
        assert_eq!(
            report.errors_for("dce:title"),
            ["At least one entry is required."]
        );
    }

    #[test]
    fn thesis_profile_reports_exactly_the_missing_abstracts() {
        let schema = Schema::build(Profile::Thesis, &ConceptMapping::default());
        let doc = doc_from(json!({
            "dce:title": [{
                "@type": "bf:Title",
                "bf:mainTitle": [{"@value": "A Thesis", "@language": "und"}],
            }],
            "dcterms:language": [{"@value": "eng"}],
            "role:aut": [{"@type": "schema:Person", "schema:name": [{"@value": "Ada"}]}],
            "role:supervisor": [{"@type": "schema:Person", "schema:name": [{"@value": "X"}]}],
            "bf:note": [],
        }));

        let report = schema.validate(&doc);
        assert_eq!(
            report.errors_for("bf:note"),
            [
                "An English abstract is required.",
                "A German abstract is required."
            ]
        );
        // No other fields are flagged.
        assert_eq!(report.as_map().len(), 1);
    }

    #[test]
    fn thesis_profile_passes_with_both_abstracts() {
        let schema = Schema::build(Profile::Thesis, &ConceptMapping::default());
        let doc = doc_from(json!({
            "dce:title": [{
                "@type": "bf:Title",
                "bf:mainTitle": [{"@value": "A Thesis", "@language": "und"}],
            }],
            "dcterms:language": [{"@value": "ger"}],
            "role:aut": [{"@type": "schema:Person", "schema:name": [{"@value": "Ada"}]}],
            "role:supervisor": [{"@type": "schema:Person", "schema:name": [{"@value": "X"}]}],
            "bf:note": [
                {"@type": "bf:Summary", "skos:prefLabel": [{"@value": "English.", "@language": "eng"}]},
                {"@type": "bf:Summary", "skos:prefLabel": [{"@value": "Deutsch.", "@language": "ger"}]}
            ],
        }));

        let report = schema.validate(&doc);
        assert!(report.is_empty(), "unexpected errors: {:?}", report);
    }

    #[test]
    fn thesis_profile_rejects_unrecognized_language() {
        let schema = Schema::build(Profile::Thesis, &ConceptMapping::default());
        let doc = doc_from(json!({
            "dce:title": [{
                "@type": "bf:Title",
                "bf:mainTitle": [{"@value": "A Thesis", "@language": "und"}],
            }],
            "dcterms:language": [{"@value": "und"}],
            "role:aut": [{"@type": "schema:Person", "schema:name": [{"@value": "Ada"}]}],
            "role:supervisor": [{"@type": "schema:Person", "schema:name": [{"@value": "X"}]}],
            "bf:note": [
                {"@type": "bf:Summary", "skos:prefLabel": [{"@value": "English.", "@language": "eng"}]},
                {"@type": "bf:Summary", "skos:prefLabel": [{"@value": "Deutsch.", "@language": "ger"}]}
            ],
        }));

        let report = schema.validate(&doc);
        assert_eq!(
            report.errors_for("dcterms:language"),
            ["Unrecognized language: und"]
        );
    }

    #[test]
    fn dynamic_fields_never_override_static_rules() {
        let mapping: ConceptMapping = [
            (
                "https://voc.example.org/roles/author".to_string(),
                ["aut".to_string()].into_iter().collect(),
            ),
            (
                "https://voc.example.org/roles/photography".to_string(),
                ["pht".to_string()].into_iter().collect(),
            ),
        ]
        .into_iter()
        .collect();

        let schema = Schema::build(Profile::Thesis, &mapping);

        // role:aut stays required (static definition wins); role:pht was
        // added dynamically and is optional.
        let doc = doc_from(json!({
            "dce:title": [{
                "@type": "bf:Title",
                "bf:mainTitle": [{"@value": "A Thesis", "@language": "und"}],
            }],
            "dcterms:language": [{"@value": "eng"}],
            "role:aut": [],
            "role:supervisor": [{"@type": "schema:Person", "schema:name": [{"@value": "X"}]}],
            "bf:note": [
                {"@type": "bf:Summary", "skos:prefLabel": [{"@value": "English.", "@language": "eng"}]},
                {"@type": "bf:Summary", "skos:prefLabel": [{"@value": "Deutsch.", "@language": "ger"}]}
            ],
        }));

        let report = schema.validate(&doc);
        assert_eq!(
            report.errors_for("role:aut"),
            ["At least one entry is required."]
        );
        assert!(report.errors_for("role:pht").is_empty());
    }
}
