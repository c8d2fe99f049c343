//! Static field translator units
//!
//! One unit per target field. Every unit emits its key with a
//! possibly-empty array so downstream validation and error translation can
//! iterate over a stable document shape.

use folio_common::Concept;
use serde_json::{json, Value};

use super::langmap;
use super::{FieldTranslator, TranslationContext, TranslationError};

/// Concept object shared by genre, subject and location groups.
fn concept_object(concept: &Concept) -> Value {
    let mut object = json!({
        "@type": "skos:Concept",
        "skos:prefLabel": [{"@value": concept.label, "@language": "und"}],
    });

    if let Some(source) = &concept.source {
        object["skos:exactMatch"] = json!([source]);
    }

    object
}

/// `dce:title` ← entry title/subtitle
pub struct TitleTranslator;

impl FieldTranslator for TitleTranslator {
    fn key(&self) -> &str {
        "dce:title"
    }

    fn local_path(&self) -> &str {
        "title"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        let title = cx.entry.title.trim();
        if title.is_empty() {
            if cx.strict {
                return Err(TranslationError::MissingData("title".to_string()));
            }
            return Ok(json!([]));
        }

        let mut object = json!({
            "@type": "bf:Title",
            "bf:mainTitle": [{"@value": title, "@language": "und"}],
        });

        if let Some(subtitle) = cx.entry.subtitle.as_deref().map(str::trim) {
            if !subtitle.is_empty() {
                object["bf:subtitle"] = json!([{"@value": subtitle, "@language": "und"}]);
            }
        }

        Ok(json!([object]))
    }
}

/// `edm:hasType` ← entry type concept (genre)
pub struct TypeTranslator;

impl FieldTranslator for TypeTranslator {
    fn key(&self) -> &str {
        "edm:hasType"
    }

    fn local_path(&self) -> &str {
        "type"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        match &cx.entry.entry_type {
            Some(concept) => Ok(json!([concept_object(concept)])),
            None => Ok(json!([])),
        }
    }
}

/// `dcterms:subject` ← keywords
pub struct KeywordsTranslator;

impl FieldTranslator for KeywordsTranslator {
    fn key(&self) -> &str {
        "dcterms:subject"
    }

    fn local_path(&self) -> &str {
        "keywords"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        let subjects: Vec<Value> = cx.entry.keywords.iter().map(concept_object).collect();
        Ok(Value::Array(subjects))
    }
}

/// `dcterms:language` ← entry languages (2-letter → 3-letter)
pub struct LanguageTranslator;

impl FieldTranslator for LanguageTranslator {
    fn key(&self) -> &str {
        "dcterms:language"
    }

    fn local_path(&self) -> &str {
        "data.language"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        let mut languages: Vec<Value> = Vec::new();
        for code in &cx.data.language {
            let three = langmap::to_iso639_2(code);
            let value = json!({"@value": three});
            if !languages.contains(&value) {
                languages.push(value);
            }
        }
        Ok(Value::Array(languages))
    }
}

/// `bf:note` ← typed, language-tagged texts
///
/// Texts typed as abstracts become `bf:Summary`, everything else `bf:Note`.
/// A segment with an unknown language code is kept with the undetermined
/// marker, never dropped.
pub struct TextsTranslator;

impl TextsTranslator {
    fn is_abstract(kind: Option<&Concept>) -> bool {
        match kind {
            Some(concept) => {
                concept.label.eq_ignore_ascii_case("abstract")
                    || concept
                        .source
                        .as_deref()
                        .is_some_and(|s| s.trim_end_matches('/').ends_with("/abstract"))
            }
            None => false,
        }
    }
}

impl FieldTranslator for TextsTranslator {
    fn key(&self) -> &str {
        "bf:note"
    }

    fn local_path(&self) -> &str {
        "texts"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        let mut notes = Vec::new();

        for text in &cx.entry.texts {
            if text.data.is_empty() {
                continue;
            }

            let note_type = if Self::is_abstract(text.kind.as_ref()) {
                "bf:Summary"
            } else {
                "bf:Note"
            };

            let labels: Vec<Value> = text
                .data
                .iter()
                .map(|segment| {
                    json!({
                        "@value": segment.text,
                        "@language": langmap::to_iso639_2(&segment.language),
                    })
                })
                .collect();

            notes.push(json!({
                "@type": note_type,
                "skos:prefLabel": labels,
            }));
        }

        Ok(Value::Array(notes))
    }
}

/// `dcterms:spatial` ← locations
pub struct LocationTranslator;

impl FieldTranslator for LocationTranslator {
    fn key(&self) -> &str {
        "dcterms:spatial"
    }

    fn local_path(&self) -> &str {
        "data.location"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        let places: Vec<Value> = cx.data.location.iter().map(concept_object).collect();
        Ok(Value::Array(places))
    }
}

/// `rdfs:seeAlso` ← entry URL
pub struct UrlTranslator;

impl FieldTranslator for UrlTranslator {
    fn key(&self) -> &str {
        "rdfs:seeAlso"
    }

    fn local_path(&self) -> &str {
        "data.url"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        match cx.data.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(json!([{
                "@id": url,
                "skos:prefLabel": [{"@value": url}],
            }])),
            _ => Ok(json!([])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_common::{Entry, EntryText, TextSegment};
    use serde_json::json;
    use uuid::Uuid;

    fn entry() -> Entry {
        Entry {
            guid: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            title: "A Title".to_string(),
            subtitle: None,
            entry_type: None,
            data: json!({}),
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

    #[test]
    fn title_with_subtitle() {
        let mut e = entry();
        e.subtitle = Some("A Subtitle".to_string());
        let cx = TranslationContext::new(&e, false);

        let value = TitleTranslator.translate_data(&cx).unwrap();
        assert_eq!(value[0]["bf:mainTitle"][0]["@value"], "A Title");
        assert_eq!(value[0]["bf:subtitle"][0]["@value"], "A Subtitle");
    }

    #[test]
    fn missing_title_is_empty_unless_strict() {
        let mut e = entry();
        e.title = "  ".to_string();

        let cx = TranslationContext::new(&e, false);
        assert_eq!(TitleTranslator.translate_data(&cx).unwrap(), json!([]));

        let strict = TranslationContext::new(&e, true);
        assert!(TitleTranslator.translate_data(&strict).is_err());
    }

    #[test]
    fn missing_type_yields_empty_group() {
        let e = entry();
        let cx = TranslationContext::new(&e, false);
        assert_eq!(TypeTranslator.translate_data(&cx).unwrap(), json!([]));
    }

    #[test]
    fn type_concept_translates() {
        let mut e = entry();
        e.entry_type = Some(Concept::new(
            "https://voc.example.org/types/thesis",
            "Thesis",
        ));
        let cx = TranslationContext::new(&e, false);

        let value = TypeTranslator.translate_data(&cx).unwrap();
        assert_eq!(value[0]["skos:prefLabel"][0]["@value"], "Thesis");
        assert_eq!(
            value[0]["skos:exactMatch"][0],
            "https://voc.example.org/types/thesis"
        );
    }

    #[test]
    fn unknown_text_language_falls_back_to_und() {
        let mut e = entry();
        e.texts = vec![EntryText {
            kind: None,
            data: vec![TextSegment {
                language: "xx".to_string(),
                text: "still archived".to_string(),
            }],
        }];
        let cx = TranslationContext::new(&e, false);

        let value = TextsTranslator.translate_data(&cx).unwrap();
        let notes = value.as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["skos:prefLabel"][0]["@language"], "und");
        assert_eq!(notes[0]["skos:prefLabel"][0]["@value"], "still archived");
    }

    #[test]
    fn abstract_kind_becomes_summary() {
        let mut e = entry();
        e.texts = vec![
            EntryText {
                kind: Some(Concept::new("https://voc.example.org/texts/abstract", "Abstract")),
                data: vec![TextSegment {
                    language: "en".to_string(),
                    text: "An abstract.".to_string(),
                }],
            },
            EntryText {
                kind: None,
                data: vec![TextSegment {
                    language: "en".to_string(),
                    text: "A note.".to_string(),
                }],
            },
        ];
        let cx = TranslationContext::new(&e, false);

        let value = TextsTranslator.translate_data(&cx).unwrap();
        assert_eq!(value[0]["@type"], "bf:Summary");
        assert_eq!(value[1]["@type"], "bf:Note");
    }

    #[test]
    fn languages_deduplicate() {
        let mut e = entry();
        e.data = json!({"language": ["en", "EN", "de"]});
        let cx = TranslationContext::new(&e, false);

        let value = LanguageTranslator.translate_data(&cx).unwrap();
        let languages = value.as_array().unwrap();
        assert_eq!(languages.len(), 2);
        assert_eq!(languages[0]["@value"], "eng");
        assert_eq!(languages[1]["@value"], "ger");
    }
}
