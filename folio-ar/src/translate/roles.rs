//! Role group translator units
//!
//! Authors are a static group; the thesis profile adds a static supervisor
//! group translated from the local advisor role. Every relator code in the
//! concept mapping contributes one dynamic unit. Units producing the same
//! key are merged by the set, so one contributor whose role maps to two
//! relator codes appears under both groups.

use folio_common::Contributor;
use serde_json::Value;

use super::person::person_object;
use super::{FieldTranslator, TranslationContext, TranslationError};

/// Archive JSON-LD key for a relator code.
pub fn role_key(code: &str) -> String {
    format!("role:{}", code)
}

/// `role:aut` ← the entry's author list (role implied by the list)
pub struct AuthorsTranslator;

impl FieldTranslator for AuthorsTranslator {
    fn key(&self) -> &str {
        "role:aut"
    }

    fn local_path(&self) -> &str {
        "data.authors"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        let persons: Vec<Value> = cx.data.authors.iter().map(person_object).collect();
        Ok(Value::Array(persons))
    }
}

/// `role:supervisor` ← contributors carrying the local advisor role
pub struct SupervisorTranslator {
    advisor_role_uri: String,
}

impl SupervisorTranslator {
    pub fn new(advisor_role_uri: impl Into<String>) -> Self {
        Self {
            advisor_role_uri: advisor_role_uri.into(),
        }
    }
}

impl FieldTranslator for SupervisorTranslator {
    fn key(&self) -> &str {
        "role:supervisor"
    }

    fn local_path(&self) -> &str {
        "data.contributors"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        let supervisors: Vec<Value> = cx
            .data
            .contributors
            .iter()
            .filter(|c| has_role(c, &self.advisor_role_uri))
            .map(person_object)
            .collect();
        Ok(Value::Array(supervisors))
    }
}

/// `role:<code>` ← contributors whose role URI maps to this relator code
pub struct DynamicRoleTranslator {
    key: String,
    uris: Vec<String>,
}

impl DynamicRoleTranslator {
    pub fn new(code: impl AsRef<str>, uris: Vec<String>) -> Self {
        Self {
            key: role_key(code.as_ref()),
            uris,
        }
    }
}

impl FieldTranslator for DynamicRoleTranslator {
    fn key(&self) -> &str {
        &self.key
    }

    fn local_path(&self) -> &str {
        "data.contributors"
    }

    fn translate_data(&self, cx: &TranslationContext) -> Result<Value, TranslationError> {
        let persons: Vec<Value> = cx
            .data
            .authors
            .iter()
            .chain(cx.data.contributors.iter())
            .filter(|c| self.uris.iter().any(|uri| has_role(c, uri)))
            .map(person_object)
            .collect();
        Ok(Value::Array(persons))
    }
}

fn has_role(contributor: &Contributor, role_uri: &str) -> bool {
    contributor
        .roles
        .iter()
        .any(|role| role.source.as_deref() == Some(role_uri))
}
