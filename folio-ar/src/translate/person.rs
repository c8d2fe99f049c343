//! Person object construction for role groups

use folio_common::Contributor;
use serde_json::{json, Value};

/// Build the archive person object for a contributor.
///
/// A contributor with a resolvable identity carries the source URI as an
/// exact match; a free-text contributor becomes a minimal person with only
/// the display name.
pub fn person_object(contributor: &Contributor) -> Value {
    let mut person = json!({
        "@type": "schema:Person",
        "schema:name": [{"@value": contributor.label}],
    });

    if let Some(source) = &contributor.source {
        person["skos:exactMatch"] = json!([{"@type": "ids:uri", "@value": source}]);
    }

    person
}
