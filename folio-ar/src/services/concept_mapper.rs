//! Role URI → relator code mapping
//!
//! For every role URI used by an entry's contributors, the mapper asks the
//! vocabulary service for the concept's "same-as" equivalents and keeps the
//! subset the archive recognizes (Library of Congress relator codes). The
//! resulting [`ConceptMapping`] is built once per archival attempt and
//! read-only afterwards; it is never persisted, since the upstream
//! vocabulary may change between attempts.

use std::collections::{BTreeMap, BTreeSet};

use folio_common::Entry;

use super::vocab_client::{VocabError, VocabularyClient};

/// URI prefix of relator codes the archive understands.
const RELATOR_PREFIX: &str = "http://id.loc.gov/vocabulary/relators/";

/// Extract the relator code from a LoC relator URI, if it is one.
pub fn relator_code(uri: &str) -> Option<&str> {
    let code = uri.strip_prefix(RELATOR_PREFIX)?;
    let code = code.trim_end_matches('/');
    if code.is_empty() || code.contains('/') {
        return None;
    }
    Some(code)
}

/// Resolved table from local role URIs to archive relator codes for one
/// archival attempt.
#[derive(Debug, Clone, Default)]
pub struct ConceptMapping {
    map: BTreeMap<String, BTreeSet<String>>,
}

impl ConceptMapping {
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.map.contains_key(uri)
    }

    /// Relator codes a single role URI maps to (possibly empty).
    pub fn codes_for(&self, uri: &str) -> Option<&BTreeSet<String>> {
        self.map.get(uri)
    }

    /// Union of all relator codes in the mapping.
    pub fn codes(&self) -> BTreeSet<String> {
        self.map.values().flatten().cloned().collect()
    }

    /// Role URIs that map to the given relator code.
    pub fn uris_for_code(&self, code: &str) -> Vec<&str> {
        self.map
            .iter()
            .filter(|(_, codes)| codes.contains(code))
            .map(|(uri, _)| uri.as_str())
            .collect()
    }

    fn insert(&mut self, uri: String, codes: BTreeSet<String>) {
        self.map.insert(uri, codes);
    }
}

impl FromIterator<(String, BTreeSet<String>)> for ConceptMapping {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Builds a [`ConceptMapping`] against the vocabulary service.
pub struct ConceptMapper<'a> {
    vocab: &'a VocabularyClient,
    mapping: ConceptMapping,
}

impl<'a> ConceptMapper<'a> {
    pub fn new(vocab: &'a VocabularyClient) -> Self {
        Self {
            vocab,
            mapping: ConceptMapping::default(),
        }
    }

    /// Resolve every role URI appearing on the entry's contributors.
    pub async fn build(
        vocab: &'a VocabularyClient,
        entry: &Entry,
    ) -> Result<ConceptMapper<'a>, VocabError> {
        let mut mapper = ConceptMapper::new(vocab);
        mapper.add_uris(role_uris(entry)).await?;
        Ok(mapper)
    }

    /// Resolve one role URI, idempotently.
    ///
    /// A lookup failure fails the whole archival attempt for that URI
    /// rather than dropping the role.
    pub async fn add_uri(&mut self, uri: &str) -> Result<(), VocabError> {
        if self.mapping.contains(uri) {
            return Ok(());
        }

        let equivalents = self.vocab.same_as(uri).await?;
        let codes: BTreeSet<String> = equivalents
            .iter()
            .filter_map(|e| relator_code(e))
            .map(|c| c.to_string())
            .collect();

        tracing::debug!(uri = %uri, codes = ?codes, "Resolved role concept");

        self.mapping.insert(uri.to_string(), codes);
        Ok(())
    }

    /// Resolve a set of role URIs, idempotently.
    pub async fn add_uris(
        &mut self,
        uris: impl IntoIterator<Item = String>,
    ) -> Result<(), VocabError> {
        for uri in uris {
            self.add_uri(&uri).await?;
        }
        Ok(())
    }

    pub fn into_mapping(self) -> ConceptMapping {
        self.mapping
    }
}

/// Union of role URIs found on an entry's contributors.
fn role_uris(entry: &Entry) -> BTreeSet<String> {
    let data = entry.typed_data();
    data.authors
        .iter()
        .chain(data.contributors.iter())
        .flat_map(|c| c.roles.iter())
        .filter_map(|role| role.source.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relator_code_extraction() {
        assert_eq!(
            relator_code("http://id.loc.gov/vocabulary/relators/aut"),
            Some("aut")
        );
        assert_eq!(
            relator_code("http://id.loc.gov/vocabulary/relators/pht/"),
            Some("pht")
        );
        assert_eq!(relator_code("http://id.loc.gov/vocabulary/relators/"), None);
        assert_eq!(relator_code("https://other.example.org/roles/aut"), None);
    }

    #[test]
    fn mapping_queries() {
        let mut mapping = ConceptMapping::default();
        mapping.insert(
            "https://voc.example.org/roles/photography".to_string(),
            ["pht".to_string(), "art".to_string()].into_iter().collect(),
        );
        mapping.insert(
            "https://voc.example.org/roles/artist".to_string(),
            ["art".to_string()].into_iter().collect(),
        );
        mapping.insert("https://voc.example.org/roles/unmapped".to_string(), BTreeSet::new());

        assert_eq!(mapping.codes().len(), 2);
        assert_eq!(
            mapping.uris_for_code("art"),
            vec![
                "https://voc.example.org/roles/artist",
                "https://voc.example.org/roles/photography"
            ]
        );
        assert!(mapping
            .codes_for("https://voc.example.org/roles/unmapped")
            .unwrap()
            .is_empty());
    }
}
