//! Controlled-vocabulary lookup client
//!
//! Read-only access to the vocabulary service's "same-as" equivalents for a
//! concept URI. Responses are cached for the lifetime of this process only:
//! the upstream vocabulary can change between runs, so the cache must never
//! be treated as authoritative past that window.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

const USER_AGENT: &str = "folio-ar/0.1.0";

/// Vocabulary client errors
#[derive(Debug, Error)]
pub enum VocabError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Concept not found: {0}")]
    ConceptNotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, serde::Deserialize)]
struct SameAsResponse {
    #[serde(default)]
    same_as: Vec<String>,
}

/// Vocabulary lookup client with a per-process response cache
pub struct VocabularyClient {
    http_client: reqwest::Client,
    base_url: String,
    cache: RwLock<HashMap<String, Vec<String>>>,
}

impl VocabularyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, VocabError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VocabError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Fetch the "same-as" equivalent URIs for a concept.
    ///
    /// A lookup failure is an error, never an empty result: silently
    /// dropping a role would silently suppress a contributor in the archive.
    pub async fn same_as(&self, uri: &str) -> Result<Vec<String>, VocabError> {
        if let Some(cached) = self.cache.read().await.get(uri) {
            return Ok(cached.clone());
        }

        let url = format!("{}/concepts/same-as", self.base_url);

        tracing::debug!(uri = %uri, "Querying vocabulary service");

        let response = self
            .http_client
            .get(&url)
            .query(&[("uri", uri)])
            .send()
            .await
            .map_err(|e| VocabError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(VocabError::ConceptNotFound(uri.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VocabError::ApiError(status.as_u16(), error_text));
        }

        let parsed: SameAsResponse = response
            .json()
            .await
            .map_err(|e| VocabError::ParseError(e.to_string()))?;

        self.cache
            .write()
            .await
            .insert(uri.to_string(), parsed.same_as.clone());

        Ok(parsed.same_as)
    }
}
