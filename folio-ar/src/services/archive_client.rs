//! External archive (permanent repository) client
//!
//! Synchronous HTTP calls against the archive's object API, executed from
//! within background jobs. Container and member objects are created with a
//! multipart `metadata` part; member creation adds the binary `file` part.
//!
//! Response classification:
//! - `403` is an authentication failure: fatal, surfaced to the operator,
//!   never retried automatically.
//! - Any other non-2xx is a generic service error, eligible for the job
//!   queue's retry policy.
//! - A 2xx body carrying a non-`success` alert is still a failure, as is a
//!   nominally successful create with an empty PID.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::translate::ArchiveDocument;

const USER_AGENT: &str = "folio-ar/0.1.0";

/// Archive client errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive rejected our credentials (HTTP 403). Needs operator
    /// attention; retrying cannot help.
    #[error("Archive authentication failed")]
    AuthenticationFailed,

    #[error("Archive service error {status}: {body}")]
    Service { status: u16, body: String },

    /// 2xx response whose payload carries failure alerts.
    #[error("Archive reported failure: {0}")]
    Alerts(String),

    /// 2xx create response without a usable PID.
    #[error("Archive returned success without a PID")]
    MissingPid,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Whether the job queue may retry after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ArchiveError::AuthenticationFailed)
    }
}

#[derive(Debug, Deserialize)]
struct Alert {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    #[serde(default)]
    pid: Option<String>,
    #[serde(default)]
    alerts: Vec<Alert>,
}

/// Client for the archive's object API
pub struct ArchiveClient {
    http_client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    identifier_base: String,
}

impl ArchiveClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        identifier_base: impl Into<String>,
    ) -> Result<Self, ArchiveError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ArchiveError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            identifier_base: identifier_base.into(),
        })
    }

    /// Public URI for a PID, joining the configured identifier base.
    pub fn identifier_uri(&self, pid: &str) -> String {
        format!("{}/{}", self.identifier_base.trim_end_matches('/'), pid)
    }

    /// Create the container object for an entry. Returns the assigned PID.
    pub async fn create_container(&self, doc: &ArchiveDocument) -> Result<String, ArchiveError> {
        let url = format!("{}/object/create", self.base_url);
        let form = reqwest::multipart::Form::new().text("metadata", metadata_part(doc)?);

        let response = self.post_multipart(&url, form).await?;
        self.extract_pid(response)
    }

    /// Update an existing container's metadata.
    pub async fn update_container(
        &self,
        pid: &str,
        doc: &ArchiveDocument,
    ) -> Result<(), ArchiveError> {
        let url = format!("{}/object/{}/metadata", self.base_url, pid);
        let form = reqwest::multipart::Form::new().text("metadata", metadata_part(doc)?);

        let response = self.post_multipart(&url, form).await?;
        check_alerts(&response)
    }

    /// Create a member object with its binary. Returns the assigned PID.
    pub async fn create_member(
        &self,
        file_path: &Path,
        filename: &str,
        mime_type: &str,
        doc: &ArchiveDocument,
    ) -> Result<String, ArchiveError> {
        let url = format!("{}/object/create", self.base_url);

        let bytes = tokio::fs::read(file_path).await?;
        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| ArchiveError::Parse(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("metadata", metadata_part(doc)?)
            .part("file", file_part);

        let response = self.post_multipart(&url, form).await?;
        self.extract_pid(response)
    }

    /// Update an existing member's metadata (same endpoint as containers).
    pub async fn update_member(&self, pid: &str, doc: &ArchiveDocument) -> Result<(), ArchiveError> {
        self.update_container(pid, doc).await
    }

    /// Link a member object into its container.
    pub async fn link(&self, container_pid: &str, member_pid: &str) -> Result<(), ArchiveError> {
        let url = format!(
            "{}/object/{}/relationship/add",
            self.base_url, container_pid
        );

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .form(&[
                ("predicate", "http://pcdm.org/models#hasMember"),
                ("object", &format!("info:fedora/{}", member_pid)),
            ])
            .send()
            .await
            .map_err(|e| ArchiveError::Network(e.to_string()))?;

        let response = classify_status(response).await?;
        check_alerts(&parse_body(response).await?)
    }

    async fn post_multipart(
        &self,
        url: &str,
        form: reqwest::multipart::Form,
    ) -> Result<ObjectResponse, ArchiveError> {
        tracing::debug!(url = %url, "Archive request");

        let response = self
            .http_client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ArchiveError::Network(e.to_string()))?;

        let response = classify_status(response).await?;
        parse_body(response).await
    }

    fn extract_pid(&self, response: ObjectResponse) -> Result<String, ArchiveError> {
        check_alerts(&response)?;

        match response.pid {
            Some(pid) if !pid.trim().is_empty() => Ok(pid),
            _ => Err(ArchiveError::MissingPid),
        }
    }
}

/// Serialize the translated document into the `metadata` form part.
fn metadata_part(doc: &ArchiveDocument) -> Result<String, ArchiveError> {
    serde_json::to_string(&json!({ "metadata": { "json-ld": doc } }))
        .map_err(|e| ArchiveError::Parse(e.to_string()))
}

async fn classify_status(response: reqwest::Response) -> Result<reqwest::Response, ArchiveError> {
    let status = response.status();

    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ArchiveError::AuthenticationFailed);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ArchiveError::Service {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

async fn parse_body(response: reqwest::Response) -> Result<ObjectResponse, ArchiveError> {
    response
        .json()
        .await
        .map_err(|e| ArchiveError::Parse(e.to_string()))
}

/// Any alert whose type is not the literal `success` marks the call failed,
/// even on a 2xx response.
fn check_alerts(response: &ObjectResponse) -> Result<(), ArchiveError> {
    let failures: Vec<String> = response
        .alerts
        .iter()
        .filter(|a| a.kind != "success")
        .map(|a| {
            if a.msg.is_empty() {
                a.kind.clone()
            } else {
                format!("{}: {}", a.kind, a.msg)
            }
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ArchiveError::Alerts(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(pid: Option<&str>, alerts: Vec<(&str, &str)>) -> ObjectResponse {
        ObjectResponse {
            pid: pid.map(|p| p.to_string()),
            alerts: alerts
                .into_iter()
                .map(|(kind, msg)| Alert {
                    kind: kind.to_string(),
                    msg: msg.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn success_alerts_pass() {
        assert!(check_alerts(&response(None, vec![("success", "ok")])).is_ok());
        assert!(check_alerts(&response(None, vec![])).is_ok());
    }

    #[test]
    fn any_other_alert_fails() {
        let err = check_alerts(&response(None, vec![("danger", "ingest failed")])).unwrap_err();
        assert!(matches!(err, ArchiveError::Alerts(_)));

        // Undocumented alert types are failures too, not special cases.
        let err = check_alerts(&response(None, vec![("info", "queued")])).unwrap_err();
        assert!(matches!(err, ArchiveError::Alerts(_)));
    }

    #[test]
    fn empty_pid_on_success_is_an_error() {
        let client = ArchiveClient::new("http://archive", "u", "p", "http://ids").unwrap();

        let err = client.extract_pid(response(Some("  "), vec![])).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingPid));

        let err = client.extract_pid(response(None, vec![])).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingPid));

        let pid = client.extract_pid(response(Some("o:123"), vec![])).unwrap();
        assert_eq!(pid, "o:123");
    }

    #[test]
    fn auth_failures_are_not_retryable() {
        assert!(!ArchiveError::AuthenticationFailed.is_retryable());
        assert!(ArchiveError::Service {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(ArchiveError::Network("timeout".to_string()).is_retryable());
    }

    #[test]
    fn identifier_uri_joins_base_and_pid() {
        let client =
            ArchiveClient::new("http://archive", "u", "p", "https://archive.example.org/detail/")
                .unwrap();
        assert_eq!(
            client.identifier_uri("o:123"),
            "https://archive.example.org/detail/o:123"
        );
    }
}
