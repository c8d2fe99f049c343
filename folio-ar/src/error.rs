//! Error types for folio-ar
//!
//! `ArchivalError` is the subsystem taxonomy; `ApiError` is its HTTP
//! projection. Validation and ownership errors become structured responses
//! at the API boundary; consistency and external-service errors propagate
//! unmodified to be logged and, for jobs, retried per queue policy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::services::archive_client::ArchiveError;
use crate::services::vocab_client::VocabError;
use crate::translate::{ErrorMap, TranslationError};

/// Archival subsystem errors
#[derive(Debug, Error)]
pub enum ArchivalError {
    /// User-input validation failure, keyed by local field paths.
    #[error("Validation failed")]
    Validation(ErrorMap),

    /// Caller does not own the entry (or a media item in the request).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Push requested for an entry that already has an archive identity;
    /// the caller must use update.
    #[error("Entry {0} is already archived")]
    AlreadyArchived(Uuid),

    /// Update requested before the first successful push.
    #[error("Entry {0} has not been archived yet")]
    NotArchivedYet(Uuid),

    /// Container-before-member ordering violated. Programmer error: the
    /// push is aborted before any network call, never worked around.
    #[error("Ordering violation: {0}")]
    Consistency(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Vocabulary(#[from] VocabError),

    /// Internal translation failure; archive-internal vocabulary must not
    /// leak into user-facing messages.
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Storage(#[from] folio_common::Error),
}

impl ArchivalError {
    /// Whether a background job may retry after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            ArchivalError::Archive(e) => e.is_retryable(),
            ArchivalError::Vocabulary(_) | ArchivalError::Storage(_) => true,
            _ => false,
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Metadata validation failure (400 with nested field errors)
    #[error("Validation failed")]
    Validation(ErrorMap),

    /// Caller is not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409) - e.g., entry already archived
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream archive/vocabulary failure (502)
    #[error("Upstream service error: {0}")]
    BadGateway(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ArchivalError> for ApiError {
    fn from(err: ArchivalError) -> Self {
        match err {
            ArchivalError::Validation(errors) => ApiError::Validation(errors),
            ArchivalError::Forbidden(msg) => ApiError::Forbidden(msg),
            ArchivalError::NotFound(msg) => ApiError::NotFound(msg),
            ArchivalError::AlreadyArchived(guid) => {
                ApiError::Conflict(format!("Entry {} is already archived", guid))
            }
            ArchivalError::NotArchivedYet(guid) => {
                ApiError::BadRequest(format!("Entry {} has not been archived yet", guid))
            }
            ArchivalError::Consistency(msg) => ApiError::Internal(msg),
            ArchivalError::Archive(e) => ApiError::BadGateway(e.to_string()),
            ArchivalError::Vocabulary(e) => ApiError::BadGateway(e.to_string()),
            ArchivalError::Translation(e) => ApiError::Internal(e.to_string()),
            ArchivalError::Storage(e) => ApiError::from(e),
        }
    }
}

impl From<folio_common::Error> for ApiError {
    fn from(err: folio_common::Error) -> Self {
        match err {
            folio_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            folio_common::Error::Forbidden(msg) => ApiError::Forbidden(msg),
            folio_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, errors) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                "Validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg, None),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
                None,
            ),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });
        if let Some(errors) = errors {
            body["error"]["errors"] = json!(errors);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
