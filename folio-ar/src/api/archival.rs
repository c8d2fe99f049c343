//! Archival API handlers
//!
//! POST /archive/validate, POST /archive/push, POST /archive/update,
//! POST /archive/refresh/:entry_id, GET /archive/changed/:entry_id
//!
//! The CRUD collaborator passes the acting user in the `X-User-Id` header;
//! ownership is enforced by the controller before any network call.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::controller::ArchiveResult;
use crate::AppState;

/// Request body shared by validate/push/update
#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    pub entry_id: Uuid,
    #[serde(default)]
    pub media_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub scheduled: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangedParams {
    pub entry_threshold: Option<i64>,
    pub asset_threshold: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChangedResponse {
    /// `null` when the entry was never archived or the comparison is
    /// indeterminate.
    pub changed: Option<bool>,
}

fn user_id(headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing X-User-Id header".to_string()))
}

/// POST /archive/validate
///
/// 204 when the entry and media would archive cleanly; 400 with nested
/// field errors otherwise.
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ArchiveRequest>,
) -> ApiResult<StatusCode> {
    let user = user_id(&headers)?;

    state
        .controller
        .validate(request.entry_id, &request.media_ids, &user)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /archive/push
pub async fn push(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ArchiveRequest>,
) -> ApiResult<Json<ArchiveResult>> {
    let user = user_id(&headers)?;

    let result = state
        .controller
        .push_to_archive(request.entry_id, &request.media_ids, &user)
        .await?;

    Ok(Json(result))
}

/// POST /archive/update
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ArchiveRequest>,
) -> ApiResult<Json<ArchiveResult>> {
    let user = user_id(&headers)?;

    let result = state
        .controller
        .update_archive(request.entry_id, &request.media_ids, &user)
        .await?;

    Ok(Json(result))
}

/// POST /archive/refresh/{entry_id}
///
/// Explicit lifecycle call for the CRUD layer after committing a change.
pub async fn refresh(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<Json<RefreshResponse>> {
    let scheduled = state.controller.maybe_schedule_update(entry_id).await?;
    Ok(Json(RefreshResponse { scheduled }))
}

/// GET /archive/changed/{entry_id}
pub async fn changed(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Query(params): Query<ChangedParams>,
) -> ApiResult<Json<ChangedResponse>> {
    let entry = crate::db::entries::load_entry(&state.db, entry_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Entry {}", entry_id)))?;

    let changed = state
        .reconciler
        .has_changed(&entry, params.entry_threshold, params.asset_threshold)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ChangedResponse { changed }))
}

pub fn archival_routes() -> Router<AppState> {
    Router::new()
        .route("/archive/validate", post(validate))
        .route("/archive/push", post(push))
        .route("/archive/update", post(update))
        .route("/archive/refresh/:entry_id", post(refresh))
        .route("/archive/changed/:entry_id", get(changed))
}
