//! folio-ar library interface
//!
//! Exposes the archival subsystem for the daemon binary and for
//! integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod services;
pub mod translate;

pub use crate::error::{ApiError, ApiResult, ArchivalError};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::services::controller::ArchiveController;
use crate::services::reconciler::Reconciler;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Archival orchestration
    pub controller: Arc<ArchiveController>,
    /// Read-only archival state queries
    pub reconciler: Arc<Reconciler>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        controller: Arc<ArchiveController>,
        reconciler: Arc<Reconciler>,
    ) -> Self {
        Self {
            db,
            controller,
            reconciler,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::archival_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
