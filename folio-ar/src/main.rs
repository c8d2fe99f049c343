//! folio-ar - Archival Synchronization Service
//!
//! Synchronizes published portfolio entries and their media files into the
//! external permanent repository: metadata translation and validation,
//! container push/update, asynchronous member archival, and archival state
//! reconciliation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio_ar::services::archive_client::ArchiveClient;
use folio_ar::services::controller::ArchiveController;
use folio_ar::services::reconciler::Reconciler;
use folio_ar::services::vocab_client::VocabularyClient;
use folio_ar::services::worker;
use folio_ar::AppState;

#[derive(Debug, Parser)]
#[command(name = "folio-ar", about = "Folio archival synchronization service")]
struct Args {
    /// Config file path (default: platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database path override
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = folio_common::config::resolve_config_path(args.config.as_deref());
    let config = folio_common::config::load_config(&config_path)?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting folio-ar (Archival Synchronization) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db_path = args.database.unwrap_or_else(|| config.database_path());
    info!("Database: {}", db_path.display());

    let db_pool = folio_ar::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let password = folio_ar::config::resolve_archive_password(&config).unwrap_or_else(|| {
        tracing::warn!("No archive password configured; archive calls will be rejected");
        String::new()
    });

    let archive = Arc::new(ArchiveClient::new(
        config.archive.base_url.clone(),
        config.archive.username.clone(),
        password,
        config.archive.identifier_base.clone(),
    )?);
    let vocab = Arc::new(VocabularyClient::new(config.vocabulary.base_url.clone())?);

    let reconciler = Arc::new(Reconciler::new(
        db_pool.clone(),
        config.reconcile.entry_threshold_seconds,
        config.reconcile.asset_threshold_seconds,
    ));

    let controller = Arc::new(ArchiveController::new(
        db_pool.clone(),
        archive,
        vocab,
        reconciler.clone(),
        config.archive.thesis_type_sources.clone(),
        config.vocabulary.advisor_role_uri.clone(),
    ));

    // Background worker draining the archival job queue
    tokio::spawn(worker::run_worker(
        db_pool.clone(),
        controller.clone(),
        config.jobs.clone(),
    ));

    let state = AppState::new(db_pool, controller, reconciler);
    let app = folio_ar::build_router(state);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
