//! Configuration loading for Folio services
//!
//! Resolution priority for the config file path:
//! 1. Command-line argument (highest priority)
//! 2. `FOLIO_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/folio/folio.toml` on Linux)
//!
//! A missing config file is not fatal: the service logs a warning and starts
//! with compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5741
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// External archive (permanent repository) configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Archive API base URL, e.g. `https://archive.example.org/api`
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    /// Prefer `FOLIO_ARCHIVE_PASSWORD` over this field.
    #[serde(default)]
    pub password: Option<String>,
    /// Base joined with the PID to form the public `archive_uri`,
    /// e.g. `https://archive.example.org/detail`
    #[serde(default)]
    pub identifier_base: String,
    /// Entry type source URIs that select the stricter thesis profile.
    #[serde(default)]
    pub thesis_type_sources: Vec<String>,
}

/// Controlled-vocabulary lookup service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Vocabulary API base URL, e.g. `https://voc.example.org/api`
    #[serde(default)]
    pub base_url: String,
    /// Local role URI translated to the archive's supervisor role for
    /// thesis entries.
    #[serde(default = "default_advisor_role_uri")]
    pub advisor_role_uri: String,
}

fn default_advisor_role_uri() -> String {
    "https://voc.example.org/roles/advisor".to_string()
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            advisor_role_uri: default_advisor_role_uri(),
        }
    }
}

/// Background archival job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Worker poll interval when the queue is empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Retry budget per job; authentication failures are never retried.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
    /// Failed jobs are kept for inspection this long, then pruned.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_attempts() -> i64 {
    3
}

fn default_retention_days() -> i64 {
    14
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            max_attempts: default_max_attempts(),
            retention_days: default_retention_days(),
        }
    }
}

/// Thresholds absorbing clock skew between near-simultaneous save and push
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub entry_threshold_seconds: i64,
    #[serde(default)]
    pub asset_threshold_seconds: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// SQLite database path; defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Database path with the compiled default applied.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Resolve the config file path (CLI arg → env var → platform default).
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var("FOLIO_CONFIG") {
        return PathBuf::from(path);
    }

    default_config_path()
}

/// Load configuration from the resolved path.
///
/// A missing file degrades to compiled defaults with a warning; a file that
/// exists but fails to parse is a hard error (silent misconfiguration of
/// archive credentials is worse than refusing to start).
pub fn load_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "Config file not found, starting with compiled defaults"
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Write configuration back to a TOML file (best-effort, creates parents).
pub fn write_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Platform default config file path
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("folio").join("folio.toml"))
        .unwrap_or_else(|| PathBuf::from("folio.toml"))
}

/// Platform default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("folio").join("folio.db"))
        .unwrap_or_else(|| PathBuf::from("folio.db"))
}
