//! Configuration resolution for folio-ar
//!
//! Archive credentials resolve ENV → TOML so a deployment can keep the
//! password out of the config file.

use folio_common::config::TomlConfig;
use tracing::warn;

/// Resolve the archive password (`FOLIO_ARCHIVE_PASSWORD` wins over TOML).
pub fn resolve_archive_password(toml_config: &TomlConfig) -> Option<String> {
    let env_password = std::env::var("FOLIO_ARCHIVE_PASSWORD")
        .ok()
        .filter(|p| !p.trim().is_empty());
    let toml_password = toml_config
        .archive
        .password
        .clone()
        .filter(|p| !p.trim().is_empty());

    if env_password.is_some() && toml_password.is_some() {
        warn!("Archive password found in both environment and TOML. Using environment.");
    }

    env_password.or(toml_password)
}
