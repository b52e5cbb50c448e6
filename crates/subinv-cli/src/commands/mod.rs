//! Subcommands.

pub mod config;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Context;

use subinv_core::SubinvConfig;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subinv")
        .join("config.json")
}

/// Path of the active configuration file: the `--config` flag or the default.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// An explicitly given file must exist.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<SubinvConfig> {
    let path = config_path(explicit);
    if explicit.is_none() && !path.exists() {
        return Ok(SubinvConfig::default());
    }
    read_config(&path)
}

fn read_config(path: &Path) -> anyhow::Result<SubinvConfig> {
    SubinvConfig::from_file(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))
}
