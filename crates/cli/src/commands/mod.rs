pub mod config_cmd;
pub mod doctor;
pub mod generate;
pub mod serve;

use deckhand_config::{AppConfig, ConfigError};
use std::path::{Path, PathBuf};

/// Resolve the config file: the explicit path if given, else the default.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load the file at `path` with environment overrides applied.
pub fn load_config(path: &Path) -> Result<AppConfig, String> {
    AppConfig::load_with_env(path).map_err(|e: ConfigError| format!("Failed to load config: {e}"))
}
