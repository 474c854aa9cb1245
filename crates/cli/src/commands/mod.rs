//! Subcommand implementations.

pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod init_index;
pub mod serve;

use std::path::Path;

use groundwire_config::AppConfig;

/// Load config from `path` or the default location, with env overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    AppConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}").into())
}
