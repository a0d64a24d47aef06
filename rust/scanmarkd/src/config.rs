use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Sidecar startup configuration.
///
/// Sources, later wins: built-in defaults, optional `scanmarkd.toml` (or any
/// format the `config` crate recognizes) in the working directory, then
/// `SCANMARKD_*` environment variables (`SCANMARKD_WORKSPACE`,
/// `SCANMARKD_LOG_LEVEL`). `RUST_LOG`, when set, still overrides the log
/// filter at subscriber setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub workspace: Option<PathBuf>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("scanmarkd").required(false))
            .add_source(Environment::with_prefix("SCANMARKD").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
