//! Configuration types for the icarus poller

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::integration::Integration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Flat key-value store holding credentials and preferences
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
    /// Integrations whose status is polled by `watch`
    #[serde(default = "default_integrations")]
    pub integrations: Vec<Integration>,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            integrations: default_integrations(),
            http: HttpConfig::default(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("icarus-settings.json")
}

fn default_integrations() -> Vec<Integration> {
    vec![Integration::Tautulli]
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("icarus/{}", env!("CARGO_PKG_VERSION"))
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::IcarusError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    if config.http.timeout_seconds == 0 {
        return Err(crate::IcarusError::Config(
            "http.timeout_seconds must be greater than zero".to_string(),
        ));
    }
    Ok(config)
}
