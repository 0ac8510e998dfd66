//! Application configuration
//!
//! Configuration loaded from .active-forks.toml file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration loaded from .active-forks.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the REST API (GitHub Enterprise uses `https://{host}/api/v3`)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL for links to commits in the web UI
    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,

    /// Per-request timeout in seconds, 0 disables it
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Keep cached responses on disk between runs
    #[serde(default = "default_persist_cache")]
    pub persist_cache: bool,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_web_base_url() -> String {
    "https://github.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_persist_cache() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            web_base_url: default_web_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            persist_cache: default_persist_cache(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    /// The request timeout, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
