//! Persisted settings
//!
//! The last-used token and run options, stored as JSON in the config
//! directory. Loading never fails: a missing or unreadable file yields the
//! defaults. Saving returns an error the caller is expected to log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::options::RunOptions;
use crate::paths;

/// Settings remembered between sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Last token entered by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Last run options
    #[serde(default)]
    pub options: RunOptions,

    /// When the settings were last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Settings {
    /// Load settings from the config directory, or defaults
    pub fn load() -> Self {
        match paths::settings_path() {
            Ok(path) => Self::load_from_path(&path),
            Err(e) => {
                log::warn!("Settings unavailable: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific path, or defaults
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No settings at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::read(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                log::warn!("{:#}", e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))
    }

    /// Save settings to the config directory
    pub fn save(&mut self) -> Result<()> {
        let path = paths::settings_path()?;
        self.save_to_path(&path)
    }

    /// Save settings to a specific path
    pub fn save_to_path(&mut self, path: &Path) -> Result<()> {
        self.saved_at = Some(Utc::now());

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {:?}", path))?;

        log::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Remember the token and options of a run that is starting
    pub fn remember_run(&mut self, token: Option<&str>, options: RunOptions) {
        self.token = token.filter(|t| !t.is_empty()).map(str::to_string);
        self.options = options;
    }
}
