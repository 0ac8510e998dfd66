//! Configuration and data directory paths
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/active-forks/`, `~/.cache/active-forks/`
//! - macOS: `~/Library/Application Support/active-forks/`, `~/Library/Caches/active-forks/`
//! - Windows: `%APPDATA%\active-forks\`, `%LOCALAPPDATA%\active-forks\`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "active-forks";

/// Get the application config directory
/// Returns ~/.config/active-forks/ on Linux, ~/Library/Application Support/active-forks/ on macOS
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory {:?}", dir))?;
    Ok(dir)
}

/// Get the application cache directory
/// Returns ~/.cache/active-forks/ on Linux, ~/Library/Caches/active-forks/ on macOS
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create cache directory {:?}", dir))?;
    Ok(dir)
}

/// Get path to the persisted settings (last token and run options)
pub fn settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("settings.json"))
}

/// Get path to the response cache file
pub fn response_cache_path() -> Result<PathBuf> {
    Ok(cache_dir()?.join("responses.json"))
}
