//! Locating the optional `.active-forks.toml`

use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".active-forks.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "ACTIVE_FORKS_CONFIG";

/// Candidate config files, most specific first
///
/// 1. `$ACTIVE_FORKS_CONFIG`
/// 2. `.active-forks.toml` in the working directory
/// 3. `.active-forks.toml` in the home directory
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        candidates.push(PathBuf::from(explicit));
    }
    candidates.push(PathBuf::from(CONFIG_FILE));
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(CONFIG_FILE));
    }
    candidates
}

/// Content of the first readable candidate, with its path
pub fn read_first(candidates: &[PathBuf]) -> Option<(&Path, String)> {
    candidates.iter().find_map(|path| {
        let content = std::fs::read_to_string(path).ok()?;
        log::debug!("Loaded config from {}", path.display());
        Some((path.as_path(), content))
    })
}

/// Load config file content, or `None` when no candidate exists
pub fn load_config_file() -> Option<String> {
    let candidates = config_candidates();
    read_first(&candidates).map(|(_, content)| content)
}
