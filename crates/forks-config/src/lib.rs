//! Configuration and file management for active-forks
//!
//! This crate provides:
//! - Platform paths for config and cache files
//! - Configuration file loading (TOML)
//! - Application configuration (AppConfig)
//! - Run options and the persisted settings (last token and options)

pub mod app_config;
pub mod config_file;
pub mod options;
pub mod paths;
pub mod settings;

pub use app_config::AppConfig;
pub use config_file::load_config_file;
pub use options::RunOptions;
pub use paths::{cache_dir, config_dir, response_cache_path, settings_path};
pub use settings::Settings;
