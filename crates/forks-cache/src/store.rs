//! Durable key-value storage
//!
//! The response cache writes through to one of these stores. Every
//! operation returns a `Result` so the caller can decide what a failure
//! means; the cache itself logs and ignores them.

use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by a durable store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read store {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store contents are not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A string-to-string store that survives restarts
///
/// Implementations must be `Send` so a cache owning one can be shared
/// behind `Arc<Mutex<_>>`.
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`, `Ok(None)` if absent
    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Store that keeps everything in memory
///
/// Used when persistence is disabled and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file
///
/// The file is read lazily on first access and rewritten in full on every
/// `set`, through a sibling temp file that replaces it atomically. The cost
/// of a write grows with the file, which has no size bound. A missing file
/// is an empty store; an unreadable JSON document is discarded and
/// overwritten by the next `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Option<HashMap<String, String>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&mut self) -> Result<&mut HashMap<String, String>, StorageError> {
        if self.entries.is_none() {
            let loaded = match load_entries(&self.path) {
                Err(StorageError::Corrupt(e)) => {
                    warn!("Discarding corrupt response cache {:?}: {}", self.path, e);
                    HashMap::new()
                }
                other => other?,
            };
            debug!(
                "Loaded {} cached responses from {:?}",
                loaded.len(),
                self.path
            );
            self.entries = Some(loaded);
        }

        Ok(self.entries.get_or_insert_with(HashMap::new))
    }

    fn flush(&self) -> Result<(), StorageError> {
        let Some(entries) = &self.entries else {
            return Ok(());
        };

        let content = serde_json::to_string(entries)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content)
            .and_then(|_| fs::rename(&staging, &self.path))
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

fn load_entries(path: &Path) -> Result<HashMap<String, String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(source) => Err(StorageError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        self.flush()
    }
}
