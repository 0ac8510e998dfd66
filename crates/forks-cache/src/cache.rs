//! ETag-keyed response cache
//!
//! The cache never merges: a successful fetch replaces the whole entry for
//! its URL. Only the shrunk payload is kept, not the raw response body.

use crate::store::{KeyValueStore, MemoryStore};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request headers as ordered name/value pairs
pub type RequestHeaders = Vec<(String, String)>;

/// Header carrying the conditional validator
pub const IF_NONE_MATCH: &str = "If-None-Match";

/// Normalized cache key for a request URL
///
/// URLs are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(url: &str) -> Self {
        Self(url.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A cached response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// ETag the server sent with the response (if any)
    pub etag: Option<String>,
    /// When the response was fetched
    pub fetched_at: DateTime<Utc>,
    /// The shrunk payload
    pub payload: serde_json::Value,
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub struct Lookup {
    /// The cached entry, if one exists
    pub entry: Option<CacheEntry>,
    /// Headers to send: the caller's headers plus the conditional validator
    pub headers: RequestHeaders,
}

impl Lookup {
    /// Whether the request will be sent as a conditional request
    pub fn is_conditional(&self) -> bool {
        self.headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(IF_NONE_MATCH))
    }
}

/// Counters describing how the cache was used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u32,
    /// Lookups that found nothing
    pub misses: u32,
    /// Requests answered with 304 Not Modified
    pub revalidated: u32,
    /// Fresh responses written to the cache
    pub stored: u32,
}

impl CacheStats {
    /// Share of responses served from cache after revalidation (0.0 to 1.0)
    pub fn revalidated_ratio(&self) -> f64 {
        let total = self.revalidated + self.stored;
        if total == 0 {
            0.0
        } else {
            self.revalidated as f64 / total as f64
        }
    }
}

/// Response cache with an in-memory index over a durable store
pub struct ResponseCache {
    index: HashMap<CacheKey, CacheEntry>,
    store: Box<dyn KeyValueStore>,
    stats: CacheStats,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.index.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }
}

impl ResponseCache {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            index: HashMap::new(),
            store,
            stats: CacheStats::default(),
        }
    }

    /// Look up `url` and build the headers to send
    ///
    /// When an entry exists and carries an ETag, `If-None-Match` is appended
    /// to `headers`.
    pub fn lookup(&mut self, url: &str, headers: &[(String, String)]) -> Lookup {
        let key = CacheKey::new(url);
        let entry = self.load(&key);

        let mut headers = headers.to_vec();
        match &entry {
            Some(entry) => {
                self.stats.hits += 1;
                if let Some(etag) = &entry.etag {
                    headers.push((IF_NONE_MATCH.to_string(), etag.clone()));
                }
                debug!("Cache HIT for {}", key.as_str());
            }
            None => {
                self.stats.misses += 1;
                debug!("Cache MISS for {}", key.as_str());
            }
        }

        Lookup { entry, headers }
    }

    /// Replace the entry for `url`
    pub fn store(&mut self, url: &str, payload: serde_json::Value, etag: Option<String>) {
        let key = CacheKey::new(url);
        let entry = CacheEntry {
            etag,
            fetched_at: Utc::now(),
            payload,
        };

        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(e) = self.store.set(key.as_str(), &json) {
                    warn!("Failed to persist cached response: {}", e);
                }
            }
            Err(e) => debug!("Failed to encode cache entry: {}", e),
        }

        self.index.insert(key, entry);
        self.stats.stored += 1;
    }

    /// Record that the server confirmed a cached entry with 304
    pub fn record_not_modified(&mut self) {
        self.stats.revalidated += 1;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of entries loaded into memory
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn load(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        if let Some(entry) = self.index.get(key) {
            return Some(entry.clone());
        }

        let raw = match self.store.get(key.as_str()) {
            Ok(raw) => raw?,
            Err(e) => {
                debug!("Failed to read cached response: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => {
                self.index.insert(key.clone(), entry.clone());
                Some(entry)
            }
            Err(e) => {
                debug!("Ignoring undecodable cache entry {}: {}", key.as_str(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorageError;
    use serde_json::json;

    /// Store whose every operation fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&mut self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Corrupt(
                serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
            ))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                path: "/dev/full".into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn base_headers() -> RequestHeaders {
        vec![("Accept".to_string(), "application/json".to_string())]
    }

    #[test]
    fn test_lookup_miss_keeps_headers() {
        let mut cache = ResponseCache::default();
        let lookup = cache.lookup("https://api.github.com/repos/a/b", &base_headers());

        assert!(lookup.entry.is_none());
        assert!(!lookup.is_conditional());
        assert_eq!(lookup.headers, base_headers());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_lookup_adds_validator() {
        let mut cache = ResponseCache::default();
        cache.store(
            "https://api.github.com/repos/a/b",
            json!({"name": "b"}),
            Some("\"etag-1\"".to_string()),
        );

        let lookup = cache.lookup("https://api.github.com/repos/a/b", &base_headers());

        assert_eq!(lookup.entry.unwrap().payload, json!({"name": "b"}));
        assert!(lookup.headers.contains(&(
            IF_NONE_MATCH.to_string(),
            "\"etag-1\"".to_string()
        )));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut cache = ResponseCache::default();
        cache.store(
            "https://api.github.com/repos/Owner/Repo",
            json!(1),
            Some("e".to_string()),
        );

        let lookup = cache.lookup("https://API.github.com/repos/owner/repo", &[]);
        assert!(lookup.entry.is_some());
        assert!(lookup.is_conditional());
    }

    #[test]
    fn test_entry_without_etag_is_not_conditional() {
        let mut cache = ResponseCache::default();
        cache.store("https://api.github.com/x", json!([]), None);

        let lookup = cache.lookup("https://api.github.com/x", &[]);
        assert!(lookup.entry.is_some());
        assert!(!lookup.is_conditional());
    }

    #[test]
    fn test_store_replaces_whole_entry() {
        let mut cache = ResponseCache::default();
        cache.store(
            "https://api.github.com/x",
            json!({"a": 1, "b": 2}),
            Some("old".to_string()),
        );
        cache.store("https://api.github.com/x", json!({"a": 3}), None);

        let entry = cache.lookup("https://api.github.com/x", &[]).entry.unwrap();
        assert_eq!(entry.payload, json!({"a": 3}));
        assert!(entry.etag.is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entries_are_read_back_from_store() {
        let mut store = MemoryStore::new();
        let entry = CacheEntry {
            etag: Some("abc".to_string()),
            fetched_at: Utc::now(),
            payload: json!({"commits": []}),
        };
        store
            .set(
                "https://api.github.com/compare",
                &serde_json::to_string(&entry).unwrap(),
            )
            .unwrap();

        let mut cache = ResponseCache::new(Box::new(store));
        let lookup = cache.lookup("https://api.github.com/Compare", &[]);

        assert_eq!(lookup.entry, Some(entry));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_broken_store_degrades_to_memory() {
        let mut cache = ResponseCache::new(Box::new(BrokenStore));

        assert!(cache.lookup("https://api.github.com/x", &[]).entry.is_none());

        cache.store("https://api.github.com/x", json!("v"), Some("e".to_string()));
        let lookup = cache.lookup("https://api.github.com/x", &[]);
        assert_eq!(lookup.entry.unwrap().payload, json!("v"));
    }

    #[test]
    fn test_revalidated_ratio() {
        let mut cache = ResponseCache::default();
        assert_eq!(cache.stats().revalidated_ratio(), 0.0);

        cache.store("https://api.github.com/x", json!(1), None);
        cache.record_not_modified();
        cache.record_not_modified();
        cache.record_not_modified();

        assert!((cache.stats().revalidated_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
