//! Response cache for GitHub API requests
//!
//! Responses are keyed by request URL (case-insensitive) and carry the ETag
//! the server sent with them, so the next request for the same URL can be
//! made conditional with `If-None-Match`. A `304 Not Modified` answer does
//! not count against the API quota.
//!
//! The in-memory index is mirrored into a [`KeyValueStore`]. Durable storage
//! is best effort: when it fails the cache keeps working from memory.
//!
//! There is no size bound and no eviction. Entries live until the backing
//! store is cleared by hand.

pub mod cache;
pub mod store;

pub use cache::{
    CacheEntry, CacheKey, CacheStats, Lookup, RequestHeaders, ResponseCache, IF_NONE_MATCH,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
