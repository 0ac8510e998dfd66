//! GitHub REST client for fork comparisons
//!
//! This crate wraps a pluggable HTTP transport with conditional-request
//! caching and quota tracking. The fork comparison run only sees the
//! `ForksApi` trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                ForksApi trait                   │
//! │  - fetch_repository() / fetch_forks_page()      │
//! │  - compare()                                    │
//! │  - refresh_limits() / quota()                   │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//!              ┌─────────────────────┐     ┌───────────────┐
//!              │ ApiClient           │────►│ ResponseCache │
//!              │ (ETag + quota)      │     │ (forks-cache) │
//!              └─────────────────────┘     └───────────────┘
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌──────────────────┐         ┌─────────────────────┐
//! │ OctocrabTransport│         │ MockTransport       │
//! │ (network)        │         │ (tests, `mock`)     │
//! └──────────────────┘         └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use forks_cache::ResponseCache;
//! use forks_client::{ApiClient, ForksApi, OctocrabTransport};
//! use std::sync::{Arc, Mutex};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = OctocrabTransport::build("https://api.github.com")?;
//! let cache = Arc::new(Mutex::new(ResponseCache::default()));
//! let client = ApiClient::new(transport, cache);
//!
//! let repo = client.fetch_repository("octocat", "Hello-World").await?;
//! println!("{:?} / {}", repo.map(|r| r.default_branch), client.quota());
//! # Ok(())
//! # }
//! ```

pub mod api_client;
pub mod client;
pub mod error;
pub mod messages;
pub mod octocrab_transport;
pub mod rate;
pub mod token;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use api_client::{ApiClient, DEFAULT_API_URL};
pub use client::{CacheMode, ForksApi};
pub use error::RequestError;
pub use messages::{MessageSink, Severity, StatusMessage};
pub use octocrab_transport::OctocrabTransport;
pub use rate::{QuotaState, RateTracker};
pub use token::TokenResolver;
pub use transport::{header_get, HttpResponse, HttpTransport, TransportError};
pub use types::{CommitDigest, Owner, RepositorySummary};

// Re-export cache types so callers don't need a direct dependency
pub use forks_cache::{CacheStats, JsonFileStore, MemoryStore, ResponseCache};
