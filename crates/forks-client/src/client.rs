//! Forks API client trait and cache mode
//!
//! This module defines the `ForksApi` trait the fork comparison runs
//! against, as well as the `CacheMode` enum for controlling caching behavior.

use crate::error::RequestError;
use crate::rate::QuotaState;
use crate::types::{CommitDigest, RepositorySummary};
use async_trait::async_trait;
use forks_cache::CacheStats;

/// Cache behavior mode for the API client
///
/// Controls how the client interacts with the response cache.
/// This is set at client construction time, not per-request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// No caching - requests are never conditional and nothing is stored
    None,

    /// Write-only - send unconditional requests, but store the responses
    /// Use for "force refresh" to get fresh data while populating cache
    WriteOnly,

    /// Read-only - revalidate cached entries, but don't update them
    ReadOnly,

    /// Full caching - conditional requests and stored responses
    #[default]
    ReadWrite,
}

impl CacheMode {
    /// Should the cache be consulted before making the API call?
    pub fn should_read(&self) -> bool {
        matches!(self, CacheMode::ReadOnly | CacheMode::ReadWrite)
    }

    /// Should API responses be written to the cache?
    pub fn should_write(&self) -> bool {
        matches!(self, CacheMode::WriteOnly | CacheMode::ReadWrite)
    }
}

/// Remote operations a fork comparison run needs
///
/// Every fetch returns `Ok(None)` when the resource does not exist (404).
///
/// # Example
///
/// ```rust,ignore
/// use forks_client::ForksApi;
///
/// async fn default_branch(api: &dyn ForksApi) -> Option<String> {
///     let repo = api.fetch_repository("octocat", "Hello-World").await.ok()??;
///     Some(repo.default_branch)
/// }
/// ```
#[async_trait]
pub trait ForksApi: Send + Sync {
    /// Fetch a repository record
    async fn fetch_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<RepositorySummary>, RequestError>;

    /// Fetch one page of forks, sorted by stargazers
    ///
    /// Pages start at 1.
    async fn fetch_forks_page(
        &self,
        owner: &str,
        name: &str,
        per_page: usize,
        page: u32,
    ) -> Result<Option<Vec<RepositorySummary>>, RequestError>;

    /// Commits reachable from `head` but not from `base`
    ///
    /// `base` and `head` use the compare syntax (`branch` or `owner:branch`).
    async fn compare(
        &self,
        owner: &str,
        name: &str,
        base: &str,
        head: &str,
    ) -> Result<Option<Vec<CommitDigest>>, RequestError>;

    /// Ask the server for the current quota
    async fn refresh_limits(&self) -> Result<(), RequestError>;

    /// Last known quota
    fn quota(&self) -> QuotaState;

    /// Response cache counters
    fn cache_stats(&self) -> CacheStats;
}
