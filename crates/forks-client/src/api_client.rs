//! Quota-aware API client with ETag revalidation
//!
//! Every GET goes through [`ApiClient::request`]: the response cache supplies
//! the `If-None-Match` validator, a 304 answers from the cached payload, and
//! fresh responses are shrunk before they are cached and returned.

use crate::client::{CacheMode, ForksApi};
use crate::error::RequestError;
use crate::messages::{MessageSink, StatusMessage};
use crate::rate::{QuotaState, RateTracker};
use crate::transport::{HttpResponse, HttpTransport};
use crate::types::{shrink_comparison, CommitDigest, RepositorySummary};
use async_trait::async_trait;
use forks_cache::{CacheEntry, CacheStats, RequestHeaders, ResponseCache};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Default REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github+json";

/// API client over an [`HttpTransport`]
///
/// # Example
///
/// ```rust,ignore
/// use forks_cache::ResponseCache;
/// use forks_client::{ApiClient, OctocrabTransport};
/// use std::sync::{Arc, Mutex};
///
/// let transport = OctocrabTransport::build("https://api.github.com")?;
/// let cache = Arc::new(Mutex::new(ResponseCache::default()));
/// let client = ApiClient::new(transport, cache).with_token(Some("ghp_...".into()));
/// ```
pub struct ApiClient<T: HttpTransport> {
    transport: T,
    base_url: String,
    token: Option<String>,
    cache: Arc<Mutex<ResponseCache>>,
    rate: Arc<Mutex<RateTracker>>,
    mode: CacheMode,
    timeout: Option<Duration>,
    messages: Option<Arc<dyn MessageSink>>,
}

impl<T: HttpTransport> std::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .field("mode", &self.mode)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<T: HttpTransport> ApiClient<T> {
    /// Create a client with a shared response cache
    pub fn new(transport: T, cache: Arc<Mutex<ResponseCache>>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            cache,
            rate: Arc::new(Mutex::new(RateTracker::new())),
            mode: CacheMode::default(),
            timeout: None,
            messages: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Token sent as bearer credentials; empty tokens are ignored
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sink receiving a `danger` message for every failed request
    pub fn with_messages(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.messages = Some(sink);
        self
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.mode
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `route`, returning the shrunk payload or `None` for 404
    ///
    /// `shrink` runs on fresh responses only; a 304 answers with the
    /// payload stored by an earlier call.
    pub async fn request<R, P, F>(&self, route: &str, shrink: F) -> Result<Option<P>, RequestError>
    where
        R: DeserializeOwned,
        P: Serialize + DeserializeOwned + Send,
        F: FnOnce(R) -> P + Send,
    {
        let url = self.url(route);
        match self.fetch(&url, shrink).await {
            Ok(payload) => Ok(payload),
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    async fn fetch<R, P, F>(&self, url: &str, shrink: F) -> Result<Option<P>, RequestError>
    where
        R: DeserializeOwned,
        P: Serialize + DeserializeOwned + Send,
        F: FnOnce(R) -> P + Send,
    {
        let base_headers = self.base_headers();
        let (cached, headers) = if self.mode.should_read() {
            let lookup = self.cache().lookup(url, &base_headers);
            (lookup.entry, lookup.headers)
        } else {
            (None, base_headers)
        };

        let response = self.send(url, &headers).await?;

        match response.status {
            304 => self.not_modified(url, cached).map(Some),
            404 => {
                debug!("GET {} -> 404, resource absent", url);
                Ok(None)
            }
            _ if !response.is_success() => Err(status_error(url, &response)),
            _ => {
                self.rate().observe(&response.headers);

                let raw: R = serde_json::from_str(&response.body).map_err(|source| {
                    RequestError::Decode {
                        url: url.to_string(),
                        source,
                    }
                })?;
                let payload = shrink(raw);

                if self.mode.should_write() {
                    match serde_json::to_value(&payload) {
                        Ok(value) => {
                            let etag = response.header("etag").map(str::to_string);
                            self.cache().store(url, value, etag);
                        }
                        Err(e) => debug!("Failed to encode payload for {}: {}", url, e),
                    }
                }

                Ok(Some(payload))
            }
        }
    }

    fn not_modified<P: DeserializeOwned>(
        &self,
        url: &str,
        cached: Option<CacheEntry>,
    ) -> Result<P, RequestError> {
        let entry = cached.ok_or_else(|| RequestError::NotModifiedWithoutEntry {
            url: url.to_string(),
        })?;
        debug!("GET {} -> 304, using cached payload", url);
        self.cache().record_not_modified();

        serde_json::from_value(entry.payload).map_err(|source| RequestError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn send(&self, url: &str, headers: &RequestHeaders) -> Result<HttpResponse, RequestError> {
        let request = self.transport.get(url, headers);
        let result = match self.timeout {
            Some(timeout) => {
                tokio::time::timeout(timeout, request)
                    .await
                    .map_err(|_| RequestError::Timeout {
                        url: url.to_string(),
                        seconds: timeout.as_secs(),
                    })?
            }
            None => request.await,
        };

        result.map_err(|e| RequestError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn report(&self, err: &RequestError) {
        warn!("Request failed: {}", err);
        if let Some(sink) = &self.messages {
            sink.report(StatusMessage::danger(err.user_message()));
        }
    }

    fn base_headers(&self) -> RequestHeaders {
        let mut headers = vec![("Accept".to_string(), ACCEPT.to_string())];
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        headers
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn rate(&self) -> MutexGuard<'_, RateTracker> {
        self.rate.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn status_error(url: &str, response: &HttpResponse) -> RequestError {
    RequestError::Status {
        url: url.to_string(),
        status: response.status,
        status_text: response.status_text.clone(),
    }
}

#[async_trait]
impl<T: HttpTransport> ForksApi for ApiClient<T> {
    async fn fetch_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<RepositorySummary>, RequestError> {
        let route = format!("/repos/{}/{}", owner, name);
        self.request(&route, |repo: RepositorySummary| repo).await
    }

    async fn fetch_forks_page(
        &self,
        owner: &str,
        name: &str,
        per_page: usize,
        page: u32,
    ) -> Result<Option<Vec<RepositorySummary>>, RequestError> {
        let route = format!(
            "/repos/{}/{}/forks?sort=stargazers&per_page={}&page={}",
            owner, name, per_page, page
        );
        self.request(&route, |forks: Vec<RepositorySummary>| forks)
            .await
    }

    async fn compare(
        &self,
        owner: &str,
        name: &str,
        base: &str,
        head: &str,
    ) -> Result<Option<Vec<CommitDigest>>, RequestError> {
        let route = format!("/repos/{}/{}/compare/{}...{}", owner, name, base, head);
        self.request(&route, shrink_comparison).await
    }

    async fn refresh_limits(&self) -> Result<(), RequestError> {
        let url = self.url("/rate_limit");
        let response = self.send(&url, &self.base_headers()).await?;
        if !response.is_success() {
            return Err(status_error(&url, &response));
        }
        self.rate().observe(&response.headers);
        Ok(())
    }

    fn quota(&self) -> QuotaState {
        self.rate().current()
    }

    fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }
}
