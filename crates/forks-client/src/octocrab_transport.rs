//! Octocrab-based HTTP transport
//!
//! Sends raw GET requests through octocrab so that status codes and headers
//! (ETag, rate limit) reach the API client untouched. Octocrab is built
//! without credentials: the API client sets the `Authorization` header.

use crate::transport::{HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use forks_cache::RequestHeaders;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use log::debug;
use octocrab::Octocrab;
use std::sync::Arc;

/// Transport making real API calls with octocrab
#[derive(Debug, Clone)]
pub struct OctocrabTransport {
    octocrab: Arc<Octocrab>,
    base_url: String,
}

impl OctocrabTransport {
    /// Create a transport with the given octocrab instance
    pub fn new(octocrab: Arc<Octocrab>, base_url: impl Into<String>) -> Self {
        Self {
            octocrab,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build an unauthenticated octocrab instance for `base_url`
    pub fn build(base_url: &str) -> Result<Self, TransportError> {
        let octocrab = Octocrab::builder()
            .base_uri(base_url)
            .map_err(|e| TransportError::Transport(format!("Invalid base URL: {}", e)))?
            .build()
            .map_err(|e| TransportError::Transport(e.to_string()))?;

        Ok(Self::new(Arc::new(octocrab), base_url))
    }

    /// Get a reference to the underlying octocrab instance
    pub fn octocrab(&self) -> &Octocrab {
        &self.octocrab
    }

    /// Path and query of `url` relative to the base URL octocrab knows
    fn route<'a>(&self, url: &'a str) -> &'a str {
        url.strip_prefix(self.base_url.as_str())
            .filter(|route| route.starts_with('/'))
            .unwrap_or(url)
    }
}

fn header_map(headers: &RequestHeaders) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let invalid = |reason: String| TransportError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl HttpTransport for OctocrabTransport {
    async fn get(
        &self,
        url: &str,
        headers: &RequestHeaders,
    ) -> Result<HttpResponse, TransportError> {
        let route = self.route(url);
        debug!("GET {}", route);

        let response = self
            .octocrab
            ._get_with_headers(route, Some(header_map(headers)?))
            .await
            .map_err(|e| TransportError::Transport(e.to_string()))?;

        let status = response.status();
        let response_headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let body = self
            .octocrab
            .body_to_string(response)
            .await
            .map_err(|e| TransportError::Transport(e.to_string()))?;

        debug!("GET {} -> {}", route, status.as_u16());

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: response_headers,
            body,
        })
    }
}
