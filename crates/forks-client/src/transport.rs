//! HTTP transport boundary
//!
//! All network I/O goes through [`HttpTransport`]. The production
//! implementation lives in `octocrab_transport`; tests use the in-memory
//! [`mock::MockTransport`].

use async_trait::async_trait;
use forks_cache::RequestHeaders;
use thiserror::Error;

/// A response as seen by the API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: RequestHeaders,
    pub body: String,
}

impl HttpResponse {
    /// First header value matching `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("invalid request header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("no mock response registered for {url}")]
    NoMockResponse { url: String },
}

/// Transport for GET requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &RequestHeaders)
        -> Result<HttpResponse, TransportError>;
}

/// Get the first header value matching `name` (case-insensitive)
pub fn header_get<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    //! In-memory transport for unit tests: no sockets, no loopback servers.

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    /// A request the mock has seen
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRequest {
        pub url: String,
        pub headers: RequestHeaders,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            header_get(&self.headers, name)
        }
    }

    #[derive(Debug, Default)]
    struct MockTransportInner {
        routes: HashMap<String, VecDeque<HttpResponse>>,
        requests: Vec<RecordedRequest>,
    }

    /// Transport answering from canned responses
    ///
    /// Responses registered for the same URL are returned in FIFO order.
    /// The last one stays registered and answers every later request.
    #[derive(Debug, Clone, Default)]
    pub struct MockTransport {
        inner: Arc<Mutex<MockTransportInner>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, url: impl Into<String>, response: HttpResponse) {
            let mut inner = self.inner.lock().unwrap();
            inner
                .routes
                .entry(url.into())
                .or_default()
                .push_back(response);
        }

        /// Every request seen so far, in order
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.inner.lock().unwrap().requests.clone()
        }

        pub fn request_count(&self) -> usize {
            self.inner.lock().unwrap().requests.len()
        }

        /// Number of requests whose URL contains `needle`
        pub fn count_matching(&self, needle: &str) -> usize {
            self.inner
                .lock()
                .unwrap()
                .requests
                .iter()
                .filter(|r| r.url.contains(needle))
                .count()
        }

        pub fn clear_requests(&self) {
            self.inner.lock().unwrap().requests.clear();
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn get(
            &self,
            url: &str,
            headers: &RequestHeaders,
        ) -> Result<HttpResponse, TransportError> {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(RecordedRequest {
                url: url.to_string(),
                headers: headers.clone(),
            });

            let queue = inner
                .routes
                .get_mut(url)
                .ok_or_else(|| TransportError::NoMockResponse {
                    url: url.to_string(),
                })?;

            let response = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };

            response.ok_or_else(|| TransportError::NoMockResponse {
                url: url.to_string(),
            })
        }
    }

    /// 200 response with a JSON body
    pub fn json_response(body: serde_json::Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![(
                "content-type".to_string(),
                "application/json".to_string(),
            )],
            body: body.to_string(),
        }
    }

    /// Response with a status and no body
    pub fn status_response(status: u16, status_text: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Add a header to a canned response
    pub fn with_header(mut response: HttpResponse, name: &str, value: &str) -> HttpResponse {
        response.headers.push((name.to_string(), value.to_string()));
        response
    }
}
