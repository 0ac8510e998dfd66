//! Request errors
//!
//! A 404 is not an error: the client reports it as an absent resource.
//! Everything else that keeps a request from producing data ends up here.

use thiserror::Error;

/// Failure of a single API request
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered with a non-2xx status other than 304 and 404
    #[error("{status} {status_text}")]
    Status {
        url: String,
        status: u16,
        status_text: String,
    },

    /// The request never produced a response
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// No response arrived within the configured timeout
    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// The response body did not have the expected shape
    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered 304 for a request that carried no validator
    #[error("Server answered 304 for {url} but nothing is cached")]
    NotModifiedWithoutEntry { url: String },
}

impl RequestError {
    /// Whether the error means the API quota is used up
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RequestError::Status { status: 403 | 429, .. })
    }

    /// Text shown to the user
    pub fn user_message(&self) -> String {
        if self.is_rate_limited() {
            "Error: API rate limit exceeded".to_string()
        } else {
            format!("Error: {}", self)
        }
    }

    /// URL of the failed request
    pub fn url(&self) -> &str {
        match self {
            RequestError::Status { url, .. }
            | RequestError::Transport { url, .. }
            | RequestError::Timeout { url, .. }
            | RequestError::Decode { url, .. }
            | RequestError::NotModifiedWithoutEntry { url } => url,
        }
    }
}
