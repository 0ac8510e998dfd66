//! User-facing status messages
//!
//! The API client reports request failures here as they happen, in
//! addition to returning them to the caller.

use serde::Serialize;
use tokio::sync::mpsc;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Danger,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Danger,
            text: text.into(),
        }
    }
}

/// Receiver of status messages
pub trait MessageSink: Send + Sync {
    fn report(&self, message: StatusMessage);
}

impl MessageSink for mpsc::UnboundedSender<StatusMessage> {
    fn report(&self, message: StatusMessage) {
        // A closed channel means nobody is listening any more
        let _ = self.send(message);
    }
}
