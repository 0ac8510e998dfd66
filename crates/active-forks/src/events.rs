//! Events emitted while a run progresses
//!
//! The front-end subscribes with a [`RunObserver`]; an unbounded channel
//! sender is the usual one.

use crate::model::ForkSummary;
use forks_client::{MessageSink, RepositorySummary, Severity, StatusMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Something the display should reflect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The origin and the fork list are known; diffs are still unset
    ForksListed {
        origin: RepositorySummary,
        forks: Vec<RepositorySummary>,
    },

    /// A fork's diffs changed; `index` is its position in the fork list
    ForkUpdated { index: usize, fork: ForkSummary },

    /// `index` of `total` forks processed
    Progress { index: usize, total: usize },

    /// Current quota line
    Quota(String),

    /// Message for the user
    Message { severity: Severity, text: String },

    /// The run is over
    Finished,
}

impl From<StatusMessage> for RunEvent {
    fn from(message: StatusMessage) -> Self {
        RunEvent::Message {
            severity: message.severity,
            text: message.text,
        }
    }
}

/// Receiver of run events
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: RunEvent);
}

impl RunObserver for mpsc::UnboundedSender<RunEvent> {
    fn on_event(&self, event: RunEvent) {
        let _ = self.send(event);
    }
}

/// Observer that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_event(&self, _event: RunEvent) {}
}

/// Forwards API client messages to a run observer
pub struct ObserverSink {
    observer: Arc<dyn RunObserver>,
}

impl ObserverSink {
    pub fn new(observer: Arc<dyn RunObserver>) -> Self {
        Self { observer }
    }
}

impl MessageSink for ObserverSink {
    fn report(&self, message: StatusMessage) {
        self.observer.on_event(message.into());
    }
}
