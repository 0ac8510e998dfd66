//! API quota bookkeeping
//!
//! Tracks `x-ratelimit-*` headers. Nothing here throttles requests; the
//! state is only displayed.

use crate::transport::header_get;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Last known API quota
///
/// Every field is `None` until a response carrying it has been seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuotaState {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl QuotaState {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Quota line for display, e.g. `Quota: left 4998 / 5000, reset in 42 minutes`
    pub fn display_at(&self, now: DateTime<Utc>) -> String {
        let reset = self
            .reset_at
            .map(|at| relative_time(at, now))
            .unwrap_or_else(|| "?".to_string());
        format!(
            "Quota: left {} / {}, reset {}",
            or_unknown(self.remaining),
            or_unknown(self.limit),
            reset
        )
    }
}

impl fmt::Display for QuotaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_at(Utc::now()))
    }
}

fn or_unknown(value: Option<u32>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (at - now).num_seconds();
    let magnitude = seconds.unsigned_abs();

    let amount = if magnitude < 45 {
        "a few seconds".to_string()
    } else if magnitude < 90 {
        "a minute".to_string()
    } else if magnitude < 45 * 60 {
        format!("{} minutes", (magnitude + 30) / 60)
    } else if magnitude < 90 * 60 {
        "an hour".to_string()
    } else {
        format!("{} hours", (magnitude + 1800) / 3600)
    };

    if seconds >= 0 {
        format!("in {}", amount)
    } else {
        format!("{} ago", amount)
    }
}

/// Quota tracker fed from response headers
#[derive(Debug, Default, Clone)]
pub struct RateTracker {
    state: QuotaState,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from response headers
    ///
    /// Headers that are missing or unparseable leave their field unchanged.
    pub fn observe(&mut self, headers: &[(String, String)]) {
        if let Some(limit) = parse_header::<u32>(headers, LIMIT_HEADER) {
            self.state.limit = Some(limit);
        }
        if let Some(remaining) = parse_header::<u32>(headers, REMAINING_HEADER) {
            self.state.remaining = Some(remaining);
        }
        if let Some(reset) = parse_header::<i64>(headers, RESET_HEADER)
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        {
            self.state.reset_at = Some(reset);
        }
    }

    pub fn current(&self) -> QuotaState {
        self.state
    }
}

fn parse_header<T: std::str::FromStr>(headers: &[(String, String)], name: &str) -> Option<T> {
    header_get(headers, name).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn headers(limit: &str, remaining: &str, reset: &str) -> Vec<(String, String)> {
        vec![
            ("X-RateLimit-Limit".to_string(), limit.to_string()),
            ("X-RateLimit-Remaining".to_string(), remaining.to_string()),
            ("X-RateLimit-Reset".to_string(), reset.to_string()),
        ]
    }

    #[test]
    fn test_unknown_before_first_observation() {
        let tracker = RateTracker::new();
        let now = Utc::now();
        assert_eq!(
            tracker.current().display_at(now),
            "Quota: left ? / ?, reset ?"
        );
    }

    #[test]
    fn test_observe_headers() {
        let mut tracker = RateTracker::new();
        tracker.observe(&headers("5000", "4999", "1700000000"));

        let state = tracker.current();
        assert_eq!(state.limit, Some(5000));
        assert_eq!(state.remaining, Some(4999));
        assert_eq!(state.reset_at, Utc.timestamp_opt(1_700_000_000, 0).single());
        assert!(!state.is_exhausted());
    }

    #[test]
    fn test_unparseable_values_are_ignored() {
        let mut tracker = RateTracker::new();
        tracker.observe(&headers("60", "10", "1700000000"));
        tracker.observe(&headers("sixty", "0", ""));

        let state = tracker.current();
        assert_eq!(state.limit, Some(60));
        assert_eq!(state.remaining, Some(0));
        assert!(state.is_exhausted());
    }

    #[test]
    fn test_display_relative_reset() {
        let now = Utc::now();
        let state = QuotaState {
            limit: Some(60),
            remaining: Some(12),
            reset_at: Some(now + Duration::minutes(42)),
        };
        assert_eq!(
            state.display_at(now),
            "Quota: left 12 / 60, reset in 42 minutes"
        );
    }

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(relative_time(now + Duration::seconds(10), now), "in a few seconds");
        assert_eq!(relative_time(now + Duration::seconds(70), now), "in a minute");
        assert_eq!(relative_time(now - Duration::minutes(10), now), "10 minutes ago");
        assert_eq!(relative_time(now + Duration::minutes(60), now), "in an hour");
        assert_eq!(relative_time(now + Duration::hours(5), now), "in 5 hours");
    }
}
