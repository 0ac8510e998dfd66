//! Run options chosen by the user
//!
//! Read once at the start of a run and immutable for its duration.

use serde::{Deserialize, Serialize};

/// Options controlling one comparison run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Treat forks with the same size as identical
    #[serde(default = "default_true")]
    pub compare_by_size: bool,

    /// Treat forks with the same last-push timestamp as identical
    #[serde(default = "default_true")]
    pub compare_by_push_date: bool,

    /// Upper bound on the number of forks fetched
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_records() -> usize {
    100
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            compare_by_size: true,
            compare_by_push_date: true,
            max_records: default_max_records(),
        }
    }
}

impl RunOptions {
    /// Whether any similarity attribute is enabled
    pub fn deduplicates(&self) -> bool {
        self.compare_by_size || self.compare_by_push_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RunOptions::default();
        assert!(options.compare_by_size);
        assert!(options.compare_by_push_date);
        assert_eq!(options.max_records, 100);
        assert!(options.deduplicates());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let options: RunOptions = serde_json::from_str(r#"{"max_records": 25}"#).unwrap();
        assert_eq!(options.max_records, 25);
        assert!(options.compare_by_size);
    }

    #[test]
    fn test_deduplicates_requires_an_attribute() {
        let options = RunOptions {
            compare_by_size: false,
            compare_by_push_date: false,
            max_records: 10,
        };
        assert!(!options.deduplicates());
    }
}
