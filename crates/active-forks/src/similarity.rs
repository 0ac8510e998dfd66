//! Similarity deduplication
//!
//! Forks with the same size and last push are almost always untouched
//! copies of the same commit, so their diffs are computed once.

use crate::diff::DiffCell;
use crate::model::ForkSummary;
use chrono::{DateTime, Utc};
use forks_client::RepositorySummary;
use forks_config::RunOptions;
use log::debug;
use std::collections::HashMap;

/// One attribute taking part in a similarity key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Size(u64),
    PushedAt(Option<DateTime<Utc>>),
}

/// Attributes two forks must share to be treated as identical
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimilarityKey(Vec<KeyPart>);

impl SimilarityKey {
    pub fn for_repo(repo: &RepositorySummary, options: &RunOptions) -> Self {
        let mut parts = Vec::with_capacity(2);
        if options.compare_by_size {
            parts.push(KeyPart::Size(repo.size));
        }
        if options.compare_by_push_date {
            parts.push(KeyPart::PushedAt(repo.pushed_at));
        }
        Self(parts)
    }

    /// An empty key never matches anything
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

/// Reuses the diffs of forks that share a similarity key
#[derive(Debug)]
pub struct Deduplicator {
    options: RunOptions,
    seen: HashMap<SimilarityKey, (Option<DiffCell>, Option<DiffCell>)>,
    reused: usize,
}

impl Deduplicator {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            seen: HashMap::new(),
            reused: 0,
        }
    }

    /// Copy the diffs of a similar, already computed fork into `fork`
    ///
    /// Returns `true` when the diffs were reused.
    pub fn try_reuse(&mut self, fork: &mut ForkSummary) -> bool {
        let key = SimilarityKey::for_repo(&fork.repo, &self.options);
        if key.is_empty() {
            return false;
        }

        match self.seen.get(&key) {
            Some((ahead, behind)) => {
                debug!("Reusing diffs for {}", fork.repo.full_name);
                fork.ahead = ahead.clone();
                fork.behind = behind.clone();
                self.reused += 1;
                true
            }
            None => false,
        }
    }

    /// Remember the diffs of a computed fork
    pub fn remember(&mut self, fork: &ForkSummary) {
        let key = SimilarityKey::for_repo(&fork.repo, &self.options);
        if key.is_empty() {
            return;
        }
        self.seen
            .insert(key, (fork.ahead.clone(), fork.behind.clone()));
    }

    /// Number of forks that reused another fork's diffs
    pub fn reused(&self) -> usize {
        self.reused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffSign;
    use chrono::TimeZone;
    use forks_client::{CommitDigest, Owner};

    fn fork(login: &str, size: u64, pushed_day: u32) -> ForkSummary {
        ForkSummary::new(RepositorySummary {
            full_name: format!("{}/project", login),
            name: "project".to_string(),
            owner: Owner {
                login: login.to_string(),
            },
            default_branch: "main".to_string(),
            stargazers_count: 0,
            forks: 0,
            open_issues_count: 0,
            size,
            pushed_at: Utc.with_ymd_and_hms(2024, 1, pushed_day, 0, 0, 0).single(),
            created_at: None,
            updated_at: None,
        })
    }

    fn computed(mut fork: ForkSummary) -> ForkSummary {
        let commits = vec![CommitDigest {
            sha: "abc123".to_string(),
            author_login: None,
            date: None,
            message: "change".to_string(),
        }];
        fork.ahead = Some(DiffCell::from_commits(DiffSign::Ahead, &commits, "https://github.com/a/b"));
        fork.behind = Some(DiffCell::zero());
        fork
    }

    fn options(by_size: bool, by_push_date: bool) -> RunOptions {
        RunOptions {
            compare_by_size: by_size,
            compare_by_push_date: by_push_date,
            max_records: 100,
        }
    }

    #[test]
    fn test_key_parts_follow_options() {
        let repo = fork("a", 10, 1).repo;
        assert_eq!(SimilarityKey::for_repo(&repo, &options(true, true)).parts().len(), 2);
        assert_eq!(
            SimilarityKey::for_repo(&repo, &options(true, false)).parts(),
            &[KeyPart::Size(10)]
        );
        assert!(SimilarityKey::for_repo(&repo, &options(false, false)).is_empty());
    }

    #[test]
    fn test_identical_forks_reuse_diffs() {
        let mut dedup = Deduplicator::new(options(true, true));
        let first = computed(fork("a", 10, 1));
        dedup.remember(&first);

        let mut second = fork("b", 10, 1);
        assert!(dedup.try_reuse(&mut second));
        assert_eq!(second.ahead, first.ahead);
        assert_eq!(second.behind, first.behind);
        assert_eq!(dedup.reused(), 1);
    }

    #[test]
    fn test_different_push_date_is_not_similar() {
        let mut dedup = Deduplicator::new(options(true, true));
        dedup.remember(&computed(fork("a", 10, 1)));

        let mut other = fork("b", 10, 2);
        assert!(!dedup.try_reuse(&mut other));
        assert!(other.is_unset());
    }

    #[test]
    fn test_size_only_ignores_push_date() {
        let mut dedup = Deduplicator::new(options(true, false));
        dedup.remember(&computed(fork("a", 10, 1)));

        let mut other = fork("b", 10, 2);
        assert!(dedup.try_reuse(&mut other));
    }

    #[test]
    fn test_disabled_options_never_reuse() {
        let mut dedup = Deduplicator::new(options(false, false));
        dedup.remember(&computed(fork("a", 10, 1)));

        let mut same = fork("b", 10, 1);
        assert!(!dedup.try_reuse(&mut same));
        assert_eq!(dedup.reused(), 0);
    }
}
