//! GitHub API data transfer objects
//!
//! Only the fields this crate needs are declared; serde drops the rest of
//! each response, which keeps the cached payloads small.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest commit message kept in a digest, in characters
pub const MESSAGE_LIMIT: usize = 150;

/// Length of the abbreviated commit hash
pub const SHORT_SHA_LEN: usize = 6;

/// Owner of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// A repository or fork, trimmed to the fields shown in the fork table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// e.g. "octocat/Hello-World"
    pub full_name: String,

    /// Repository name without owner
    pub name: String,

    pub owner: Owner,

    pub default_branch: String,

    #[serde(default)]
    pub stargazers_count: u64,

    /// Number of forks of this repository
    #[serde(default)]
    pub forks: u64,

    #[serde(default)]
    pub open_issues_count: u64,

    /// Size in kilobytes as reported by GitHub
    #[serde(default)]
    pub size: u64,

    /// Last push, absent for repositories that were never pushed to
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RepositorySummary {
    /// Whether the repository was pushed to or updated at least a minute
    /// after it was created
    ///
    /// A fork that was never touched after forking reports `false`, as does
    /// a repository without a creation time.
    pub fn is_edited(&self) -> bool {
        let Some(created) = self.created_at else {
            return false;
        };
        [self.pushed_at, self.updated_at]
            .into_iter()
            .flatten()
            .any(|at| (at - created).num_minutes() > 0)
    }
}

/// A commit, trimmed for the diff summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDigest {
    /// Abbreviated hash
    pub sha: String,

    /// GitHub login of the author, if the commit is linked to an account
    pub author_login: Option<String>,

    /// Author date
    pub date: Option<DateTime<Utc>>,

    /// Message on a single line, cut to `MESSAGE_LIMIT` characters
    pub message: String,
}

/// `GET /repos/{owner}/{repo}/compare/{base}...{head}` as received
#[derive(Debug, Clone, Deserialize)]
pub struct RawComparison {
    #[serde(default)]
    pub commits: Vec<RawCommit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub commit: RawCommitDetail,
    #[serde(default)]
    pub author: Option<Owner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitDetail {
    #[serde(default)]
    pub author: Option<RawGitAuthor>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGitAuthor {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Shrink a comparison to the commit digests
pub fn shrink_comparison(raw: RawComparison) -> Vec<CommitDigest> {
    raw.commits.into_iter().map(shrink_commit).collect()
}

fn shrink_commit(raw: RawCommit) -> CommitDigest {
    CommitDigest {
        sha: raw.sha.chars().take(SHORT_SHA_LEN).collect(),
        author_login: raw.author.map(|owner| owner.login),
        date: raw.commit.author.and_then(|author| author.date),
        message: single_line(&raw.commit.message, MESSAGE_LIMIT),
    }
}

/// Replace line breaks with spaces and cut to `limit` characters
pub fn single_line(text: &str, limit: usize) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(limit)
        .collect()
}
