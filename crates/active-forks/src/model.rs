//! Rows of the fork table

use crate::diff::DiffCell;
use forks_client::RepositorySummary;

/// A repository row with its comparison results
///
/// `ahead` and `behind` stay `None` until computed, and also when the
/// comparison was not found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkSummary {
    pub repo: RepositorySummary,
    pub ahead: Option<DiffCell>,
    pub behind: Option<DiffCell>,
}

impl ForkSummary {
    /// A fork whose diffs are not computed yet
    pub fn new(repo: RepositorySummary) -> Self {
        Self {
            repo,
            ahead: None,
            behind: None,
        }
    }

    /// The origin row, which is trivially level with itself
    pub fn origin(repo: RepositorySummary) -> Self {
        Self {
            repo,
            ahead: Some(DiffCell::zero()),
            behind: Some(DiffCell::zero()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.repo.owner.login
    }

    /// Label of the ahead cell, empty when unset
    pub fn ahead_label(&self) -> &str {
        self.ahead.as_ref().map_or("", DiffCell::label)
    }

    /// Label of the behind cell, empty when unset
    pub fn behind_label(&self) -> &str {
        self.behind.as_ref().map_or("", DiffCell::label)
    }

    /// `+` when the repository changed after it was created, `-` otherwise
    pub fn edited_label(&self) -> &'static str {
        if self.repo.is_edited() {
            "+"
        } else {
            "-"
        }
    }

    /// Whether neither direction has a value
    pub fn is_unset(&self) -> bool {
        self.ahead.is_none() && self.behind.is_none()
    }
}
