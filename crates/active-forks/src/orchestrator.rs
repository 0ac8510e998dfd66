//! Fork comparison runs
//!
//! A run fetches the origin, pages through its forks and compares every
//! fork's default branch with the origin's in both directions. Forks are
//! processed one at a time; the two comparisons of a fork run concurrently.
//! Cancellation is checked once per fork, so an in-flight pair completes.

use crate::controller::CancelSignal;
use crate::diff::{DiffCell, DiffSign};
use crate::events::{RunEvent, RunObserver};
use crate::model::ForkSummary;
use crate::repo_ref::RepositoryRef;
use crate::similarity::Deduplicator;
use chrono::Utc;
use forks_client::{CacheStats, ForksApi, QuotaState, RepositorySummary, RequestError, Severity};
use forks_config::RunOptions;
use log::{debug, info, warn};
use thiserror::Error;

/// Default web UI used for commit links
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Why a run stopped early
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Repository {0} not found")]
    RepositoryNotFound(String),

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    Completed,
    /// Stopped by the user after `processed` forks
    Cancelled { processed: usize },
    Failed(RunError),
}

/// Everything a run produced, including partial results
#[derive(Debug)]
pub struct RunReport {
    /// The origin row, absent if it could not be fetched
    pub origin: Option<ForkSummary>,
    pub forks: Vec<ForkSummary>,
    pub outcome: RunOutcome,
    pub quota: QuotaState,
    pub cache: CacheStats,
}

impl RunReport {
    /// Display rows: the origin followed by the forks
    pub fn rows(&self) -> impl Iterator<Item = &ForkSummary> {
        self.origin.iter().chain(self.forks.iter())
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }

    pub fn error(&self) -> Option<&RunError> {
        match &self.outcome {
            RunOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Rows built so far; kept when a run fails halfway
#[derive(Debug, Default)]
struct Rows {
    origin: Option<ForkSummary>,
    forks: Vec<ForkSummary>,
}

/// Drives fork comparison runs against a [`ForksApi`]
#[derive(Debug)]
pub struct Orchestrator<A: ForksApi> {
    api: A,
    web_base_url: String,
}

impl<A: ForksApi> Orchestrator<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            web_base_url: DEFAULT_WEB_URL.to_string(),
        }
    }

    /// Base URL of the web UI the commit links point to
    pub fn with_web_base_url(mut self, url: impl Into<String>) -> Self {
        self.web_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn web_base_url(&self) -> &str {
        &self.web_base_url
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Compare every fork of `repo` with the origin
    pub async fn run(
        &self,
        repo: &RepositoryRef,
        options: &RunOptions,
        cancel: &CancelSignal,
        observer: &dyn RunObserver,
    ) -> RunReport {
        info!("Starting run for {} ({:?})", repo, options);

        let mut rows = Rows::default();
        let result = self.compare_all(repo, options, cancel, observer, &mut rows).await;
        self.finish(repo, rows, result, observer).await
    }

    /// List the forks of `repo` without comparing them
    pub async fn list_forks(
        &self,
        repo: &RepositoryRef,
        options: &RunOptions,
        observer: &dyn RunObserver,
    ) -> RunReport {
        info!("Listing forks of {}", repo);

        let mut rows = Rows::default();
        let result = self
            .fetch_rows(repo, options.max_records, observer, &mut rows)
            .await
            .map(|_| RunOutcome::Completed);
        self.finish(repo, rows, result, observer).await
    }

    async fn compare_all(
        &self,
        repo: &RepositoryRef,
        options: &RunOptions,
        cancel: &CancelSignal,
        observer: &dyn RunObserver,
        rows: &mut Rows,
    ) -> Result<RunOutcome, RunError> {
        let origin_branch = self
            .fetch_rows(repo, options.max_records, observer, rows)
            .await?;

        let mut dedup = Deduplicator::new(*options);
        let total = rows.forks.len();

        for index in 0..total {
            if cancel.is_cancelled() {
                info!("Run for {} cancelled after {} of {} forks", repo, index, total);
                return Ok(RunOutcome::Cancelled { processed: index });
            }

            let fork = &mut rows.forks[index];
            if !dedup.try_reuse(fork) {
                self.compare_fork(repo, &origin_branch, fork).await?;
                dedup.remember(fork);
            }

            observer.on_event(RunEvent::ForkUpdated {
                index,
                fork: fork.clone(),
            });
            observer.on_event(RunEvent::Progress {
                index: index + 1,
                total,
            });
            observer.on_event(RunEvent::Quota(self.quota_line()));
        }

        info!(
            "Run for {} completed: {} forks, {} reused",
            repo,
            total,
            dedup.reused()
        );
        Ok(RunOutcome::Completed)
    }

    /// Fetch origin and forks into `rows`, returning the origin's branch
    async fn fetch_rows(
        &self,
        repo: &RepositoryRef,
        max_records: usize,
        observer: &dyn RunObserver,
        rows: &mut Rows,
    ) -> Result<String, RunError> {
        let origin = self
            .api
            .fetch_repository(repo.owner(), repo.name())
            .await?
            .ok_or_else(|| RunError::RepositoryNotFound(repo.full_name()))?;
        let origin_branch = origin.default_branch.clone();
        rows.origin = Some(ForkSummary::origin(origin.clone()));

        let forks = self.fetch_forks(repo, max_records).await?;
        rows.forks = forks.iter().cloned().map(ForkSummary::new).collect();

        observer.on_event(RunEvent::ForksListed { origin, forks });
        Ok(origin_branch)
    }

    async fn fetch_forks(
        &self,
        repo: &RepositoryRef,
        max_records: usize,
    ) -> Result<Vec<RepositorySummary>, RunError> {
        let mut forks = Vec::new();
        let mut page = 1;

        while forks.len() < max_records {
            let batch = self
                .api
                .fetch_forks_page(repo.owner(), repo.name(), max_records, page)
                .await?
                .unwrap_or_default();
            debug!("Forks page {} of {}: {} forks", page, repo, batch.len());

            if batch.is_empty() {
                break;
            }
            forks.extend(batch);
            page += 1;
        }

        forks.truncate(max_records);
        Ok(forks)
    }

    async fn compare_fork(
        &self,
        repo: &RepositoryRef,
        origin_branch: &str,
        fork: &mut ForkSummary,
    ) -> Result<(), RunError> {
        let head = format!("{}:{}", fork.owner(), fork.repo.default_branch);
        let (ahead, behind) = tokio::join!(
            self.api
                .compare(repo.owner(), repo.name(), origin_branch, &head),
            self.api
                .compare(repo.owner(), repo.name(), &head, origin_branch),
        );

        let repo_url = format!("{}/{}/{}", self.web_base_url, fork.owner(), fork.repo.name);
        fork.ahead = ahead?.map(|commits| DiffCell::from_commits(DiffSign::Ahead, &commits, &repo_url));
        fork.behind = behind?.map(|commits| DiffCell::from_commits(DiffSign::Behind, &commits, &repo_url));
        Ok(())
    }

    async fn finish(
        &self,
        repo: &RepositoryRef,
        rows: Rows,
        result: Result<RunOutcome, RunError>,
        observer: &dyn RunObserver,
    ) -> RunReport {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Run for {} failed: {}", repo, err);
                // Request errors already reached the user through the client
                if let RunError::RepositoryNotFound(_) = err {
                    observer.on_event(RunEvent::Message {
                        severity: Severity::Danger,
                        text: err.to_string(),
                    });
                }
                RunOutcome::Failed(err)
            }
        };

        if let Err(e) = self.api.refresh_limits().await {
            debug!("Failed to refresh quota: {}", e);
        }
        observer.on_event(RunEvent::Quota(self.quota_line()));
        observer.on_event(RunEvent::Finished);

        RunReport {
            origin: rows.origin,
            forks: rows.forks,
            outcome,
            quota: self.api.quota(),
            cache: self.api.cache_stats(),
        }
    }

    fn quota_line(&self) -> String {
        self.api.quota().display_at(Utc::now())
    }
}
