//! Find the active forks of a GitHub repository
//!
//! For every fork the run computes how many commits it is ahead of and
//! behind the origin's default branch, reusing results across forks that
//! look identical and staying cancellable between forks.
//!
//! # Architecture
//!
//! ```text
//! RunController ──toggle──► Orchestrator ──► ForksApi (forks-client)
//!       │                        │
//!  CancelSignal            Deduplicator, DiffCell
//!                                │
//!                          RunObserver ◄── RunEvent stream
//! ```

pub mod controller;
pub mod diff;
pub mod events;
pub mod logger;
pub mod model;
pub mod orchestrator;
pub mod repo_ref;
pub mod similarity;

pub use controller::{CancelSignal, RunController, RunRequest, RunState, Toggle};
pub use diff::{CommitLine, DiffCell, DiffSign};
pub use events::{NoopObserver, ObserverSink, RunEvent, RunObserver};
pub use model::ForkSummary;
pub use orchestrator::{Orchestrator, RunError, RunOutcome, RunReport, DEFAULT_WEB_URL};
pub use repo_ref::{InputError, RepositoryRef};
pub use similarity::{Deduplicator, KeyPart, SimilarityKey};
