//! Run controller
//!
//! A single start/stop toggle. The run state lives in a `watch` channel so
//! that a stop requested from anywhere (Ctrl-C, another task) is seen by the
//! running orchestrator at its next per-fork check.

use crate::events::{RunEvent, RunObserver};
use crate::orchestrator::{Orchestrator, RunReport};
use crate::repo_ref::{InputError, RepositoryRef};
use forks_client::{ForksApi, Severity};
use forks_config::{RunOptions, Settings};
use log::{info, warn};
use std::path::PathBuf;
use tokio::sync::watch;

/// State of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    /// Stop requested, the run has not noticed yet
    Cancelling,
}

/// Read side of the run state, polled by the orchestrator
#[derive(Debug, Clone)]
pub struct CancelSignal {
    state: watch::Receiver<RunState>,
}

impl CancelSignal {
    /// Whether the run should stop before its next fork
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow() != RunState::Running
    }
}

/// What one press of the toggle did
#[derive(Debug)]
pub enum Toggle {
    /// A run was started and ran to its end
    Finished(RunReport),
    /// A run was active; it has been asked to stop
    StopRequested,
    /// The input was not a repository; nothing was started
    Rejected(InputError),
}

/// What to run when the toggle starts a run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Free-form repository input
    pub repository: String,
    /// Token to remember for the next session
    pub token: Option<String>,
    pub options: RunOptions,
    /// List forks only, without comparisons
    pub list_only: bool,
}

/// Start/stop toggle over a single run
#[derive(Debug)]
pub struct RunController {
    state: watch::Sender<RunState>,
    settings_path: Option<PathBuf>,
}

impl Default for RunController {
    fn default() -> Self {
        Self::new()
    }
}

impl RunController {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            state,
            settings_path: None,
        }
    }

    /// Persist token and options to `path` whenever a run starts
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == RunState::Idle
    }

    /// Enter `Running` and hand out the signal for the new run
    pub fn begin(&self) -> CancelSignal {
        self.state.send_replace(RunState::Running);
        CancelSignal {
            state: self.state.subscribe(),
        }
    }

    /// Ask the active run to stop; ignored unless running
    pub fn stop(&self) -> bool {
        let requested = self.state.send_if_modified(|state| {
            if *state == RunState::Running {
                *state = RunState::Cancelling;
                true
            } else {
                false
            }
        });
        if requested {
            info!("Stop requested");
        }
        requested
    }

    /// Return to `Idle`
    pub fn finish(&self) {
        self.state.send_replace(RunState::Idle);
    }

    /// Start a run when idle, otherwise request the active run to stop
    pub async fn toggle<A: ForksApi>(
        &self,
        request: &RunRequest,
        orchestrator: &Orchestrator<A>,
        observer: &dyn RunObserver,
    ) -> Toggle {
        if !self.is_idle() {
            self.stop();
            return Toggle::StopRequested;
        }

        let parsed =
            RepositoryRef::parse_with_web_base(&request.repository, orchestrator.web_base_url());
        let repo = match parsed {
            Ok(repo) => repo,
            Err(err) => {
                observer.on_event(RunEvent::Message {
                    severity: Severity::Danger,
                    text: err.to_string(),
                });
                return Toggle::Rejected(err);
            }
        };

        let cancel = self.begin();
        self.remember(request);

        let report = if request.list_only {
            orchestrator.list_forks(&repo, &request.options, observer).await
        } else {
            orchestrator
                .run(&repo, &request.options, &cancel, observer)
                .await
        };

        self.finish();
        Toggle::Finished(report)
    }

    fn remember(&self, request: &RunRequest) {
        let Some(path) = &self.settings_path else {
            return;
        };

        let mut settings = Settings::load_from_path(path);
        settings.remember_run(request.token.as_deref(), request.options);
        if let Err(e) = settings.save_to_path(path) {
            warn!("Failed to save settings: {:#}", e);
        }
    }
}
