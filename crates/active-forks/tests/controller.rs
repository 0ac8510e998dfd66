mod common;

use active_forks::{RunController, RunEvent, RunRequest, RunState, Toggle};
use common::*;
use forks_client::transport::mock::MockTransport;
use forks_client::Severity;
use forks_config::{RunOptions, Settings};
use tokio::sync::mpsc;

fn request(repository: &str) -> RunRequest {
    RunRequest {
        repository: repository.to_string(),
        token: Some("ghp_remembered".to_string()),
        options: RunOptions {
            compare_by_size: false,
            compare_by_push_date: true,
            max_records: 10,
        },
        list_only: false,
    }
}

#[tokio::test]
async fn test_invalid_input_starts_nothing() {
    let transport = MockTransport::new();
    let orchestrator = orchestrator(&transport);
    let controller = RunController::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<RunEvent>();

    let toggle = controller
        .toggle(&request("not a repository"), &orchestrator, &tx)
        .await;

    assert!(matches!(toggle, Toggle::Rejected(_)));
    assert_eq!(transport.request_count(), 0);
    assert_eq!(controller.state(), RunState::Idle);
    assert_eq!(
        drain(&mut rx),
        vec![RunEvent::Message {
            severity: Severity::Danger,
            text: "Invalid GitHub repository! Format is <username>/<repo>".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_non_ascii_owner_starts_nothing() {
    let transport = MockTransport::new();
    let orchestrator = orchestrator(&transport);
    let controller = RunController::new();

    let toggle = controller
        .toggle(&request("müller/project"), &orchestrator, &active_forks::NoopObserver)
        .await;

    assert!(matches!(toggle, Toggle::Rejected(_)));
    assert_eq!(transport.request_count(), 0);
    assert!(controller.is_idle());
}

#[tokio::test]
async fn test_toggle_while_running_requests_stop() {
    let transport = MockTransport::new();
    let orchestrator = orchestrator(&transport);
    let controller = RunController::new();
    controller.begin();

    let toggle = controller
        .toggle(&request("octocat/project"), &orchestrator, &active_forks::NoopObserver)
        .await;

    assert!(matches!(toggle, Toggle::StopRequested));
    assert_eq!(controller.state(), RunState::Cancelling);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_run_start_remembers_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let transport = MockTransport::new();
    register_listing(&transport, &distinct_forks(1), 10);
    register_compare(&transport, "fork0", 1, 0);

    let orchestrator = orchestrator(&transport);
    let controller = RunController::new().with_settings_path(path.clone());

    let toggle = controller
        .toggle(
            &request("https://github.com/octocat/project.git"),
            &orchestrator,
            &active_forks::NoopObserver,
        )
        .await;

    match toggle {
        Toggle::Finished(report) => assert!(report.is_completed()),
        other => panic!("unexpected toggle result: {:?}", other),
    }
    assert!(controller.is_idle());

    let saved = Settings::load_from_path(&path);
    assert_eq!(saved.token.as_deref(), Some("ghp_remembered"));
    assert!(!saved.options.compare_by_size);
    assert_eq!(saved.options.max_records, 10);
}

#[tokio::test]
async fn test_list_only_request() {
    let transport = MockTransport::new();
    register_listing(&transport, &distinct_forks(3), 10);

    let orchestrator = orchestrator(&transport);
    let controller = RunController::new();
    let mut list = request("octocat/project");
    list.list_only = true;

    let toggle = controller
        .toggle(&list, &orchestrator, &active_forks::NoopObserver)
        .await;

    match toggle {
        Toggle::Finished(report) => {
            assert_eq!(report.rows().count(), 4);
            assert!(report.forks.iter().all(|f| f.is_unset()));
        }
        other => panic!("unexpected toggle result: {:?}", other),
    }
    assert_eq!(transport.count_matching("/compare/"), 0);
}
