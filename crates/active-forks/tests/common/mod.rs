#![allow(dead_code)]

use active_forks::{Orchestrator, RunEvent};
use forks_client::transport::mock::{json_response, status_response, with_header, MockTransport};
use forks_client::{ApiClient, HttpResponse, ResponseCache};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const API: &str = "https://api.github.com";
pub const OWNER: &str = "octocat";
pub const NAME: &str = "project";

pub type TestOrchestrator = Orchestrator<ApiClient<MockTransport>>;

pub fn orchestrator(transport: &MockTransport) -> TestOrchestrator {
    let cache = Arc::new(Mutex::new(ResponseCache::default()));
    Orchestrator::new(ApiClient::new(transport.clone(), cache))
}

pub fn repo_json(owner: &str, size: u64, minute: u32) -> Value {
    json!({
        "full_name": format!("{}/{}", owner, NAME),
        "name": NAME,
        "owner": {"login": owner},
        "default_branch": "main",
        "stargazers_count": 1,
        "forks": 0,
        "open_issues_count": 0,
        "size": size,
        "pushed_at": format!("2024-01-01T00:{:02}:00Z", minute)
    })
}

pub fn fork_owner(i: usize) -> String {
    format!("fork{}", i)
}

/// Forks with distinct size and push time
pub fn distinct_forks(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| repo_json(&fork_owner(i), 100 + i as u64, (i % 60) as u32))
        .collect()
}

/// Forks that all look identical
pub fn identical_forks(count: usize) -> Vec<Value> {
    (0..count).map(|i| repo_json(&fork_owner(i), 42, 7)).collect()
}

pub fn commits(count: usize) -> Value {
    let commits: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "sha": format!("{:040x}", i + 1),
                "commit": {
                    "author": {"date": "2024-02-01T10:00:00Z"},
                    "message": format!("commit {}", i)
                },
                "author": {"login": "dev"}
            })
        })
        .collect();
    json!({ "commits": commits })
}

pub fn origin_url() -> String {
    format!("{}/repos/{}/{}", API, OWNER, NAME)
}

pub fn forks_url(per_page: usize, page: u32) -> String {
    format!(
        "{}/repos/{}/{}/forks?sort=stargazers&per_page={}&page={}",
        API, OWNER, NAME, per_page, page
    )
}

pub fn ahead_url(fork_owner: &str) -> String {
    format!("{}/repos/{}/{}/compare/main...{}:main", API, OWNER, NAME, fork_owner)
}

pub fn behind_url(fork_owner: &str) -> String {
    format!("{}/repos/{}/{}/compare/{}:main...main", API, OWNER, NAME, fork_owner)
}

pub fn rate_limit_url() -> String {
    format!("{}/rate_limit", API)
}

pub fn etagged(response: HttpResponse, etag: &str) -> HttpResponse {
    with_header(response, "ETag", etag)
}

/// Register origin, one page of forks, an empty second page and the
/// quota endpoint
pub fn register_listing(transport: &MockTransport, forks: &[Value], max_records: usize) {
    transport.push_response(origin_url(), json_response(repo_json(OWNER, 500, 0)));
    transport.push_response(forks_url(max_records, 1), json_response(json!(forks)));
    transport.push_response(forks_url(max_records, 2), json_response(json!([])));
    register_rate_limit(transport);
}

pub fn register_rate_limit(transport: &MockTransport) {
    let response = with_header(json_response(json!({"resources": {}})), "x-ratelimit-limit", "60");
    let response = with_header(response, "x-ratelimit-remaining", "55");
    transport.push_response(rate_limit_url(), response);
}

/// Register both comparisons of a fork
pub fn register_compare(transport: &MockTransport, owner: &str, ahead: usize, behind: usize) {
    transport.push_response(ahead_url(owner), json_response(commits(ahead)));
    transport.push_response(behind_url(owner), json_response(commits(behind)));
}

pub fn not_found() -> HttpResponse {
    status_response(404, "Not Found")
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
