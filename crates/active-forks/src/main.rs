use active_forks::{
    logger, ForkSummary, ObserverSink, Orchestrator, RunController, RunEvent, RunObserver,
    RunOutcome, RunReport, RunRequest, Toggle,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use forks_cache::{JsonFileStore, KeyValueStore, MemoryStore, ResponseCache};
use forks_client::{ApiClient, CacheMode, OctocrabTransport, Severity, TokenResolver};
use forks_config::{response_cache_path, settings_path, AppConfig, RunOptions, Settings};
use log::{debug, info, warn};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// List the forks of a GitHub repository with how far each is ahead of and
/// behind the original
#[derive(Parser, Debug)]
#[command(name = "active-forks", version, about)]
struct Cli {
    /// Repository as OWNER/REPO or a github.com URL
    repository: Option<String>,

    /// GitHub token (defaults to the last one used, GITHUB_TOKEN, GH_TOKEN or `gh auth token`)
    #[arg(long)]
    token: Option<String>,

    /// Maximum number of forks to fetch
    #[arg(long)]
    max_records: Option<usize>,

    /// Treat forks with the same size as identical
    #[arg(long, overrides_with = "no_same_size")]
    same_size: bool,

    /// Compute every fork even if another fork has the same size
    #[arg(long)]
    no_same_size: bool,

    /// Treat forks with the same last push as identical
    #[arg(long, overrides_with = "no_same_push_date")]
    same_push_date: bool,

    /// Compute every fork even if another fork was pushed at the same time
    #[arg(long)]
    no_same_push_date: bool,

    /// Ignore cached responses, but store the fresh ones
    #[arg(long)]
    refresh: bool,

    /// Only list the forks, without comparing them
    #[arg(long)]
    list_only: bool,

    /// Print the commits behind each ahead/behind count
    #[arg(long)]
    details: bool,

    /// Delete the response cache before running
    #[arg(long)]
    clear_cache: bool,

    /// Keep cached responses in memory only
    #[arg(long)]
    no_persist: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_options(&self, saved: RunOptions) -> RunOptions {
        RunOptions {
            compare_by_size: flag(self.same_size, self.no_same_size, saved.compare_by_size),
            compare_by_push_date: flag(
                self.same_push_date,
                self.no_same_push_date,
                saved.compare_by_push_date,
            ),
            max_records: self.max_records.unwrap_or(saved.max_records),
        }
    }
}

fn flag(on: bool, off: bool, saved: bool) -> bool {
    if off {
        false
    } else if on {
        true
    } else {
        saved
    }
}

fn main() -> Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match dotenv {
        Ok(path) => debug!("Loaded environment from {:?}", path),
        Err(e) => debug!("No .env file loaded: {}", e),
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    info!("Starting active-forks");

    let config = AppConfig::load();
    let settings_file = settings_path()
        .map_err(|e| warn!("Settings will not be remembered: {:#}", e))
        .ok();
    let settings = settings_file
        .as_deref()
        .map(Settings::load_from_path)
        .unwrap_or_default();

    if cli.clear_cache {
        clear_cache()?;
    }

    let Some(repository) = cli.repository.clone() else {
        if cli.clear_cache {
            return Ok(ExitCode::SUCCESS);
        }
        bail!("No repository given, expected OWNER/REPO");
    };

    let options = cli.run_options(settings.options);
    let resolver = TokenResolver::new()
        .with_explicit(cli.token.clone())
        .with_remembered(settings.token.clone());
    let token = resolver.resolve().await;

    let store: Box<dyn KeyValueStore> = if cli.no_persist || !config.persist_cache {
        Box::new(MemoryStore::new())
    } else {
        match response_cache_path() {
            Ok(path) => Box::new(JsonFileStore::new(path)),
            Err(e) => {
                warn!("Response cache kept in memory: {:#}", e);
                Box::new(MemoryStore::new())
            }
        }
    };
    let cache = Arc::new(Mutex::new(ResponseCache::new(store)));

    let (tx, rx) = mpsc::unbounded_channel::<RunEvent>();
    let observer: Arc<dyn RunObserver> = Arc::new(tx);
    let printer = tokio::spawn(print_events(rx));

    let transport = OctocrabTransport::build(&config.api_base_url)
        .context("Failed to create GitHub client")?;
    let api = ApiClient::new(transport, cache)
        .with_base_url(config.api_base_url.as_str())
        .with_token(token)
        .with_mode(if cli.refresh {
            CacheMode::WriteOnly
        } else {
            CacheMode::ReadWrite
        })
        .with_timeout(config.request_timeout())
        .with_messages(Arc::new(ObserverSink::new(Arc::clone(&observer))));
    let orchestrator = Orchestrator::new(api).with_web_base_url(config.web_base_url.as_str());

    let mut controller = RunController::new();
    if let Some(path) = settings_file {
        controller = controller.with_settings_path(path);
    }
    let controller = Arc::new(controller);
    spawn_ctrl_c_handler(Arc::clone(&controller));

    let request = RunRequest {
        repository,
        token: resolver.resolve_configured(),
        options,
        list_only: cli.list_only,
    };
    let toggle = controller
        .toggle(&request, &orchestrator, observer.as_ref())
        .await;

    // Close the event channel so the printer drains and exits
    drop(orchestrator);
    drop(observer);
    if let Err(e) = printer.await {
        debug!("Event printer stopped: {}", e);
    }

    let report = match toggle {
        Toggle::Finished(report) => report,
        Toggle::Rejected(_) => return Ok(ExitCode::from(2)),
        Toggle::StopRequested => return Ok(ExitCode::SUCCESS),
    };

    print_table(&report, !cli.list_only);
    if cli.details {
        print_details(&report);
    }

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{}", report.quota);
    let stats = report.cache;
    info!(
        "Cache: {} hits, {} misses, {} revalidated, {} stored",
        stats.hits, stats.misses, stats.revalidated, stats.stored
    );

    Ok(match report.outcome {
        RunOutcome::Failed(_) => ExitCode::FAILURE,
        RunOutcome::Cancelled { processed } => {
            let _ = writeln!(
                stderr,
                "Stopped after {} of {} forks",
                processed,
                report.forks.len()
            );
            ExitCode::from(130)
        }
        RunOutcome::Completed => ExitCode::SUCCESS,
    })
}

fn clear_cache() -> Result<()> {
    let path = response_cache_path()?;
    remove_if_exists(&path)?;
    info!("Cleared response cache at {:?}", path);
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete cache file {:?}", path))?;
    }
    Ok(())
}

/// First Ctrl-C stops the run between forks, the next one exits
fn spawn_ctrl_c_handler(controller: Arc<RunController>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !controller.stop() {
                std::process::exit(130);
            }
            eprintln!("\nStopping after the current fork, press Ctrl-C again to quit");
        }
    });
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<RunEvent>) {
    let mut stderr = std::io::stderr();
    let mut progress_shown = false;

    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::ForksListed { origin, forks } => {
                let _ = writeln!(stderr, "{}: {} forks", origin.full_name, forks.len());
            }
            RunEvent::ForkUpdated { fork, .. } => {
                debug!(
                    "{}: ahead {:?} behind {:?}",
                    fork.repo.full_name,
                    fork.ahead_label(),
                    fork.behind_label()
                );
            }
            RunEvent::Progress { index, total } => {
                let _ = write!(stderr, "\rProgress: {} / {}", index, total);
                let _ = stderr.flush();
                progress_shown = true;
            }
            RunEvent::Quota(line) => debug!("{}", line),
            RunEvent::Message { severity, text } => {
                if progress_shown {
                    let _ = writeln!(stderr);
                    progress_shown = false;
                }
                let prefix = match severity {
                    Severity::Info => "info",
                    Severity::Danger => "error",
                };
                let _ = writeln!(stderr, "{}: {}", prefix, text);
            }
            RunEvent::Finished => {
                if progress_shown {
                    let _ = writeln!(stderr);
                    progress_shown = false;
                }
            }
        }
    }
}

const HEADERS: [&str; 7] = [
    "Repository", "Branch", "Stars", "Forks", "Issues", "Size", "Last push",
];
const DIFF_HEADERS: [&str; 2] = ["Ahead", "Behind"];
const LISTING_HEADERS: [&str; 3] = ["Updated", "Created", "Edited"];

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn table_row(fork: &ForkSummary, with_diffs: bool) -> Vec<String> {
    let mut row = vec![
        fork.repo.full_name.clone(),
        fork.repo.default_branch.clone(),
        fork.repo.stargazers_count.to_string(),
        fork.repo.forks.to_string(),
        fork.repo.open_issues_count.to_string(),
        fork.repo.size.to_string(),
        timestamp(fork.repo.pushed_at),
    ];
    if with_diffs {
        row.push(fork.ahead_label().to_string());
        row.push(fork.behind_label().to_string());
    } else {
        row.push(timestamp(fork.repo.updated_at));
        row.push(timestamp(fork.repo.created_at));
        row.push(fork.edited_label().to_string());
    }
    row
}

fn table_headers(with_diffs: bool) -> Vec<String> {
    let tail: &[&str] = if with_diffs {
        &DIFF_HEADERS
    } else {
        &LISTING_HEADERS
    };
    HEADERS.iter().chain(tail).map(|h| h.to_string()).collect()
}

fn print_table(report: &RunReport, with_diffs: bool) {
    let header = table_headers(with_diffs);
    let rows: Vec<Vec<String>> = report
        .rows()
        .map(|fork| table_row(fork, with_diffs))
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", format_line(&header));
    for row in &rows {
        println!("{}", format_line(row));
    }
}

fn print_details(report: &RunReport) {
    for fork in &report.forks {
        for cell in [&fork.ahead, &fork.behind].into_iter().flatten() {
            if cell.is_zero() {
                continue;
            }
            println!();
            println!("{} {}", fork.repo.full_name, cell.label());
            println!("{}", cell.detail_text());
        }
    }
}
