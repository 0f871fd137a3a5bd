//! # toposync
//!
//! One-shot tool that creates topology files for recently created
//! membership projects on a fork of the upstream topology repository and
//! opens a pull request for them.
//!
//! Exit codes: 0 on a completed run, 1 when a credential file is unusable,
//! 2 when the run itself fails, 3 when everything was pushed but the pull
//! request was refused.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;

use toposync_connect::{token, GitHubClient, UserApiClient, DEFAULT_API_URL, DEFAULT_BASE_URL};
use toposync_engine::pipeline::DEFAULT_BASE_BRANCH;
use toposync_engine::{
    run, CommitOutcome, NameMatch, PublishOutcome, RecordOutcome, RunReport, SyncOptions,
};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Sync newly created membership projects into the topology repository.
#[derive(Debug, Parser)]
#[command(name = "toposync", version, about)]
struct Cli {
    /// GitHub account owning the topology fork.
    operator: String,
    /// File holding the GitHub bearer token.
    github_token_file: PathBuf,
    /// File holding the membership API bearer token.
    connect_token_file: PathBuf,

    /// Consider projects created within this many hours, up to ten years
    /// back.
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u64).range(1..=87_600))]
    window_hours: u64,
    /// Select projects whose name extends the namespace, instead of any
    /// name containing it.
    #[arg(long)]
    strict_prefix: bool,
    /// Report what a run would do without writing, committing or opening a
    /// pull request.
    #[arg(long)]
    dry_run: bool,
    /// Print the run report as JSON.
    #[arg(long)]
    json: bool,
    /// Membership API base URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// GitHub API base URL.
    #[arg(long, default_value = DEFAULT_API_URL)]
    github_api: String,
    /// Upstream repository (owner/repo) the pull request targets.
    #[arg(long, default_value = "opensciencegrid/topology")]
    upstream: String,
    /// Clone URL of the fork. Defaults to the operator's GitHub fork of
    /// the upstream repository.
    #[arg(long)]
    fork_url: Option<String>,
    /// Branch the pull request targets; the fork's branch of the same
    /// name is the head.
    #[arg(long, default_value = DEFAULT_BASE_BRANCH)]
    base_branch: String,
}

impl Cli {
    fn sync_options(&self) -> SyncOptions {
        let cutoff = Utc::now() - Duration::hours(self.window_hours as i64);
        let mut options = SyncOptions::for_operator(self.operator.clone(), cutoff);
        if let Some(fork_url) = &self.fork_url {
            options.fork_url = fork_url.clone();
        }
        options.base_branch = self.base_branch.clone();
        if self.strict_prefix {
            options.match_mode = NameMatch::Prefix;
        }
        options.dry_run = self.dry_run;
        options
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    // Both tokens are read before anything touches the network, so a bad
    // credential never leaves half a run behind.
    let github_token = match token::load(&cli.github_token_file) {
        Ok(token) => token,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };
    let connect_token = match token::load(&cli.connect_token_file) {
        Ok(token) => token,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    let api = UserApiClient::new(cli.base_url.clone(), connect_token);
    let forge = GitHubClient::new(cli.github_api.clone(), cli.upstream.clone(), github_token);
    let options = cli.sync_options();
    tracing::debug!("options: {options:?}");

    let report = match run(&api, &forge, &options) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = print_report(&report, cli.json) {
        eprintln!("error: {err:#}");
        return ExitCode::from(2);
    }

    match report.publish {
        PublishOutcome::Failed { .. } => ExitCode::from(3),
        _ => ExitCode::SUCCESS,
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// Report rendering
// ---------------------------------------------------------------------------

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(report).context("render run report as JSON")?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "{} projects discovered, {} within the window, {} needing topology files",
        report.discovered,
        report.recent,
        report.outcomes.len()
    );
    for outcome in &report.outcomes {
        match outcome {
            RecordOutcome::Created {
                project,
                path,
                commit,
                ..
            } => match commit {
                CommitOutcome::Pushed { commit } => {
                    println!("  + {project}: wrote {} (pushed {commit})", path.display());
                }
                CommitOutcome::AlreadyTracked => {
                    println!(
                        "  = {project}: wrote {} (already tracked, not committed)",
                        path.display()
                    );
                }
            },
            RecordOutcome::WouldCreate { project, path, .. } => {
                println!("  ~ {project}: would write {}", path.display());
            }
            RecordOutcome::DuplicateStem { project, stem } => {
                println!("  ! {project}: stem {stem} already handled this run");
            }
        }
    }
    match &report.publish {
        PublishOutcome::Opened { number, url } => {
            println!("opened pull request #{number}: {url}");
        }
        PublishOutcome::Failed {
            status: Some(status),
            reason,
        } => {
            println!("pull request refused with status {status}: {reason}");
        }
        PublishOutcome::Failed {
            status: None,
            reason,
        } => {
            println!("pull request failed: {reason}");
        }
        PublishOutcome::NothingToPublish => {
            println!("no commits pushed; no pull request opened");
        }
        PublishOutcome::SkippedDryRun => {
            println!("dry run; no pull request opened");
        }
    }
    Ok(())
}
