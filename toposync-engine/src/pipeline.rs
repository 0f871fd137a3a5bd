//! The single-pass run: list, filter, diff, write, publish.

use chrono::{DateTime, Utc};
use serde::Serialize;

use toposync_connect::github::Forge;
use toposync_connect::membership::UserApi;
use toposync_connect::ConnectError;
use toposync_core::topology;
use toposync_git::GitRepo;

use crate::differ;
use crate::error::SyncError;
use crate::lister::{self, NameMatch};
use crate::writer::{self, CommitOutcome, RecordOutcome};

/// Namespace token selecting membership groups.
pub const DEFAULT_NAMESPACE: &str = "root.osg";
/// Branch the pull request targets on the upstream repository.
pub const DEFAULT_BASE_BRANCH: &str = "master";
/// Title of the pull request opened after a run that pushed commits.
pub const PULL_REQUEST_TITLE: &str =
    "[initiated by topology-sync tool] topology files have been created/updated";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Everything one run needs beyond its API and forge handles.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// GitHub account owning the fork; also the head owner of the pull
    /// request.
    pub operator: String,
    /// Clone URL of the operator's fork.
    pub fork_url: String,
    /// Branch the pull request targets; the head branch carries the same
    /// name on the fork.
    pub base_branch: String,
    /// Namespace token for project selection and stem derivation.
    pub namespace: String,
    /// How `namespace` selects project names.
    pub match_mode: NameMatch,
    /// Only projects created at or after this instant are considered.
    pub cutoff: DateTime<Utc>,
    /// Report what would happen without writing, committing, or opening a
    /// pull request.
    pub dry_run: bool,
}

impl SyncOptions {
    /// Options for `operator` with every knob at its default.
    pub fn for_operator(operator: impl Into<String>, cutoff: DateTime<Utc>) -> Self {
        let operator = operator.into();
        let fork_url = format!("https://github.com/{operator}/topology.git");
        Self {
            operator,
            fork_url,
            base_branch: DEFAULT_BASE_BRANCH.to_owned(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
            match_mode: NameMatch::default(),
            cutoff,
            dry_run: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// How the publish step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// Pull request created.
    Opened { number: u64, url: String },
    /// The forge refused the pull request; the pushed commits stay on the
    /// fork and the run still counts as complete.
    Failed {
        status: Option<u16>,
        reason: String,
    },
    /// No commits were pushed, so there was nothing to open a pull
    /// request for.
    NothingToPublish,
    /// Dry run: the publish step was skipped.
    SkippedDryRun,
}

/// What one run did, in order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Projects selected by the namespace match, root excluded.
    pub discovered: usize,
    /// Of those, projects created at or after the cutoff.
    pub recent: usize,
    /// One outcome per missing record, in processing order.
    pub outcomes: Vec<RecordOutcome>,
    /// How the publish step ended.
    pub publish: PublishOutcome,
}

impl RunReport {
    /// Number of records that ended as a pushed commit.
    pub fn pushed_count(&self) -> usize {
        pushed_count(&self.outcomes)
    }
}

fn pushed_count(outcomes: &[RecordOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| {
            matches!(
                o,
                RecordOutcome::Created {
                    commit: CommitOutcome::Pushed { .. },
                    ..
                }
            )
        })
        .count()
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run one pass end to end.
///
/// The fork is cloned into a scratch directory that is removed when the
/// run finishes, successfully or not. Records are processed in name order;
/// the first hard failure aborts the run. The publish step never fails the
/// run: a refused pull request is reported in the returned
/// [`RunReport::publish`].
pub fn run(
    api: &dyn UserApi,
    forge: &dyn Forge,
    options: &SyncOptions,
) -> Result<RunReport, SyncError> {
    let projects = lister::list_projects(api, options)?;
    let discovered = projects.len();
    let recent = lister::filter_since(&projects, options.cutoff);
    tracing::info!(
        "{} of {discovered} projects created since {}",
        recent.len(),
        options.cutoff
    );

    let scratch = tempfile::tempdir().map_err(|e| SyncError::Scratch { source: e })?;
    let checkout = scratch.path().join("topology");
    let repo = GitRepo::clone(&options.fork_url, &checkout)?;

    let dir = topology::projects_dir(repo.workdir());
    let mut known = topology::existing_stems(&dir)?;
    let missing = differ::missing(&recent, &known, &options.namespace);
    tracing::info!(
        "{} of {} recent projects missing a topology file",
        missing.len(),
        recent.len()
    );

    let mut outcomes = Vec::with_capacity(missing.len());
    for record in &missing {
        let outcome = writer::process_record(api, &repo, record, &mut known, options)?;
        outcomes.push(outcome);
    }

    let publish = publish(forge, options, &outcomes);
    Ok(RunReport {
        discovered,
        recent: recent.len(),
        outcomes,
        publish,
    })
}

/// Decide and perform the publish step for a finished record loop.
fn publish(forge: &dyn Forge, options: &SyncOptions, outcomes: &[RecordOutcome]) -> PublishOutcome {
    if options.dry_run {
        return PublishOutcome::SkippedDryRun;
    }
    if pushed_count(outcomes) == 0 {
        tracing::info!("no commits pushed; skipping the pull request");
        return PublishOutcome::NothingToPublish;
    }

    let head = format!("{}:{}", options.operator, options.base_branch);
    match forge.open_pull_request(&options.base_branch, &head, PULL_REQUEST_TITLE) {
        Ok(pr) => {
            tracing::info!("opened pull request #{}: {}", pr.number, pr.html_url);
            PublishOutcome::Opened {
                number: pr.number,
                url: pr.html_url,
            }
        }
        Err(err) => {
            tracing::warn!("pull request refused: {err}");
            let status = match &err {
                ConnectError::Status { status, .. } => Some(*status),
                _ => None,
            };
            PublishOutcome::Failed {
                status,
                reason: err.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
