//! Entry construction and per-record write/commit handling.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use toposync_connect::membership::UserApi;
use toposync_connect::ConnectError;
use toposync_core::topology;
use toposync_core::types::{ProjectName, ProjectRecord, Stem, TopologyEntry};
use toposync_git::GitRepo;

use crate::error::SyncError;
use crate::pipeline::SyncOptions;

/// Group attribute holding the PI's organization.
pub const PI_ORGANIZATION_ATTRIBUTE: &str = "OSG:PI_Organization";
/// Group attribute holding the PI's name.
pub const PI_NAME_ATTRIBUTE: &str = "OSG:PI_Name";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Outcome of one missing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Entry written; the commit step's outcome is nested.
    Created {
        project: ProjectName,
        stem: Stem,
        path: PathBuf,
        commit: CommitOutcome,
    },
    /// Dry run: the entry would have been written here.
    WouldCreate {
        project: ProjectName,
        stem: Stem,
        path: PathBuf,
    },
    /// A record earlier in the same run already produced this stem; the
    /// file written for it is left untouched.
    DuplicateStem { project: ProjectName, stem: Stem },
}

/// How the commit step ended for a written entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Committed and pushed to `origin`.
    Pushed { commit: String },
    /// Git does not see the file as untracked; nothing was committed.
    /// A deliberate no-op, not an error.
    AlreadyTracked,
}

// ---------------------------------------------------------------------------
// Entry construction
// ---------------------------------------------------------------------------

/// Assemble the five-key entry for one project.
///
/// `Description` and `FieldOfScience` come from the group metadata
/// (`description`, `purpose`); `Organization` and `PIName` from the two PI
/// attributes. Any failed fetch aborts with the project attached; values
/// are never defaulted.
pub fn build_entry(api: &dyn UserApi, name: &ProjectName) -> Result<TopologyEntry, SyncError> {
    let metadata = api
        .group_metadata(&name.0)
        .map_err(|e| project_err(name, e))?;
    let organization = api
        .group_attribute(&name.0, PI_ORGANIZATION_ATTRIBUTE)
        .map_err(|e| project_err(name, e))?;
    let pi_name = api
        .group_attribute(&name.0, PI_NAME_ATTRIBUTE)
        .map_err(|e| project_err(name, e))?;

    Ok(TopologyEntry::new(
        metadata.description,
        metadata.purpose,
        organization,
        pi_name,
    ))
}

fn project_err(name: &ProjectName, source: ConnectError) -> SyncError {
    SyncError::Project {
        name: name.clone(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Commit handling
// ---------------------------------------------------------------------------

/// Commit and push `projects/<stem>.yaml` if git sees it as untracked.
///
/// A file that is not untracked (already committed, or matched by an
/// ignore rule) is left alone and reported as
/// [`CommitOutcome::AlreadyTracked`].
pub fn commit_if_untracked(
    repo: &GitRepo,
    record: &ProjectRecord,
    stem: &Stem,
) -> Result<CommitOutcome, SyncError> {
    let untracked = repo.untracked_files()?;
    let repo_relative = format!("projects/{}.yaml", stem.0);
    if !untracked.contains(&repo_relative) {
        tracing::debug!("{repo_relative} is not untracked; nothing to commit");
        return Ok(CommitOutcome::AlreadyTracked);
    }

    repo.stage(&repo_relative)?;
    repo.commit(&format!(
        "added topology file for new project: {}",
        record.name
    ))?;
    repo.push("origin")?;
    let commit = repo.head_commit()?;
    tracing::info!("pushed {commit} for {}", record.name);
    Ok(CommitOutcome::Pushed { commit })
}

// ---------------------------------------------------------------------------
// Per-record processing
// ---------------------------------------------------------------------------

/// Handle one missing record end to end.
///
/// Builds and writes the entry, marks the stem in `known`, then commits if
/// untracked. `known` is only ever updated in memory; the projects
/// directory is never re-scanned within a run. In dry-run mode nothing
/// touches disk or git, but the stem is still marked so a later record
/// collapsing to it reports as a duplicate.
pub fn process_record(
    api: &dyn UserApi,
    repo: &GitRepo,
    record: &ProjectRecord,
    known: &mut BTreeSet<Stem>,
    options: &SyncOptions,
) -> Result<RecordOutcome, SyncError> {
    let stem = record.name.stem(&options.namespace);
    if known.contains(&stem) {
        tracing::warn!("{} collapses to already-known stem {stem}", record.name);
        return Ok(RecordOutcome::DuplicateStem {
            project: record.name.clone(),
            stem,
        });
    }

    let dir = topology::projects_dir(repo.workdir());
    let path = topology::entry_path(&dir, &stem);

    if options.dry_run {
        tracing::info!("[dry-run] would create {}", path.display());
        known.insert(stem.clone());
        return Ok(RecordOutcome::WouldCreate {
            project: record.name.clone(),
            stem,
            path,
        });
    }

    let entry = build_entry(api, &record.name)?;
    topology::write_entry(&entry, &path)?;
    known.insert(stem.clone());

    let commit = commit_if_untracked(repo, record, &stem)?;
    Ok(RecordOutcome::Created {
        project: record.name.clone(),
        stem,
        path,
        commit,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use toposync_connect::membership::GroupMetadata;

    use super::*;

    struct FakeApi {
        metadata: Option<GroupMetadata>,
        attributes: BTreeMap<String, String>,
    }

    impl FakeApi {
        fn complete() -> Self {
            Self {
                metadata: Some(GroupMetadata {
                    description: "this is a test description".to_owned(),
                    purpose: "Computer Sciences".to_owned(),
                    creation_date: "2022-Jan-01 01:01:01.000000 UTC".to_owned(),
                }),
                attributes: BTreeMap::from([
                    (PI_ORGANIZATION_ATTRIBUTE.to_owned(), "test-org".to_owned()),
                    (PI_NAME_ATTRIBUTE.to_owned(), "pi-name".to_owned()),
                ]),
            }
        }

        fn without_attribute(attribute: &str) -> Self {
            let mut api = Self::complete();
            api.attributes.remove(attribute);
            api
        }
    }

    impl UserApi for FakeApi {
        fn group_names(&self) -> Result<std::collections::BTreeSet<String>, ConnectError> {
            Ok(std::collections::BTreeSet::new())
        }

        fn group_metadata(&self, group: &str) -> Result<GroupMetadata, ConnectError> {
            self.metadata.clone().ok_or_else(|| ConnectError::Status {
                url: format!("fake:///groups/{group}"),
                status: 404,
            })
        }

        fn group_attribute(&self, group: &str, attribute: &str) -> Result<String, ConnectError> {
            self.attributes
                .get(attribute)
                .cloned()
                .ok_or_else(|| ConnectError::Status {
                    url: format!("fake:///groups/{group}/attributes/{attribute}"),
                    status: 404,
                })
        }
    }

    fn record(name: &str) -> ProjectRecord {
        ProjectRecord {
            name: ProjectName::from(name),
            created_at: Utc.with_ymd_and_hms(2022, 1, 1, 1, 1, 1).unwrap(),
        }
    }

    #[test]
    fn build_entry_maps_metadata_and_attributes() {
        let api = FakeApi::complete();
        let entry = build_entry(&api, &ProjectName::from("root.osg.t")).expect("build");
        assert_eq!(entry.description, "this is a test description");
        assert_eq!(entry.field_of_science, "Computer Sciences");
        assert_eq!(entry.organization, "test-org");
        assert_eq!(entry.pi_name, "pi-name");
        assert_eq!(entry.sponsor.campus_grid.name, "OSG Connect");
    }

    #[test]
    fn missing_attribute_fails_with_the_project_attached() {
        let api = FakeApi::without_attribute(PI_NAME_ATTRIBUTE);
        let err = build_entry(&api, &ProjectName::from("root.osg.t")).unwrap_err();
        match err {
            SyncError::Project { name, .. } => assert_eq!(name.0, "root.osg.t"),
            other => panic!("expected Project, got {other:?}"),
        }
    }

    #[test]
    fn dry_run_marks_the_stem_without_writing() {
        let api = FakeApi::complete();
        let scratch = tempfile::tempdir().expect("tempdir");
        let repo = GitRepo::open(scratch.path());
        let mut options = SyncOptions::for_operator(
            "operator",
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        );
        options.dry_run = true;

        let mut known = BTreeSet::new();
        let outcome = process_record(&api, &repo, &record("root.osg.NEW"), &mut known, &options)
            .expect("process");

        assert!(matches!(outcome, RecordOutcome::WouldCreate { .. }));
        assert!(known.contains(&Stem::from("NEW")));
        assert!(!scratch.path().join("projects").exists());
    }

    fn run_git(dir: &std::path::Path, args: &[&str]) {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("spawn git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    #[test]
    fn committed_file_reports_already_tracked() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let dir = scratch.path();
        run_git(dir, &["init", "--quiet"]);
        run_git(dir, &["config", "user.name", "toposync-tests"]);
        run_git(dir, &["config", "user.email", "toposync-tests@example.invalid"]);
        std::fs::create_dir(dir.join("projects")).expect("mkdir");
        std::fs::write(dir.join("projects/KNOWN.yaml"), "Description: d\n").expect("write");
        run_git(dir, &["add", "."]);
        run_git(dir, &["commit", "--quiet", "-m", "seed"]);

        let repo = GitRepo::open(dir);
        let outcome = commit_if_untracked(&repo, &record("root.osg.KNOWN"), &Stem::from("KNOWN"))
            .expect("commit check");
        assert_eq!(outcome, CommitOutcome::AlreadyTracked);
    }

    #[test]
    fn second_record_with_the_same_stem_is_a_duplicate() {
        let api = FakeApi::complete();
        let scratch = tempfile::tempdir().expect("tempdir");
        let repo = GitRepo::open(scratch.path());
        let mut options = SyncOptions::for_operator(
            "operator",
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        );
        options.dry_run = true;

        let mut known = BTreeSet::new();
        process_record(&api, &repo, &record("root.osg.team.root.osg"), &mut known, &options)
            .expect("first");
        let outcome = process_record(&api, &repo, &record("team.root.osg"), &mut known, &options)
            .expect("second");

        match outcome {
            RecordOutcome::DuplicateStem { project, stem } => {
                assert_eq!(project.0, "team.root.osg");
                assert_eq!(stem.0, "team.root.osg");
            }
            other => panic!("expected DuplicateStem, got {other:?}"),
        }
    }
}
