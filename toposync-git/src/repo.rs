//! Working-copy handle over the system `git` binary.
//!
//! Every operation shells out with the working copy as its current
//! directory; a failed subcommand surfaces the exact arguments and git's
//! trimmed stderr. Authentication (for clone and push) is whatever the
//! host's git configuration provides.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::GitError;

/// A handle to one local git working copy.
#[derive(Debug)]
pub struct GitRepo {
    workdir: PathBuf,
}

impl GitRepo {
    /// Clone `url` into `dest` and return a handle to the fresh copy.
    pub fn clone(url: &str, dest: &Path) -> Result<Self, GitError> {
        tracing::info!("cloning {url} into {}", dest.display());
        git(None, &["clone", "--quiet", url, &dest.to_string_lossy()])?;
        Ok(Self {
            workdir: dest.to_path_buf(),
        })
    }

    /// A handle to an existing working copy. No validation is performed;
    /// the first operation fails if `workdir` is not a repository.
    pub fn open(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// The working copy root.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Repo-root-relative paths of all untracked files, honoring ignore
    /// rules (`ls-files --others --exclude-standard`).
    pub fn untracked_files(&self) -> Result<BTreeSet<String>, GitError> {
        let stdout = self.run(&["ls-files", "--others", "--exclude-standard"])?;
        Ok(stdout.lines().map(str::to_owned).collect())
    }

    /// Stage one repo-root-relative path.
    pub fn stage(&self, path: &str) -> Result<(), GitError> {
        self.run(&["add", "--", path])?;
        Ok(())
    }

    /// Commit staged changes with `message`.
    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    /// Push the current branch to `remote` (`push <remote> HEAD`).
    pub fn push(&self, remote: &str) -> Result<(), GitError> {
        self.run(&["push", "--quiet", remote, "HEAD"])?;
        Ok(())
    }

    /// Short hash of the current HEAD commit.
    pub fn head_commit(&self) -> Result<String, GitError> {
        Ok(self.run(&["rev-parse", "--short", "HEAD"])?.trim().to_owned())
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        git(Some(&self.workdir), args)
    }
}

// ---------------------------------------------------------------------------
// Subprocess plumbing
// ---------------------------------------------------------------------------

fn git(workdir: Option<&Path>, args: &[&str]) -> Result<String, GitError> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }

    let rendered = args.join(" ");
    let output = cmd.output().map_err(|e| GitError::Spawn {
        args: rendered.clone(),
        source: e,
    })?;
    if !output.status.success() {
        return Err(GitError::Command {
            args: rendered,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
