//! Error types for toposync-git.

use std::process::ExitStatus;

use thiserror::Error;

/// All errors that can arise from git subprocess calls.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary could not be started at all.
    #[error("cannot run `git {args}`: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    /// `git` ran and reported failure; stderr is trimmed into the message.
    #[error("`git {args}` failed ({status}): {stderr}")]
    Command {
        args: String,
        status: ExitStatus,
        stderr: String,
    },
}
