//! Error types for toposync-engine.

use thiserror::Error;

use toposync_connect::ConnectError;
use toposync_core::types::ProjectName;
use toposync_core::TopologyError;
use toposync_git::GitError;

/// All errors that abort a sync run.
///
/// A refused pull request is not a `SyncError`: the commits are already on
/// the fork by then, and the pipeline reports it inside the run report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing the group names failed.
    #[error("cannot list membership groups: {0}")]
    List(#[source] ConnectError),

    /// A per-project fetch (metadata or attribute) failed.
    #[error("cannot fetch data for project {name}: {source}")]
    Project {
        name: ProjectName,
        #[source]
        source: ConnectError,
    },

    /// A creation date did not match the fixed membership format.
    #[error("project {name} has malformed creation date {value:?}: {source}")]
    CreationDate {
        name: ProjectName,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// An error from the topology file store.
    #[error("topology store error: {0}")]
    Topology(#[from] TopologyError),

    /// An error from the git working copy.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// The scratch directory for the clone could not be created.
    #[error("cannot create scratch directory: {source}")]
    Scratch {
        #[source]
        source: std::io::Error,
    },
}
