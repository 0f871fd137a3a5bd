//! Error types for toposync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from topology file operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path attached.
    #[error("failed to parse topology file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience constructor for [`TopologyError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TopologyError {
    TopologyError::Io {
        path: path.into(),
        source,
    }
}
