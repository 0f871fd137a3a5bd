//! Topology working-copy file store.
//!
//! # Layout
//!
//! ```text
//! <repo_root>/
//!   projects/
//!     <stem>.yaml   (one file per project, five fixed keys)
//! ```
//!
//! Listing is non-recursive and sees only `*.yaml` regular files; writes go
//! through a `.tmp` sibling and an atomic rename.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{io_err, TopologyError};
use crate::types::{Stem, TopologyEntry};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<repo_root>/projects/` (pure, no I/O).
pub fn projects_dir(repo_root: &Path) -> PathBuf {
    repo_root.join("projects")
}

/// `<dir>/<stem>.yaml` (pure, no I/O).
pub fn entry_path(dir: &Path, stem: &Stem) -> PathBuf {
    dir.join(format!("{}.yaml", stem.0))
}

// ---------------------------------------------------------------------------
// 2. List
// ---------------------------------------------------------------------------

/// The stems of all `*.yaml` regular files directly inside `dir`.
///
/// Subdirectories and other extensions are ignored; a missing directory
/// yields an empty set (the writer creates it on first use).
pub fn existing_stems(dir: &Path) -> Result<BTreeSet<Stem>, TopologyError> {
    if !dir.exists() {
        return Ok(BTreeSet::new());
    }
    let mut stems = BTreeSet::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let fname = entry.file_name();
        let name = fname.to_string_lossy();
        if let Some(stem) = name.strip_suffix(".yaml") {
            stems.insert(Stem::from(stem));
        }
    }
    Ok(stems)
}

// ---------------------------------------------------------------------------
// 3. Write (atomic)
// ---------------------------------------------------------------------------

/// Atomically write `entry` to `path` as a single YAML document.
///
/// The serialized document goes to a `.tmp` sibling first and is renamed
/// onto `path` (same filesystem, so no EXDEV). Parent directories are
/// created as needed; an existing file at `path` is replaced.
pub fn write_entry(entry: &TopologyEntry, path: &Path) -> Result<(), TopologyError> {
    let yaml = serde_yaml::to_string(entry)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Read
// ---------------------------------------------------------------------------

/// Load a single entry back from `path`.
pub fn read_entry(path: &Path) -> Result<TopologyEntry, TopologyError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| TopologyError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
