//! Stem subtraction between discovered projects and the working copy.

use std::collections::BTreeSet;

use toposync_core::types::{ProjectRecord, Stem};

/// The records whose topology file is absent from `existing`.
///
/// Each record's candidate stem is its name with the `<namespace>.` prefix
/// stripped. Pure; input order is preserved.
pub fn missing(
    records: &[ProjectRecord],
    existing: &BTreeSet<Stem>,
    namespace: &str,
) -> Vec<ProjectRecord> {
    records
        .iter()
        .filter(|r| !existing.contains(&r.name.stem(namespace)))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
