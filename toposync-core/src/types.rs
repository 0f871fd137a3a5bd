//! Domain types for the topology sync pipeline.
//!
//! `TopologyEntry` field declaration order is the YAML key order on disk;
//! reorder fields and every generated file changes shape.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name written under `Sponsor.CampusGrid` in every generated entry.
pub const CAMPUS_GRID_NAME: &str = "OSG Connect";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A fully-qualified dotted project name, e.g. `root.osg.TEST-PROJECT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl ProjectName {
    /// The topology file stem for this project: the name with the leading
    /// `<namespace>.` stripped. A name outside the namespace stems to itself.
    pub fn stem(&self, namespace: &str) -> Stem {
        let prefix = format!("{namespace}.");
        match self.0.strip_prefix(&prefix) {
            Some(rest) => Stem(rest.to_owned()),
            None => Stem(self.0.clone()),
        }
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A topology file name without its `.yaml` suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stem(pub String);

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Stem {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Stem {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A project discovered in the membership database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: ProjectName,
    pub created_at: DateTime<Utc>,
}

/// One topology file: exactly five top-level keys, in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEntry {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "FieldOfScience")]
    pub field_of_science: String,
    #[serde(rename = "Organization")]
    pub organization: String,
    #[serde(rename = "PIName")]
    pub pi_name: String,
    #[serde(rename = "Sponsor")]
    pub sponsor: Sponsor,
}

impl TopologyEntry {
    /// Build an entry from the four looked-up values; the sponsor block is
    /// always the fixed campus grid.
    pub fn new(
        description: impl Into<String>,
        field_of_science: impl Into<String>,
        organization: impl Into<String>,
        pi_name: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            field_of_science: field_of_science.into(),
            organization: organization.into(),
            pi_name: pi_name.into(),
            sponsor: Sponsor::default(),
        }
    }
}

/// The fixed `Sponsor:` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sponsor {
    #[serde(rename = "CampusGrid")]
    pub campus_grid: CampusGrid,
}

impl Default for Sponsor {
    fn default() -> Self {
        Self {
            campus_grid: CampusGrid {
                name: CAMPUS_GRID_NAME.to_owned(),
            },
        }
    }
}

/// The fixed `CampusGrid:` block inside [`Sponsor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampusGrid {
    #[serde(rename = "Name")]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
