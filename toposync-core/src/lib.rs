//! Toposync core library: domain types, topology file store, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes and domain structs
//! - [`error`]: [`TopologyError`]
//! - [`topology`]: stem listing / entry paths / atomic writes

pub mod error;
pub mod topology;
pub mod types;

pub use error::TopologyError;
pub use types::{
    CampusGrid, ProjectName, ProjectRecord, Sponsor, Stem, TopologyEntry, CAMPUS_GRID_NAME,
};
