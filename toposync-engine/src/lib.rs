//! # toposync-engine
//!
//! The reconciliation stages of a sync run:
//!
//! | Module       | Stage                                          |
//! |--------------|------------------------------------------------|
//! | [`lister`]   | membership discovery + recency filter          |
//! | [`differ`]   | stem subtraction against the working copy      |
//! | [`writer`]   | entry build / write / commit-if-untracked      |
//! | [`pipeline`] | run orchestration, publish step, run report    |
//!
//! Call [`pipeline::run`] with the two injected capabilities (membership
//! [`UserApi`](toposync_connect::UserApi), forge
//! [`Forge`](toposync_connect::Forge)) to execute one full pass.

pub mod differ;
pub mod error;
pub mod lister;
pub mod pipeline;
pub mod writer;

pub use error::SyncError;
pub use lister::NameMatch;
pub use pipeline::{run, PublishOutcome, RunReport, SyncOptions, PULL_REQUEST_TITLE};
pub use writer::{CommitOutcome, RecordOutcome};
