//! Toposync git library: working-copy operations over the system `git`
//! binary.
//!
//! Public API surface:
//! - [`repo`]: [`GitRepo`] handle (clone / untracked / stage / commit / push)
//! - [`error`]: [`GitError`]

pub mod error;
pub mod repo;

pub use error::GitError;
pub use repo::GitRepo;
