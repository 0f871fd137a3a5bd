//! Toposync connect library: REST surfaces for the membership database and
//! the GitHub forge, plus bearer-credential loading.
//!
//! Public API surface:
//! - [`membership`]: [`UserApi`] capability + `ureq` client
//! - [`github`]: [`Forge`] capability + `ureq` client
//! - [`token`]: credential file loading
//! - [`error`]: [`ConnectError`]

use std::time::Duration;

pub mod error;
pub mod github;
pub mod membership;
pub mod token;

pub use error::ConnectError;
pub use github::{Forge, GitHubClient, PullRequest, DEFAULT_API_URL};
pub use membership::{GroupMetadata, UserApi, UserApiClient, DEFAULT_BASE_URL};

/// Timeout applied to every request made by either client.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
