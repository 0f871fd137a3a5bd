//! Pull-request creation on GitHub.
//!
//! One call per run: `POST /repos/<upstream>/pulls`. Only HTTP 201 counts
//! as created; every other outcome is surfaced to the caller.

use serde::{Deserialize, Serialize};

use crate::error::{from_ureq, ConnectError};
use crate::REQUEST_TIMEOUT;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Write access to the forge hosting the upstream topology repository.
pub trait Forge {
    /// Open a pull request from `head` (a `user:branch` ref) against `base`
    /// on the upstream repository.
    fn open_pull_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
    ) -> Result<PullRequest, ConnectError>;
}

/// The slice of the forge's response the caller consumes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

#[derive(Debug, Serialize)]
struct PullRequestBody<'a> {
    base: &'a str,
    head: &'a str,
    title: &'a str,
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

/// `ureq`-backed [`Forge`] for one upstream repository.
pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    upstream: String,
    token: String,
}

impl GitHubClient {
    /// A client opening pull requests against `upstream` (an `owner/repo`
    /// slug) through `api_url`.
    pub fn new(
        api_url: impl Into<String>,
        upstream: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            upstream: upstream.into(),
            token: token.into(),
        }
    }
}

impl Forge for GitHubClient {
    fn open_pull_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
    ) -> Result<PullRequest, ConnectError> {
        let url = format!("{}/repos/{}/pulls", self.api_url, self.upstream);
        tracing::debug!("POST {url} ({head} into {base})");
        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github.v3+json")
            .send_json(PullRequestBody { base, head, title })
            .map_err(|e| from_ureq(&url, e, REQUEST_TIMEOUT))?;

        // ureq only errors on 4xx/5xx; a 2xx other than 201 is still not a
        // created pull request.
        let status = response.status();
        if status != 201 {
            return Err(ConnectError::Status { url, status });
        }
        response
            .into_json()
            .map_err(|e| ConnectError::Payload { url, source: e })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_serializes_the_three_fields() {
        let body = PullRequestBody {
            base: "master",
            head: "operator:master",
            title: "a title",
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "base": "master",
                "head": "operator:master",
                "title": "a title"
            })
        );
    }

    #[test]
    fn pull_request_deserializes_with_extra_fields_ignored() {
        let raw = r#"{
            "number": 4130,
            "html_url": "https://github.com/opensciencegrid/topology/pull/4130",
            "state": "open",
            "user": {"login": "operator"}
        }"#;
        let pr: PullRequest = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(pr.number, 4130);
        assert!(pr.html_url.ends_with("/pull/4130"));
    }
}
