//! Membership-database REST client.
//!
//! The `v1alpha1` surface wraps everything in envelope documents: a group
//! list carrying bare names, a group document with a `metadata` block, and
//! an attribute document with a single `data` value.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::{from_ureq, ConnectError};
use crate::REQUEST_TIMEOUT;

/// Production endpoint of the membership database.
pub const DEFAULT_BASE_URL: &str = "https://api.ci-connect.net:18080";

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Read access to the membership database.
///
/// The sync engine depends only on this trait; tests substitute in-memory
/// implementations.
pub trait UserApi {
    /// All group names known to the database.
    fn group_names(&self) -> Result<BTreeSet<String>, ConnectError>;

    /// The metadata block of one group.
    fn group_metadata(&self, group: &str) -> Result<GroupMetadata, ConnectError>;

    /// The value of one named attribute scoped to a group.
    fn group_attribute(&self, group: &str, attribute: &str) -> Result<String, ConnectError>;
}

/// The consumed slice of a group's `metadata` block.
///
/// Unknown fields (display name, contact details and the like) are ignored.
/// None of the kept fields has a fallback: a document missing one is a
/// payload error, never a blank value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupMetadata {
    pub description: String,
    pub purpose: String,
    pub creation_date: String,
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GroupListDocument {
    groups: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GroupDocument {
    metadata: GroupMetadata,
}

#[derive(Debug, Deserialize)]
struct AttributeDocument {
    data: String,
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

/// `ureq`-backed [`UserApi`] over the `v1alpha1` REST surface.
pub struct UserApiClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl UserApiClient {
    /// A client for `base_url`, authenticating every call with `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ConnectError> {
        tracing::debug!("GET {url}");
        let response = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(|e| from_ureq(url, e, REQUEST_TIMEOUT))?;
        response.into_json().map_err(|e| ConnectError::Payload {
            url: url.to_owned(),
            source: e,
        })
    }
}

impl UserApi for UserApiClient {
    fn group_names(&self) -> Result<BTreeSet<String>, ConnectError> {
        let url = format!("{}/v1alpha1/groups", self.base_url);
        let doc: GroupListDocument = self.get_json(&url)?;
        Ok(doc.groups.into_iter().collect())
    }

    fn group_metadata(&self, group: &str) -> Result<GroupMetadata, ConnectError> {
        let url = format!("{}/v1alpha1/groups/{group}", self.base_url);
        let doc: GroupDocument = self.get_json(&url)?;
        Ok(doc.metadata)
    }

    fn group_attribute(&self, group: &str, attribute: &str) -> Result<String, ConnectError> {
        let url = format!(
            "{}/v1alpha1/groups/{group}/attributes/{attribute}",
            self.base_url
        );
        let doc: AttributeDocument = self.get_json(&url)?;
        Ok(doc.data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
