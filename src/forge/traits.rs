//! forge::traits
//!
//! The upstream seam: a repository host that can describe a repository and
//! its latest commit.
//!
//! # Design
//!
//! The `RepoHost` trait is async because every call is network I/O. Both
//! methods return `Result`; turning failures into degraded records is the
//! caller's job (see [`crate::lookup`]), so implementations stay honest
//! about what went wrong.
//!
//! The `Display` text of [`HostError`] is exactly the message that ends up
//! in a degraded lookup record.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::reference::CanonicalPath;

/// Errors from repository host operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The repository metadata request returned a non-success status.
    #[error("GitHub API error: {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The commit list request returned a non-success status.
    #[error("GitHub API error fetching commits: {status}")]
    CommitsStatus {
        /// HTTP status code
        status: u16,
    },

    /// The request could not be sent or the response could not be read.
    #[error("{0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("{0}")]
    Parse(String),
}

/// Opaque bearer credential for the upstream API.
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read a credential from an environment variable.
    ///
    /// Returns `None` if the variable is unset or empty.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .map(Self)
    }

    /// The raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Repository metadata as returned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub updated_at: Option<String>,
    pub default_branch: String,
    pub owner: RepoOwner,
}

/// Owner object embedded in [`RepoMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
}

/// One element of the host's commit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub html_url: String,
    pub commit: CommitDetail,
}

/// The git-level commit object inside a [`CommitSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub committer: Option<CommitSignature>,
}

/// Committer identity; only the date is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSignature {
    pub date: Option<String>,
}

impl CommitSummary {
    /// The committer date, if the host reported one.
    pub fn committer_date(&self) -> Option<&str> {
        self.commit
            .committer
            .as_ref()
            .and_then(|c| c.date.as_deref())
    }
}

/// A remote repository host.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single host is shared by every
/// request handler and every concurrent lookup within a batch.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Host name for logging (e.g. "github").
    fn name(&self) -> &'static str;

    /// Fetch repository metadata.
    ///
    /// # Errors
    ///
    /// - `Status` for a non-success response
    /// - `Network` / `Parse` for transport or decoding failures
    async fn repository(
        &self,
        path: &CanonicalPath,
        credential: Option<&Credential>,
    ) -> Result<RepoMetadata, HostError>;

    /// Fetch the most recent commit on `branch`.
    ///
    /// Returns `Ok(None)` when the branch has no commits.
    ///
    /// # Errors
    ///
    /// - `CommitsStatus` for a non-success response
    /// - `Network` / `Parse` for transport or decoding failures
    async fn latest_commit(
        &self,
        path: &CanonicalPath,
        branch: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<CommitSummary>, HostError>;
}
