//! core::types
//!
//! Response records produced by repository lookups.
//!
//! # Shapes
//!
//! - [`RepositoryInfo`] - normalized metadata for one repository
//! - [`LookupFailure`] - the degraded record returned when a lookup fails
//! - [`RepoLookup`] - either of the above; what the fetcher always returns
//! - [`BatchResult`] - input reference to lookup, for the bulk route
//!
//! Both variants of [`RepoLookup`] serialize to flat JSON objects so that
//! batch responses stay uniform in shape. A failure looks like:
//!
//! ```json
//! { "name": "octocat/missing", "error": "GitHub API error: 404", "last_updated": null }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Repository name (without owner)
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    /// Repository description
    pub description: Option<String>,
    /// Web URL of the repository
    pub url: String,
    /// Stargazer count
    pub stars: u64,
    /// Fork count
    pub forks: u64,
    /// Committer date of the latest commit, else the repository's `updated_at`
    pub last_updated: Option<String>,
    /// Message of the latest commit on the default branch ("" if none)
    pub last_commit_message: String,
    /// Web URL of the latest commit ("" if none)
    pub last_commit_url: String,
    /// Repository owner
    pub owner: OwnerInfo,
}

/// Repository owner summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub login: String,
    pub avatar_url: String,
    pub url: String,
}

/// Degraded lookup result.
///
/// `name` is the reference exactly as the caller supplied it, not the
/// canonical path. `last_updated` is always `null` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupFailure {
    pub name: String,
    pub error: String,
    last_updated: (),
}

impl LookupFailure {
    /// Create a failure record for `reference`.
    pub fn new(reference: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: reference.into(),
            error: error.into(),
            last_updated: (),
        }
    }
}

/// Outcome of looking up a single repository.
///
/// Lookups never fail outright: errors are carried as data in
/// [`RepoLookup::Failed`] so one bad repository cannot fail a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepoLookup {
    /// Metadata was fetched successfully.
    Found(Box<RepositoryInfo>),
    /// The lookup failed; the record carries the error message.
    Failed(LookupFailure),
}

impl RepoLookup {
    /// Check if the lookup succeeded.
    pub fn is_found(&self) -> bool {
        matches!(self, RepoLookup::Found(_))
    }

    /// The error message, if the lookup failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            RepoLookup::Found(_) => None,
            RepoLookup::Failed(failure) => Some(&failure.error),
        }
    }

    /// Convert into a `Result`, for callers that want `?`.
    pub fn into_result(self) -> Result<RepositoryInfo, LookupFailure> {
        match self {
            RepoLookup::Found(info) => Ok(*info),
            RepoLookup::Failed(failure) => Err(failure),
        }
    }
}

impl From<RepositoryInfo> for RepoLookup {
    fn from(info: RepositoryInfo) -> Self {
        RepoLookup::Found(Box::new(info))
    }
}

impl From<LookupFailure> for RepoLookup {
    fn from(failure: LookupFailure) -> Self {
        RepoLookup::Failed(failure)
    }
}

/// Batch lookup results keyed by the exact input reference.
///
/// Duplicate references collapse to a single key.
pub type BatchResult = BTreeMap<String, RepoLookup>;
