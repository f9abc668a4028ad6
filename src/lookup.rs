//! lookup
//!
//! Repository lookups: one repository, or a batch fanned out concurrently.
//!
//! # Single Lookup
//!
//! [`fetch_repo_info`] normalizes the reference, fetches metadata, then the
//! latest commit on the default branch, and merges the two. It never fails:
//! any error becomes a [`RepoLookup::Failed`] record naming the reference
//! exactly as supplied.
//!
//! # Batch Lookup
//!
//! [`fetch_batch`] runs one lookup per distinct reference and waits for all
//! of them. Failures are values, so one bad repository neither cancels nor
//! delays its siblings. The optional limit caps how many lookups are in
//! flight at once; without it every reference is looked up concurrently.

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::core::reference::CanonicalPath;
use crate::core::types::{
    BatchResult, LookupFailure, OwnerInfo, RepoLookup, RepositoryInfo,
};
use crate::forge::{CommitSummary, Credential, HostError, RepoHost, RepoMetadata};

/// Look up one repository.
///
/// # Example
///
/// ```
/// use repo_info_proxy::forge::mock::MockHost;
/// use repo_info_proxy::lookup::fetch_repo_info;
///
/// # tokio_test::block_on(async {
/// let host = MockHost::new();
/// let result = fetch_repo_info(&host, "https://github.com/octocat/missing", None).await;
/// assert_eq!(result.error(), Some("GitHub API error: 404"));
/// # });
/// ```
pub async fn fetch_repo_info(
    host: &dyn RepoHost,
    reference: &str,
    credential: Option<&Credential>,
) -> RepoLookup {
    match try_fetch(host, reference, credential).await {
        Ok(info) => info.into(),
        Err(err) => {
            warn!(host = host.name(), %reference, error = %err, "repository lookup failed");
            LookupFailure::new(reference, err.to_string()).into()
        }
    }
}

async fn try_fetch(
    host: &dyn RepoHost,
    reference: &str,
    credential: Option<&Credential>,
) -> Result<RepositoryInfo, HostError> {
    let path = CanonicalPath::from_reference(reference);
    debug!(%reference, %path, "looking up repository");

    let meta = host.repository(&path, credential).await?;
    let commit = host
        .latest_commit(&path, &meta.default_branch, credential)
        .await?;

    Ok(assemble(meta, commit))
}

/// Merge repository metadata with its latest commit.
fn assemble(meta: RepoMetadata, commit: Option<CommitSummary>) -> RepositoryInfo {
    let last_updated = commit
        .as_ref()
        .and_then(|c| c.committer_date())
        .map(str::to_string)
        .or(meta.updated_at);
    let (last_commit_message, last_commit_url) = match commit {
        Some(c) => (c.commit.message, c.html_url),
        None => (String::new(), String::new()),
    };

    RepositoryInfo {
        name: meta.name,
        full_name: meta.full_name,
        description: meta.description,
        url: meta.html_url,
        stars: meta.stargazers_count,
        forks: meta.forks_count,
        last_updated,
        last_commit_message,
        last_commit_url,
        owner: OwnerInfo {
            login: meta.owner.login,
            avatar_url: meta.owner.avatar_url,
            url: meta.owner.html_url,
        },
    }
}

/// Look up many repositories concurrently.
///
/// Returns one entry per distinct input reference, keyed by the reference
/// as supplied. `limit` caps concurrent lookups (`None` = unbounded).
pub async fn fetch_batch<S: AsRef<str>>(
    host: &dyn RepoHost,
    references: &[S],
    credential: Option<&Credential>,
    limit: Option<usize>,
) -> BatchResult {
    // Keys are owned: the batch future must stay Send for spawned callers
    let unique: BTreeSet<String> = references
        .iter()
        .map(|r| r.as_ref().to_string())
        .collect();
    let limit = limit.unwrap_or(unique.len()).max(1);
    debug!(count = unique.len(), limit, "starting batch lookup");

    stream::iter(unique)
        .map(|reference: String| async move {
            let result = fetch_repo_info(host, &reference, credential).await;
            (reference, result)
        })
        .buffer_unordered(limit)
        .collect()
        .await
}
