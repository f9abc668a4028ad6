//! forge::mock
//!
//! Mock repository host for deterministic testing.
//!
//! # Design
//!
//! The mock host serves repositories and commits from memory and allows
//! configuring per-repository failures and an artificial response delay.
//! It records every call and tracks how many calls were in flight at once,
//! which lets tests observe the batch fan-out.
//!
//! # Example
//!
//! ```
//! use repo_info_proxy::forge::mock::MockHost;
//! use repo_info_proxy::forge::RepoHost;
//! use repo_info_proxy::core::reference::CanonicalPath;
//!
//! # tokio_test::block_on(async {
//! let host = MockHost::new().with_repo(MockHost::sample_repo("octocat", "hello-world"));
//!
//! let meta = host
//!     .repository(&CanonicalPath::from_reference("octocat/hello-world"), None)
//!     .await
//!     .unwrap();
//! assert_eq!(meta.full_name, "octocat/hello-world");
//! # });
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{
    CommitDetail, CommitSignature, CommitSummary, Credential, HostError, RepoHost, RepoMetadata,
    RepoOwner,
};
use crate::core::reference::CanonicalPath;

/// Mock repository host.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    inner: Arc<Mutex<MockHostInner>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct MockHostInner {
    /// Repositories by canonical path.
    repos: HashMap<String, RepoMetadata>,
    /// Commit lists by (canonical path, branch).
    commits: HashMap<(String, String), Vec<CommitSummary>>,
    /// Metadata failures by canonical path.
    repo_failures: HashMap<String, HostError>,
    /// Commit-list failures by canonical path.
    commit_failures: HashMap<String, HostError>,
    /// Delay applied to every call.
    delay: Option<Duration>,
    /// Recorded calls.
    operations: Vec<MockOperation>,
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Repository {
        path: String,
        authenticated: bool,
    },
    LatestCommit {
        path: String,
        branch: String,
        authenticated: bool,
    },
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build plausible metadata for `owner/name` with `main` as default branch.
    pub fn sample_repo(owner: &str, name: &str) -> RepoMetadata {
        RepoMetadata {
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            description: Some(format!("The {} repository", name)),
            html_url: format!("https://github.com/{}/{}", owner, name),
            stargazers_count: 10,
            forks_count: 2,
            updated_at: Some("2024-01-01T00:00:00Z".to_string()),
            default_branch: "main".to_string(),
            owner: RepoOwner {
                login: owner.to_string(),
                avatar_url: format!("https://avatars.example.com/{}", owner),
                html_url: format!("https://github.com/{}", owner),
            },
        }
    }

    /// Build a commit with the given message and committer date.
    pub fn sample_commit(full_name: &str, message: &str, date: Option<&str>) -> CommitSummary {
        CommitSummary {
            html_url: format!("https://github.com/{}/commit/0123abc", full_name),
            commit: CommitDetail {
                message: message.to_string(),
                committer: Some(CommitSignature {
                    date: date.map(str::to_string),
                }),
            },
        }
    }

    /// Register a repository (keyed by its `full_name`).
    pub fn with_repo(self, repo: RepoMetadata) -> Self {
        self.lock().repos.insert(repo.full_name.clone(), repo);
        self
    }

    /// Register the commit list for a branch.
    pub fn with_commits(self, path: &str, branch: &str, commits: Vec<CommitSummary>) -> Self {
        self.lock()
            .commits
            .insert((path.to_string(), branch.to_string()), commits);
        self
    }

    /// Make the metadata call for `path` fail.
    pub fn fail_repository(self, path: &str, error: HostError) -> Self {
        self.lock().repo_failures.insert(path.to_string(), error);
        self
    }

    /// Make the commit-list call for `path` fail.
    pub fn fail_commits(self, path: &str, error: HostError) -> Self {
        self.lock().commit_failures.insert(path.to_string(), error);
        self
    }

    /// Delay every call by `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// All recorded calls, in order.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockHostInner> {
        // A panicking test thread must not poison every later assertion
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn enter(&self, op: MockOperation) -> InFlightGuard {
        let delay = {
            let mut inner = self.lock();
            inner.operations.push(op);
            inner.delay
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        guard
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RepoHost for MockHost {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn repository(
        &self,
        path: &CanonicalPath,
        credential: Option<&Credential>,
    ) -> Result<RepoMetadata, HostError> {
        let _guard = self
            .enter(MockOperation::Repository {
                path: path.to_string(),
                authenticated: credential.is_some(),
            })
            .await;

        let inner = self.lock();
        if let Some(err) = inner.repo_failures.get(path.as_str()) {
            return Err(err.clone());
        }
        inner
            .repos
            .get(path.as_str())
            .cloned()
            .ok_or(HostError::Status { status: 404 })
    }

    async fn latest_commit(
        &self,
        path: &CanonicalPath,
        branch: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<CommitSummary>, HostError> {
        let _guard = self
            .enter(MockOperation::LatestCommit {
                path: path.to_string(),
                branch: branch.to_string(),
                authenticated: credential.is_some(),
            })
            .await;

        let inner = self.lock();
        if let Some(err) = inner.commit_failures.get(path.as_str()) {
            return Err(err.clone());
        }
        Ok(inner
            .commits
            .get(&(path.to_string(), branch.to_string()))
            .and_then(|commits| commits.first().cloned()))
    }
}
