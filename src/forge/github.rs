//! forge::github
//!
//! GitHub implementation of [`RepoHost`] over the REST API.
//!
//! # Endpoints
//!
//! - `GET {api_base}/repos/{owner}/{name}` for metadata
//! - `GET {api_base}/repos/{owner}/{name}/commits?sha={branch}&per_page=1`
//!   for the latest commit
//!
//! Every request carries `Accept: application/vnd.github.v3+json`, a fixed
//! User-Agent, and `Authorization: Bearer <token>` when a credential is
//! supplied.
//!
//! # Rate Limiting
//!
//! There is no retry or backoff. A rate-limited response is just another
//! non-success status.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::traits::{CommitSummary, Credential, HostError, RepoHost, RepoMetadata};
use crate::core::config::{Settings, DEFAULT_API_BASE, DEFAULT_USER_AGENT};
use crate::core::reference::CanonicalPath;

/// Accept header value for API requests.
const ACCEPT_VALUE: &str = "application/vnd.github.v3+json";

/// GitHub repository host.
#[derive(Debug, Clone)]
pub struct GitHubHost {
    /// HTTP client for making requests
    client: Client,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
    /// `api_base` parsed, for building request URLs
    base_url: Url,
    /// User-Agent header value
    user_agent: HeaderValue,
}

impl GitHubHost {
    /// Create a host for the public GitHub API with default settings.
    pub fn new() -> Result<Self, HostError> {
        Self::with_options(DEFAULT_API_BASE, DEFAULT_USER_AGENT, None)
    }

    /// Create a host with a custom API base, User-Agent, and timeout.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Network` if the HTTP client cannot be built or
    /// the User-Agent is not a valid header value.
    pub fn with_options(
        api_base: impl Into<String>,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, HostError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HostError::Network(format!("failed to build HTTP client: {}", e)))?;
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| HostError::Network(format!("invalid user agent: {}", e)))?;
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let base_url = Url::parse(&api_base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| HostError::Network(format!("invalid API base URL: {}", api_base)))?;

        Ok(Self {
            client,
            api_base,
            base_url,
            user_agent,
        })
    }

    /// Create a host from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, HostError> {
        Self::with_options(&settings.api_base, &settings.user_agent, settings.timeout)
    }

    /// The API base URL in use.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build common headers for API requests.
    fn headers(&self, credential: Option<&Credential>) -> Result<HeaderMap, HostError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(USER_AGENT, self.user_agent.clone());
        if let Some(credential) = credential {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
                .map_err(|_| HostError::Network("credential is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    ///
    /// Every segment of `path` is percent-encoded on its own and dot
    /// segments are dropped, so a reference cannot leave `/repos/` or
    /// rewrite the query.
    fn repo_url(&self, path: &CanonicalPath, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("repos")
                .extend(
                    path.as_str()
                        .split('/')
                        .filter(|segment| !matches!(*segment, "." | "..")),
                )
                .extend(tail);
        }
        url
    }

    /// Send a GET and return the raw response.
    async fn get(
        &self,
        url: Url,
        query: &[(&str, &str)],
        credential: Option<&Credential>,
    ) -> Result<Response, HostError> {
        debug!(%url, "upstream request");
        self.client
            .get(url)
            .headers(self.headers(credential)?)
            .query(query)
            .send()
            .await
            .map_err(|e| HostError::Network(e.to_string()))
    }
}

/// Decode a successful response body.
async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T, HostError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| HostError::Network(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| HostError::Parse(e.to_string()))
}

#[async_trait]
impl RepoHost for GitHubHost {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn repository(
        &self,
        path: &CanonicalPath,
        credential: Option<&Credential>,
    ) -> Result<RepoMetadata, HostError> {
        let response = self.get(self.repo_url(path, &[]), &[], credential).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostError::Status {
                status: status.as_u16(),
            });
        }

        parse_body(response).await
    }

    async fn latest_commit(
        &self,
        path: &CanonicalPath,
        branch: &str,
        credential: Option<&Credential>,
    ) -> Result<Option<CommitSummary>, HostError> {
        let url = self.repo_url(path, &["commits"]);
        let response = self
            .get(url, &[("sha", branch), ("per_page", "1")], credential)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostError::CommitsStatus {
                status: status.as_u16(),
            });
        }

        let commits: Vec<CommitSummary> = parse_body(response).await?;
        Ok(commits.into_iter().next())
    }
}
