//! core::reference
//!
//! Repository reference normalization.
//!
//! # Accepted Forms
//!
//! Callers hand us loosely formatted repository references:
//! - `owner/name`
//! - `https://github.com/owner/name`
//! - `https://github.com/owner/name.git`
//! - `https://github.com/owner/name/`
//! - `https://github.com/owner/name/tree/<branch>`
//!
//! All of them reduce to the canonical `owner/name` path segment used to
//! address the repository in the upstream API.
//!
//! Normalization is best effort. Input that matches none of the patterns is
//! returned unchanged and the upstream call is left to reject it.

use std::fmt;

const GITHUB_HOST_PREFIX: &str = "github.com/";

/// Normalize a repository reference into an `owner/name` path.
///
/// Steps, applied in order (each is a no-op when its pattern is absent):
/// 1. Strip a leading `http://` / `https://` plus `github.com/`
/// 2. Strip a trailing `.git`
/// 3. Strip a trailing `/`
/// 4. Truncate at `/tree/`
///
/// # Example
///
/// ```
/// use repo_info_proxy::core::reference::normalize;
///
/// assert_eq!(normalize("https://github.com/rust-lang/rust.git"), "rust-lang/rust");
/// assert_eq!(normalize("https://github.com/tokio-rs/axum/tree/main"), "tokio-rs/axum");
/// assert_eq!(normalize("serde-rs/serde"), "serde-rs/serde");
/// ```
pub fn normalize(reference: &str) -> String {
    let mut path = reference;

    if path.contains(GITHUB_HOST_PREFIX) {
        path = strip_host(path);
    }

    path = path.strip_suffix(".git").unwrap_or(path);
    path = path.strip_suffix('/').unwrap_or(path);

    if let Some(idx) = path.find("/tree/") {
        path = &path[..idx];
    }

    path.to_string()
}

/// Strip `[http[s]://]github.com/` from the front of `url`.
///
/// Leaves the input untouched unless the host directly follows the
/// (optional) scheme.
fn strip_host(url: &str) -> &str {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    match without_scheme.strip_prefix(GITHUB_HOST_PREFIX) {
        Some(rest) => rest,
        None => url,
    }
}

/// A normalized `owner/name` repository path.
///
/// Produced from a raw reference via [`CanonicalPath::from_reference`].
/// Because normalization never rejects input, the path is not guaranteed to
/// name a real repository; the upstream API decides that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// Normalize a raw reference.
    pub fn from_reference(reference: &str) -> Self {
        Self(normalize(reference))
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The owner segment, if the path has the `owner/name` shape.
    pub fn owner(&self) -> Option<&str> {
        self.0.split_once('/').map(|(owner, _)| owner)
    }

    /// The repository name segment, if the path has the `owner/name` shape.
    pub fn name(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, name)| name)
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
