//! core::config::schema
//!
//! Configuration file schema.
//!
//! Every field is optional; defaults are applied by the accessors on
//! [`super::Config`]. Unknown fields are rejected so typos surface at
//! startup instead of being silently ignored.
//!
//! # Validation
//!
//! Values are validated after parsing (addresses parse, URLs are absolute
//! http(s) URLs, limits are non-zero).

use std::net::SocketAddr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// listen = "0.0.0.0:8787"
///
/// [upstream]
/// api_base = "https://api.github.com"
/// token_env = "GITHUB_TOKEN"
///
/// [cache]
/// max_age_secs = 3600
///
/// [lookup]
/// max_concurrency = 16
///
/// [routes]
/// single_credential = false
///
/// [downstream]
/// url = "http://127.0.0.1:3000"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Socket address to listen on
    pub listen: Option<String>,

    /// Upstream API settings
    pub upstream: Option<UpstreamConfig>,

    /// Response caching headers
    pub cache: Option<CacheConfig>,

    /// Batch lookup settings
    pub lookup: Option<LookupConfig>,

    /// Per-route credential forwarding
    pub routes: Option<RoutesConfig>,

    /// Where unmatched requests go
    pub downstream: Option<DownstreamConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(listen) = &self.listen {
            listen.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue(format!("invalid listen address '{}': {}", listen, e))
            })?;
        }
        if let Some(upstream) = &self.upstream {
            upstream.validate()?;
        }
        if let Some(lookup) = &self.lookup {
            lookup.validate()?;
        }
        if let Some(downstream) = &self.downstream {
            downstream.validate()?;
        }
        Ok(())
    }
}

/// Upstream repository-hosting API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// API base URL (e.g. a GitHub Enterprise `/api/v3` endpoint)
    pub api_base: Option<String>,

    /// User-Agent sent on every upstream request
    pub user_agent: Option<String>,

    /// Environment variable holding the bearer token
    pub token_env: Option<String>,

    /// Per-request timeout in seconds (no timeout when unset)
    pub timeout_secs: Option<u64>,
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.api_base {
            validate_http_url("upstream.api_base", base)?;
        }
        if let Some(agent) = &self.user_agent {
            if agent.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "upstream.user_agent cannot be empty".into(),
                ));
            }
        }
        if let Some(var) = &self.token_env {
            if var.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "upstream.token_env cannot be empty".into(),
                ));
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "upstream.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Cache header settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// `max-age` for successful responses
    pub max_age_secs: Option<u64>,
}

/// Batch lookup settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    /// Maximum lookups in flight per batch (unbounded when unset)
    pub max_concurrency: Option<usize>,
}

impl LookupConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::InvalidValue(
                "lookup.max_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Which routes forward the configured credential upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Forward on `POST /api/repos-info` (default: true)
    pub bulk_credential: Option<bool>,

    /// Forward on `GET /api/repo-info` (default: true)
    pub single_credential: Option<bool>,
}

/// Downstream handler for unmatched paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DownstreamConfig {
    /// Origin that unmatched requests are forwarded to
    pub url: Option<String>,
}

impl DownstreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            validate_http_url("downstream.url", url)?;
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidValue(format!("invalid {} '{}': {}", field, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue(format!(
            "invalid {} '{}': unsupported scheme '{}'",
            field, value, other
        ))),
    }
}
