//! core::config
//!
//! Configuration schema, loading, and the resolved runtime settings.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags ([`Overrides`])
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `--config <path>` (must exist)
//! 2. `$REPO_INFO_PROXY_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/repo-info-proxy/config.toml`
//! 4. `~/.repo-info-proxy/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Settings
//!
//! [`Settings`] is the immutable, fully resolved view built once at startup
//! and shared read-only with every request. The upstream credential is read
//! from the environment at that point and never again.
//!
//! # Example
//!
//! ```no_run
//! use repo_info_proxy::core::config::{Config, Overrides, Settings};
//!
//! let config = Config::load(None).unwrap();
//! let settings = Settings::resolve(&config, &Overrides::default()).unwrap();
//! println!("listening on {}", settings.listen);
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::forge::Credential;

/// Default listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8787";

/// Default upstream API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default User-Agent for upstream requests.
pub const DEFAULT_USER_AGENT: &str = "repo-info-proxy";

/// Default environment variable holding the upstream token.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Default `max-age` for successful responses (one hour).
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 3600;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "REPO_INFO_PROXY_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Configuration as loaded from disk.
///
/// Accessors apply defaults for anything the file leaves out.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: FileConfig,
    /// Path the file was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the standard locations are
    /// searched and defaults are used when nothing is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::discover() {
            Some(path) => Self::from_file(&path),
            None => Ok(Config::default()),
        }
    }

    /// Read and validate a specific config file.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: FileConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Config {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file in the standard locations.
    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("repo-info-proxy/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".repo-info-proxy/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ========== Accessors (with defaults) ==========

    pub fn listen(&self) -> &str {
        self.file.listen.as_deref().unwrap_or(DEFAULT_LISTEN)
    }

    pub fn api_base(&self) -> &str {
        self.file
            .upstream
            .as_ref()
            .and_then(|u| u.api_base.as_deref())
            .unwrap_or(DEFAULT_API_BASE)
    }

    pub fn user_agent(&self) -> &str {
        self.file
            .upstream
            .as_ref()
            .and_then(|u| u.user_agent.as_deref())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn token_env(&self) -> &str {
        self.file
            .upstream
            .as_ref()
            .and_then(|u| u.token_env.as_deref())
            .unwrap_or(DEFAULT_TOKEN_ENV)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.file
            .upstream
            .as_ref()
            .and_then(|u| u.timeout_secs)
            .map(Duration::from_secs)
    }

    pub fn cache_max_age_secs(&self) -> u64 {
        self.file
            .cache
            .as_ref()
            .and_then(|c| c.max_age_secs)
            .unwrap_or(DEFAULT_CACHE_MAX_AGE_SECS)
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.file.lookup.as_ref().and_then(|l| l.max_concurrency)
    }

    pub fn bulk_credential(&self) -> bool {
        self.file
            .routes
            .as_ref()
            .and_then(|r| r.bulk_credential)
            .unwrap_or(true)
    }

    pub fn single_credential(&self) -> bool {
        self.file
            .routes
            .as_ref()
            .and_then(|r| r.single_credential)
            .unwrap_or(true)
    }

    pub fn downstream_url(&self) -> Option<&str> {
        self.file.downstream.as_ref().and_then(|d| d.url.as_deref())
    }
}

/// CLI flag overrides applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    pub api_base: Option<String>,
    pub downstream_url: Option<String>,
}

/// Fully resolved, immutable runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Socket address to listen on
    pub listen: SocketAddr,
    /// Upstream API base URL (no trailing slash)
    pub api_base: String,
    /// User-Agent for upstream requests
    pub user_agent: String,
    /// Upstream request timeout
    pub timeout: Option<Duration>,
    /// `max-age` for successful responses
    pub cache_max_age_secs: u64,
    /// Cap on concurrent lookups per batch
    pub max_concurrency: Option<usize>,
    /// Forward the credential on the bulk route
    pub bulk_credential: bool,
    /// Forward the credential on the single route
    pub single_credential: bool,
    /// Origin for unmatched requests
    pub downstream_url: Option<String>,
    /// Upstream bearer credential
    pub credential: Option<Credential>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8787)),
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            max_concurrency: None,
            bulk_credential: true,
            single_credential: true,
            downstream_url: None,
            credential: None,
        }
    }
}

impl Settings {
    /// Resolve settings from a loaded config plus CLI overrides.
    ///
    /// Reads the credential from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the listen address or an
    /// overridden URL is invalid.
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Settings, ConfigError> {
        let listen = match overrides.listen {
            Some(addr) => addr,
            None => config.listen().parse().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "invalid listen address '{}': {}",
                    config.listen(),
                    e
                ))
            })?,
        };

        let api_base = overrides
            .api_base
            .clone()
            .unwrap_or_else(|| config.api_base().to_string());
        let downstream_url = overrides
            .downstream_url
            .clone()
            .or_else(|| config.downstream_url().map(str::to_string));

        // Re-validate anything the CLI may have overridden
        schema::UpstreamConfig {
            api_base: Some(api_base.clone()),
            ..Default::default()
        }
        .validate()?;
        schema::DownstreamConfig {
            url: downstream_url.clone(),
        }
        .validate()?;

        Ok(Settings {
            listen,
            api_base: api_base.trim_end_matches('/').to_string(),
            user_agent: config.user_agent().to_string(),
            timeout: config.timeout(),
            cache_max_age_secs: config.cache_max_age_secs(),
            max_concurrency: config.max_concurrency(),
            bulk_credential: config.bulk_credential(),
            single_credential: config.single_credential(),
            downstream_url,
            credential: Credential::from_env(config.token_env()),
        })
    }

    /// `Cache-Control` value for successful responses.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age_secs)
    }
}
