//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this configuration file
//! - `--debug`: Enable debug logging
//! - `--log-format <text|json>`: Log output format

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// repo-info-proxy - GitHub repository metadata for static sites
#[derive(Parser, Debug)]
#[command(name = "repo-info-proxy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: searched in standard locations)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP middleware
    #[command(
        name = "serve",
        long_about = "Run the HTTP middleware.\n\n\
            Serves POST /api/repos-info (batch lookup) and GET /api/repo-info \
            (single lookup). Every other request is forwarded unchanged to the \
            downstream origin, or answered with 404 when none is configured.\n\n\
            The upstream token is read once at startup from the environment \
            variable named by upstream.token_env (default GITHUB_TOKEN).",
        after_help = "\
EXAMPLES:
    # Serve on the default address
    GITHUB_TOKEN=ghp_xxx repo-info-proxy serve

    # Put the lookups in front of a static site
    repo-info-proxy serve --listen 0.0.0.0:8080 --downstream http://127.0.0.1:3000

    # JSON logs for a log shipper
    repo-info-proxy serve --log-format json"
    )]
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long, value_name = "ADDR")]
        listen: Option<SocketAddr>,

        /// Origin that unmatched requests are forwarded to (overrides config)
        #[arg(long, value_name = "URL")]
        downstream: Option<String>,

        /// Upstream API base URL (overrides config)
        #[arg(long, value_name = "URL")]
        api_base: Option<String>,
    },

    /// Look up repositories from the command line
    #[command(
        name = "lookup",
        long_about = "Look up one or more repositories and print the JSON the \
            HTTP routes would return.\n\n\
            With one reference the single-lookup record is printed; with several, \
            the batch mapping. Exits non-zero if any lookup failed.",
        after_help = "\
EXAMPLES:
    repo-info-proxy lookup rust-lang/rust
    repo-info-proxy lookup https://github.com/tokio-rs/axum.git serde-rs/serde"
    )]
    Lookup {
        /// Repository references (owner/name or GitHub URLs)
        #[arg(required = true, value_name = "REPO")]
        repos: Vec<String>,

        /// Upstream API base URL (overrides config)
        #[arg(long, value_name = "URL")]
        api_base: Option<String>,

        /// Do not send the configured credential
        #[arg(long)]
        no_auth: bool,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Supported shells for completion
#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
