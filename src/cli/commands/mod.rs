//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! `serve` and `lookup` do network I/O. Each builds its own tokio runtime
//! and blocks on the async implementation, keeping dispatch synchronous.

mod completion;
mod lookup;
mod serve;

pub use completion::completion;
pub use lookup::lookup;
pub use serve::serve;

use anyhow::Result;

use super::args::{Cli, Command};
use crate::core::config::{Config, Overrides};

/// Dispatch a parsed command line to its handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve {
            listen,
            downstream,
            api_base,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let overrides = Overrides {
                listen,
                api_base,
                downstream_url: downstream,
            };
            serve::serve(&config, &overrides)
        }
        Command::Lookup {
            repos,
            api_base,
            no_auth,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            lookup::lookup(&config, &repos, api_base, no_auth)
        }
        Command::Completion { shell } => completion::completion(shell),
    }
}
