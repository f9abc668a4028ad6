//! serve command - Run the HTTP middleware

use anyhow::Result;
use tracing::info;

use crate::core::config::{Config, Overrides, Settings};
use crate::server;

/// Resolve settings and run the server until shutdown.
pub fn serve(config: &Config, overrides: &Overrides) -> Result<()> {
    let settings = Settings::resolve(config, overrides)?;

    match config.loaded_from() {
        Some(path) => info!(config = %path.display(), "loaded configuration"),
        None => info!("no configuration file found, using defaults"),
    }
    if settings.credential.is_none() {
        info!(
            token_env = config.token_env(),
            "no upstream credential configured, using unauthenticated rate limits"
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::serve(settings))
}
