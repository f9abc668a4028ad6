//! lookup command - Look up repositories from the command line
//!
//! Prints exactly what the HTTP routes would return: the single-lookup
//! record for one reference, the batch mapping for several.

use anyhow::{bail, Result};

use crate::core::config::{Config, Overrides, Settings};
use crate::forge::github::GitHubHost;
use crate::lookup::{fetch_batch, fetch_repo_info};

/// Run the lookup command.
///
/// Fails (after printing) if any lookup came back degraded.
pub fn lookup(
    config: &Config,
    repos: &[String],
    api_base: Option<String>,
    no_auth: bool,
) -> Result<()> {
    let overrides = Overrides {
        api_base,
        ..Default::default()
    };
    let settings = Settings::resolve(config, &overrides)?;
    let host = GitHubHost::from_settings(&settings)?;
    let credential = if no_auth {
        None
    } else {
        settings.credential.as_ref()
    };

    let rt = tokio::runtime::Runtime::new()?;
    let (output, failed) = rt.block_on(async {
        if let [repo] = repos {
            let result = fetch_repo_info(&host, repo, credential).await;
            let failed = usize::from(!result.is_found());
            (serde_json::to_string_pretty(&result), failed)
        } else {
            let results = fetch_batch(&host, repos, credential, settings.max_concurrency).await;
            let failed = results.values().filter(|r| !r.is_found()).count();
            (serde_json::to_string_pretty(&results), failed)
        }
    });

    println!("{}", output?);

    if failed > 0 {
        bail!("{} of {} lookups failed", failed, repos.len());
    }
    Ok(())
}
