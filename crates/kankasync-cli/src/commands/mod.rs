//! Subcommand implementations and the wiring they share

pub mod campaigns;
pub mod completions;
pub mod config;
pub mod sync;
pub mod tags;

use std::path::PathBuf;

use anyhow::{bail, Result};

use kankasync_api::{client::KankaClient, provider::KankaRemoteClient};
use kankasync_core::config::{Config, TOKEN_ENV_VAR};
use kankasync_core::domain::Account;

use crate::output::{Formatter, OutputFormat};

/// Global options every command receives
#[derive(Debug, Clone)]
pub struct CliContext {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config_path: PathBuf,
}

impl CliContext {
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.format)
    }

    pub fn load_config(&self) -> Config {
        Config::load_or_default(&self.config_path)
    }
}

/// API token from the config file, falling back to the environment
pub fn resolve_token(config: &Config, env: Option<String>) -> Option<String> {
    config
        .api
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or(env.filter(|t| !t.trim().is_empty()))
}

/// Builds the remote client from the configured base URL and token
pub fn remote_client(config: &Config) -> Result<KankaRemoteClient> {
    let Some(token) = resolve_token(config, std::env::var(TOKEN_ENV_VAR).ok()) else {
        bail!("No API token configured. Set api.token or the {TOKEN_ENV_VAR} environment variable.");
    };
    Ok(KankaRemoteClient::new(KankaClient::with_base_url(
        token,
        config.api.base_url.clone(),
    )))
}

/// Configured accounts, narrowed to `ids` when any are given
pub fn select_accounts(config: &Config, ids: &[u64]) -> Result<Vec<Account>> {
    let accounts = config.accounts();
    if ids.is_empty() {
        return Ok(accounts);
    }
    let selected: Vec<Account> = accounts
        .into_iter()
        .filter(|a| ids.contains(&a.id().get()))
        .collect();
    if selected.len() != ids.len() {
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !selected.iter().any(|a| a.id().get() == **id))
            .map(u64::to_string)
            .collect();
        bail!("Unknown account id(s): {}", missing.join(", "));
    }
    Ok(selected)
}
