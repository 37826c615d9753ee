//! Config command - View, change and validate the configuration file

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::info;

use kankasync_core::config::Config;

use super::CliContext;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "tags.refresh_interval_secs")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("vault.root", "Vault directory"),
    ("api.base_url", "Campaigns endpoint of the API"),
    ("api.token", "API token (prefer the environment variable)"),
    ("rate_limiting.standard_requests_per_minute", "Standard campaign budget"),
    ("rate_limiting.boosted_requests_per_minute", "Boosted campaign budget"),
    ("rate_limiting.refill_interval_secs", "Seconds between refills"),
    ("tags.refresh_interval_secs", "Seconds between tag listings"),
    ("logging.level", "trace|debug|info|warn|error"),
];

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Path => {
                println!("{}", ctx.config_path.display());
                Ok(())
            }
        }
    }

    fn execute_show(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = masked(ctx.load_config());

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");
            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    fn execute_set(&self, ctx: &CliContext, key: &str, value: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let mut config = ctx.load_config();

        info!(key = %key, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            formatter.error(&format!("Failed to set '{key}': {e:#}"));
            if !ctx.is_json() {
                formatter.info("");
                formatter.info("Supported keys:");
                for (key, help) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {key:<45} - {help}"));
                }
            }
            bail!("configuration unchanged");
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.error(&format!("Invalid value for '{key}': {}", messages.join("; ")));
            bail!("configuration unchanged");
        }

        if let Some(parent) = ctx.config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(&ctx.config_path, yaml).context("Failed to write configuration file")?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {key}"));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }
        Ok(())
    }

    fn execute_validate(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let path = &ctx.config_path;

        let config = match Config::load(path) {
            Ok(config) => config,
            Err(e) if !path.exists() => {
                formatter.error(&format!("Configuration file not found at {}", path.display()));
                return Err(e.context("configuration file missing"));
            }
            Err(e) => {
                formatter.error(&format!("Failed to parse configuration: {e:#}"));
                return Err(e);
            }
        };

        info!(config_path = %path.display(), "Validating configuration");
        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!("invalid configuration")
        }
    }
}

/// Replaces the API token with a placeholder for display
fn masked(mut config: Config) -> Config {
    if config.api.token.is_some() {
        config.api.token = Some("********".to_string());
    }
    config
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .context("Expected a positive integer")
}

/// Applies a dot-notation key/value pair to a Config
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "vault.root" => config.vault.root = PathBuf::from(value),
        "api.base_url" => config.api.base_url = value.trim_end_matches('/').to_string(),
        "api.token" => config.api.token = Some(value.to_string()).filter(|t| !t.is_empty()),
        "rate_limiting.standard_requests_per_minute" => {
            config.rate_limiting.standard_requests_per_minute = parse_number(value)?;
        }
        "rate_limiting.boosted_requests_per_minute" => {
            config.rate_limiting.boosted_requests_per_minute = parse_number(value)?;
        }
        "rate_limiting.refill_interval_secs" => {
            config.rate_limiting.refill_interval_secs = parse_number(value)?;
        }
        "tags.refresh_interval_secs" => {
            config.tags.refresh_interval_secs = parse_number(value)?;
        }
        "logging.level" => config.logging.level = value.to_lowercase(),
        _ => bail!("Unknown configuration key '{key}'"),
    }
    Ok(())
}
