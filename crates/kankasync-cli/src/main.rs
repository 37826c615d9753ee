//! Kankasync CLI - Push a Markdown vault to Kanka campaigns
//!
//! Provides commands for:
//! - Syncing vault documents to their campaigns
//! - Inspecting campaigns and tags on the remote
//! - Viewing and editing the configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    campaigns::CampaignsCommand, completions::CompletionsCommand, config::ConfigCommand,
    sync::SyncCommand, tags::TagsCommand, CliContext,
};
use kankasync_core::config::Config;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "kankasync", version, about = "Sync a Markdown vault to Kanka campaigns")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Push vault documents to their campaigns
    Sync(SyncCommand),
    /// List the tags of a campaign
    Tags(TagsCommand),
    /// List campaigns visible to the API token
    Campaigns(CampaignsCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// RUST_LOG wins, then -v, then the configured level
fn log_filter(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let level = Config::load_or_default(&config_path).logging.level;

    let filter = log_filter(cli.verbose, &level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = CliContext {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        quiet: cli.quiet,
        config_path,
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Tags(cmd) => cmd.execute(&ctx).await,
        Commands::Campaigns(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(),
    }
}
