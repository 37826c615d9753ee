//! Sync command - Push vault documents to their campaigns
//!
//! Provides the `kankasync sync` CLI command which:
//! 1. Loads and validates the configuration
//! 2. Creates the adapters (Kanka API client, filesystem store, renderer)
//! 3. Runs the orchestrator over the selected accounts and documents
//! 4. Prints per-document progress and a summary

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use kankasync_core::domain::DocumentPath;
use kankasync_core::ports::{IProgressReporter, NoopProgress, SystemClock};
use kankasync_sync::markdown::MarkdownRenderer;
use kankasync_sync::orchestrator::{BatchReport, DocumentResult};
use kankasync_sync::rate_limit::RateLimiterRegistry;
use kankasync_sync::store::FsDocumentStore;
use kankasync_sync::{SyncOrchestrator, TagCache};

use super::{remote_client, select_accounts, CliContext};
use crate::output::{status_glyph, ConsoleProgress};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Vault-relative documents to sync (default: every eligible document)
    pub paths: Vec<String>,

    /// Only sync these account ids (repeatable)
    #[arg(long = "account", short = 'a')]
    pub accounts: Vec<u64>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();

        let errors = config.validate();
        if !errors.is_empty() {
            for error in &errors {
                formatter.error(&error.to_string());
            }
            bail!("Configuration has {} error(s); run 'kankasync config validate'", errors.len());
        }

        let accounts = select_accounts(&config, &self.accounts)?;
        if accounts.is_empty() {
            formatter.warn("No accounts configured");
            return Ok(());
        }
        let only = self
            .paths
            .iter()
            .map(|p| DocumentPath::new(p.as_str()).with_context(|| format!("Invalid document path '{p}'")))
            .collect::<Result<Vec<_>>>()?;

        let remote = Arc::new(remote_client(&config)?);
        let store = Arc::new(FsDocumentStore::new(config.vault.root.clone()));
        let tags = Arc::new(TagCache::new(
            remote.clone(),
            Arc::new(SystemClock),
            chrono::Duration::seconds(config.tags.refresh_interval_secs as i64),
        ));
        let limiter = Arc::new(RateLimiterRegistry::from_config(&config.rate_limiting));
        let progress: Arc<dyn IProgressReporter> = if ctx.is_json() || ctx.quiet {
            Arc::new(NoopProgress)
        } else {
            Arc::new(ConsoleProgress)
        };

        let orchestrator = SyncOrchestrator::new(
            remote,
            store,
            Arc::new(MarkdownRenderer::new()),
            tags,
            limiter,
        )
        .with_progress(progress);

        info!(
            vault = %config.vault.root.display(),
            accounts = accounts.len(),
            "Starting sync"
        );
        let only = (!only.is_empty()).then_some(only.as_slice());
        let report = orchestrator.sync_accounts(&accounts, only).await;

        if ctx.is_json() {
            formatter.print_json(&report_json(&report));
        } else {
            print_report(&report, ctx);
        }
        Ok(())
    }
}

fn report_json(report: &BatchReport) -> serde_json::Value {
    let documents: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .map(|outcome| {
            let mut entry = serde_json::json!({
                "account": outcome.account.get(),
                "path": outcome.path.as_str(),
            });
            match &outcome.result {
                DocumentResult::Synced { entity_id, posts } => {
                    entry["status"] = "synced".into();
                    entry["entity_id"] = entity_id.get().into();
                    entry["posts"] = (*posts).into();
                }
                DocumentResult::Skipped => entry["status"] = "skipped".into(),
                DocumentResult::Failed { state, error } => {
                    entry["status"] = "failed".into();
                    entry["state"] = state.to_string().into();
                    entry["error"] = error.to_string().into();
                }
            }
            entry
        })
        .collect();

    serde_json::json!({
        "synced": report.synced(),
        "skipped": report.skipped(),
        "failed": report.failed(),
        "documents": documents,
        "empty_accounts": report.empty_accounts.iter().map(|a| a.get()).collect::<Vec<_>>(),
        "account_errors": report
            .account_errors
            .iter()
            .map(|(account, error)| serde_json::json!({"account": account.get(), "error": error}))
            .collect::<Vec<_>>(),
    })
}

fn print_report(report: &BatchReport, ctx: &CliContext) {
    let formatter = ctx.formatter();

    for account in &report.empty_accounts {
        formatter.warn(&format!("Account {account} has no documents to sync"));
    }
    for (account, error) in &report.account_errors {
        formatter.error(&format!("Account {account}: {error}"));
    }
    for outcome in report.failures() {
        if let DocumentResult::Failed { state, error } = &outcome.result {
            formatter.info(&format!(
                "{} {} (after {state}): {error}",
                status_glyph(outcome.result.status()),
                outcome.path
            ));
        }
    }

    if ctx.quiet && report.failed() == 0 {
        return;
    }
    let summary = format!(
        "{} synced, {} skipped, {} failed",
        report.synced(),
        report.skipped(),
        report.failed()
    );
    if report.failed() == 0 {
        formatter.success(&summary);
    } else {
        formatter.warn(&summary);
    }
}
