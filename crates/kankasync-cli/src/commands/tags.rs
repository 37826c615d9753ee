//! Tags command - List a campaign's tags as the sync sees them

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use kankasync_core::domain::AccountId;
use kankasync_core::ports::SystemClock;
use kankasync_sync::tag_cache::{RefreshOutcome, TagCache};

use super::{remote_client, CliContext};

#[derive(Debug, Args)]
pub struct TagsCommand {
    /// Campaign id
    pub account: u64,
}

impl TagsCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();
        let remote = Arc::new(remote_client(&config)?);
        let account = AccountId::new(self.account);

        let cache = TagCache::new(
            remote,
            Arc::new(SystemClock),
            chrono::Duration::seconds(config.tags.refresh_interval_secs as i64),
        );
        if cache.refresh(account).await == RefreshOutcome::Failed {
            formatter.error(&format!("Could not list the tags of campaign {account}"));
            return Ok(());
        }
        let tags = cache.snapshot(account);

        if ctx.is_json() {
            let map: serde_json::Map<String, serde_json::Value> = tags
                .iter()
                .map(|(name, id)| (name.clone(), id.get().into()))
                .collect();
            formatter.print_json(&serde_json::json!({
                "account": self.account,
                "tags": map,
            }));
        } else {
            formatter.success(&format!("{} tag(s) in campaign {account}", tags.len()));
            for (name, id) in &tags {
                formatter.info(&format!("{:>8}  {name}", id.get()));
            }
        }
        Ok(())
    }
}
