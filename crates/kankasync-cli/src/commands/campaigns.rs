//! Campaigns command - List campaigns visible to the API token

use anyhow::{Context, Result};
use clap::Args;

use kankasync_core::config::Config;
use kankasync_core::ports::{CampaignInfo, IRemoteClient};

use super::{remote_client, CliContext};

#[derive(Debug, Args)]
pub struct CampaignsCommand {}

/// Pairs each campaign with the vault folder configured for it
fn with_local_paths<'a>(
    campaigns: &'a [CampaignInfo],
    config: &'a Config,
) -> Vec<(&'a CampaignInfo, Option<&'a str>)> {
    campaigns
        .iter()
        .map(|campaign| {
            let path = config
                .accounts
                .iter()
                .find(|a| a.id == campaign.id.get())
                .map(|a| a.path.as_str());
            (campaign, path)
        })
        .collect()
}

impl CampaignsCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();
        let remote = remote_client(&config)?;

        let campaigns = remote
            .list_campaigns()
            .await
            .context("Failed to list campaigns")?;
        let rows = with_local_paths(&campaigns, &config);

        if ctx.is_json() {
            let json: Vec<serde_json::Value> = rows
                .iter()
                .map(|(c, path)| {
                    serde_json::json!({
                        "id": c.id.get(),
                        "name": c.name,
                        "boosted": c.boosted,
                        "path": path,
                    })
                })
                .collect();
            formatter.print_json(&serde_json::Value::Array(json));
            return Ok(());
        }

        formatter.success(&format!("{} campaign(s)", campaigns.len()));
        for (campaign, path) in rows {
            let tier = if campaign.boosted { "boosted" } else { "standard" };
            let local = path.map_or_else(|| "not configured".to_string(), |p| format!("-> {p}"));
            formatter.info(&format!(
                "{:>8}  {} [{tier}] {local}",
                campaign.id.get(),
                campaign.name
            ));
        }
        Ok(())
    }
}
