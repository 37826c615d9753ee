//! Paginated listing for Kanka collections
//!
//! Kanka wraps collections in `{"data": [...], "links": {"next": ...}}`.
//! The `next` link is an absolute URL carrying the page cursor; it is
//! absent (or null) on the last page.
//!
//! ## Listing Flow
//!
//! 1. **First page**: call [`get_page`] with `cursor = None`
//! 2. **Follow pages**: pass the returned `next_page` back as the cursor
//! 3. **Stop** when `next_page` is `None`
//!
//! [`list_campaigns`] runs this loop itself for the campaign index.

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use kankasync_core::domain::{AccountId, EntityResponse};
use kankasync_core::ports::{CampaignInfo, ListPage, Resource};

use crate::{client::KankaClient, ApiError};

// ============================================================================
// Kanka API response types (JSON deserialization)
// ============================================================================

/// Raw collection page
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct RawPage<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    links: Option<RawLinks>,
}

/// Pagination links of a collection page
#[derive(Debug, Default, Deserialize)]
struct RawLinks {
    #[serde(default)]
    next: Option<String>,
}

impl<T> RawPage<T> {
    fn next_link(&self) -> Option<String> {
        self.links
            .as_ref()
            .and_then(|l| l.next.clone())
            .filter(|next| !next.is_empty())
    }
}

/// Campaign record from `GET {base}`
#[derive(Debug, Deserialize)]
struct RawCampaign {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    boosted: Option<bool>,
    #[serde(default)]
    superboosted: Option<bool>,
    #[serde(default)]
    premium: Option<bool>,
}

impl From<RawCampaign> for CampaignInfo {
    fn from(raw: RawCampaign) -> Self {
        let boosted = raw.boosted.unwrap_or(false)
            || raw.superboosted.unwrap_or(false)
            || raw.premium.unwrap_or(false);
        CampaignInfo {
            id: AccountId::new(raw.id),
            name: raw.name,
            boosted,
        }
    }
}

// ============================================================================
// Page fetching
// ============================================================================

/// Sends a listing request and decodes the page
async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<RawPage<T>> {
    let response = request
        .send()
        .await
        .context("Failed to send list request")?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, text).into());
    }

    let text = response
        .text()
        .await
        .context("Failed to read list response body")?;
    serde_json::from_str(&text)
        .map_err(|e| ApiError::InvalidResponse(e.to_string()).into())
}

/// Fetches one page of an account collection
///
/// # Arguments
/// * `client` - Authenticated client
/// * `account` - Campaign whose collection is listed
/// * `resource` - Collection to list
/// * `cursor` - Absolute `links.next` URL from the previous page, or `None`
///
/// # Errors
/// Fails on transport errors, non-success statuses and malformed bodies.
pub async fn get_page(
    client: &KankaClient,
    account: AccountId,
    resource: &Resource,
    cursor: Option<&str>,
) -> Result<ListPage> {
    let request = match cursor {
        Some(url) => client.request_url(Method::GET, url),
        None => {
            let path = KankaClient::resource_path(account, resource, None)?;
            client.request(Method::GET, &path)
        }
    };

    let page: RawPage<EntityResponse> = fetch(request)
        .await
        .with_context(|| format!("Failed to list {resource} for campaign {account}"))?;
    let next_page = page.next_link();

    debug!(
        %account,
        %resource,
        items = page.data.len(),
        has_next = next_page.is_some(),
        "Received collection page"
    );

    Ok(ListPage {
        items: page.data,
        next_page,
    })
}

/// Lists every campaign visible to the credential, following all pages
pub async fn list_campaigns(client: &KankaClient) -> Result<Vec<CampaignInfo>> {
    let mut campaigns = Vec::new();
    let mut page: RawPage<RawCampaign> = fetch(client.request(Method::GET, ""))
        .await
        .context("Failed to list campaigns")?;
    let mut page_count: u32 = 1;

    loop {
        let next = page.next_link();
        campaigns.extend(page.data.into_iter().map(CampaignInfo::from));

        let Some(next) = next else { break };
        page = fetch(client.request_url(Method::GET, &next))
            .await
            .context("Failed to list campaigns")?;
        page_count += 1;
    }

    debug!(campaigns = campaigns.len(), pages = page_count, "Listed campaigns");
    Ok(campaigns)
}

// ============================================================================
// Tests
// ============================================================================
