//! KankaRemoteClient - IRemoteClient implementation for the Kanka API
//!
//! Wraps the [`KankaClient`] and delegates to the client and pages
//! modules to fulfil the [`IRemoteClient`] port contract.
//!
//! ## Design Notes
//!
//! - No retry or backoff happens here; request pacing is the sync engine's
//!   rate limiter's job.
//! - Create/update return non-success statuses in the response instead of
//!   failing, listing fails on them.

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use kankasync_core::domain::{AccountId, RemoteId};
use kankasync_core::ports::{CampaignInfo, IRemoteClient, ListPage, RemoteResponse, Resource};

use crate::client::KankaClient;
use crate::pages;

/// Remote client implementation backed by the Kanka REST API
pub struct KankaRemoteClient {
    client: KankaClient,
}

impl KankaRemoteClient {
    /// Creates a new `KankaRemoteClient` wrapping the given [`KankaClient`]
    pub fn new(client: KankaClient) -> Self {
        Self { client }
    }

    /// Returns the wrapped client
    pub fn client(&self) -> &KankaClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteClient for KankaRemoteClient {
    /// Fetches one page of a collection
    ///
    /// Delegates to [`pages::get_page`].
    async fn list(
        &self,
        account: AccountId,
        resource: &Resource,
        cursor: Option<&str>,
    ) -> Result<ListPage> {
        debug!(%account, %resource, has_cursor = cursor.is_some(), "KankaRemoteClient::list");
        pages::get_page(&self.client, account, resource, cursor).await
    }

    /// Creates a record
    ///
    /// Delegates to [`KankaClient::create`].
    async fn create(
        &self,
        account: AccountId,
        resource: &Resource,
        body: &Value,
    ) -> Result<RemoteResponse> {
        debug!(%account, %resource, "KankaRemoteClient::create");
        self.client.create(account, resource, body).await
    }

    /// Updates a record
    ///
    /// Delegates to [`KankaClient::update`].
    async fn update(
        &self,
        account: AccountId,
        resource: &Resource,
        id: RemoteId,
        body: &Value,
    ) -> Result<RemoteResponse> {
        debug!(%account, %resource, %id, "KankaRemoteClient::update");
        self.client.update(account, resource, id, body).await
    }

    /// Lists the campaigns visible to the token
    ///
    /// Delegates to [`pages::list_campaigns`].
    async fn list_campaigns(&self) -> Result<Vec<CampaignInfo>> {
        debug!("KankaRemoteClient::list_campaigns");
        pages::list_campaigns(&self.client).await
    }
}
