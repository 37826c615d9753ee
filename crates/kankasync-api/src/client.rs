//! Kanka API client
//!
//! Provides a typed HTTP client for the Kanka campaigns API. Handles the
//! bearer credential, JSON envelopes and URL construction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kankasync_api::client::KankaClient;
//! use kankasync_core::domain::{AccountId, EntityType};
//! use kankasync_core::ports::Resource;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = KankaClient::new("api-token-here");
//! let body = serde_json::json!({"name": "Bob"});
//! let response = client
//!     .create(AccountId::new(1), &Resource::Entity(EntityType::Character), &body)
//!     .await?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use kankasync_core::{
    config::DEFAULT_BASE_URL,
    domain::{AccountId, EntityResponse, RemoteId},
    ports::{RemoteResponse, Resource},
};
use reqwest::{header::ACCEPT, Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ApiError;

/// Longest response excerpt included in log lines
const LOG_BODY_LIMIT: usize = 200;

// ============================================================================
// Kanka API response envelope
// ============================================================================

/// Single-record envelope returned by create/update calls
#[derive(Debug, Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Option<EntityResponse>,
}

// ============================================================================
// KankaClient
// ============================================================================

/// HTTP client for Kanka API calls
///
/// Wraps `reqwest::Client` with the bearer credential and base URL
/// construction. The credential is attached to every request, including
/// requests to absolute pagination URLs.
pub struct KankaClient {
    /// The underlying HTTP client
    client: Client,
    /// Campaigns API root, without a trailing slash
    base_url: String,
    /// Personal access token
    access_token: String,
}

impl KankaClient {
    /// Creates a client against the public Kanka API
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - Personal access token
    /// * `base_url` - Campaigns API root, e.g. `https://api.kanka.io/1.0/campaigns`
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Returns a reference to the current access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the campaigns API root
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for a path below the base URL
    ///
    /// An empty path addresses the base URL itself (the campaign list).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let path = path.trim_start_matches('/');
        let url = if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        };
        self.request_url(method, &url)
    }

    /// Creates an authenticated request builder for an absolute URL
    ///
    /// Used for pagination links, which the server returns as absolute URLs.
    pub fn request_url(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, "application/json")
    }

    /// Path of a collection (or one record in it) relative to the base URL
    ///
    /// # Errors
    /// Returns `ApiError::Unroutable` for resources without a collection.
    pub fn resource_path(
        account: AccountId,
        resource: &Resource,
        id: Option<RemoteId>,
    ) -> Result<String, ApiError> {
        let collection = resource
            .collection_path()
            .ok_or_else(|| ApiError::Unroutable(resource.to_string()))?;
        Ok(match id {
            Some(id) => format!("{account}/{collection}/{id}"),
            None => format!("{account}/{collection}"),
        })
    }

    /// Creates a record with `POST {account}/{collection}`
    pub async fn create(
        &self,
        account: AccountId,
        resource: &Resource,
        body: &Value,
    ) -> Result<RemoteResponse> {
        let path = Self::resource_path(account, resource, None)?;
        self.send_json(Method::POST, &path, body).await
    }

    /// Updates a record with `PATCH {account}/{collection}/{id}`
    pub async fn update(
        &self,
        account: AccountId,
        resource: &Resource,
        id: RemoteId,
        body: &Value,
    ) -> Result<RemoteResponse> {
        let path = Self::resource_path(account, resource, Some(id))?;
        self.send_json(Method::PATCH, &path, body).await
    }

    /// Sends a JSON body and captures status plus the `data` envelope
    ///
    /// Non-success statuses are returned rather than raised so the caller
    /// can attribute them to the document being synced.
    async fn send_json(&self, method: Method, path: &str, body: &Value) -> Result<RemoteResponse> {
        debug!(%method, path, "Sending request");

        let response = self
            .request(method.clone(), path)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {method} {path}"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !(status.is_success() || status.is_redirection()) {
            warn!(
                %method,
                path,
                status = status.as_u16(),
                body = excerpt(&text),
                "Request rejected"
            );
            return Ok(RemoteResponse {
                status: status.as_u16(),
                body: None,
            });
        }

        let body = parse_data(&text)?;
        debug!(
            %method,
            path,
            status = status.as_u16(),
            id = ?body.as_ref().and_then(|b| b.id),
            "Request accepted"
        );
        Ok(RemoteResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Extracts the `data` record from a response body (empty body means none)
fn parse_data(text: &str) -> Result<Option<EntityResponse>, ApiError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<DataEnvelope>(text)
        .map(|envelope| envelope.data)
        .map_err(|e| ApiError::InvalidResponse(format!("{e}: {}", excerpt(text))))
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(LOG_BODY_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
