//! Remote entity API port (driven/secondary port)
//!
//! This module defines the interface the sync core uses to talk to the
//! remote entity-graph API. The adapter owns transport, authentication and
//! URL construction; the core only names resources and supplies bodies.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport errors are adapter-specific.
//! - A non-success status on create/update is *not* an error at this
//!   boundary: it is returned in [`RemoteResponse`] so the core can classify
//!   it as an upload failure for the document.
//! - Listing follows opaque continuation cursors; callers loop until
//!   `next_page` is `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    entity::{EntityResponse, EntityType},
    newtypes::{AccountId, RemoteId},
};

// ============================================================================
// Resource
// ============================================================================

/// A remote collection addressed within one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The typed entity collection for a document type
    Entity(EntityType),
    /// The posts nested under one entity wrapper
    Post { entity_id: RemoteId },
    /// The account's tag collection
    Tag,
}

impl Resource {
    /// Collection path relative to the account root
    ///
    /// Returns `None` for the undefined entity type.
    pub fn collection_path(&self) -> Option<String> {
        match self {
            Resource::Entity(entity_type) => entity_type.collection().map(str::to_string),
            Resource::Post { entity_id } => Some(format!("entities/{entity_id}/posts")),
            Resource::Tag => Some("tags".to_string()),
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Entity(t) => write!(f, "{t}"),
            Resource::Post { entity_id } => write!(f, "posts of entity {entity_id}"),
            Resource::Tag => write!(f, "tags"),
        }
    }
}

// ============================================================================
// Response shapes
// ============================================================================

/// One page of a collection listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Records on this page
    pub items: Vec<EntityResponse>,
    /// Cursor for the next page (None on the last page)
    pub next_page: Option<String>,
}

/// Outcome of a create or update call
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed `data` payload, when the server returned one
    pub body: Option<EntityResponse>,
}

impl RemoteResponse {
    /// Returns true for 2xx and 3xx statuses
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// Identifier assigned by the server, if the body carries one
    pub fn id(&self) -> Option<RemoteId> {
        self.body.as_ref().and_then(|b| b.id)
    }
}

/// A campaign visible to the configured credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignInfo {
    pub id: AccountId,
    pub name: String,
    /// True for boosted, superboosted or premium campaigns
    pub boosted: bool,
}

// ============================================================================
// IRemoteClient trait
// ============================================================================

/// Port trait for the remote entity API
#[async_trait::async_trait]
pub trait IRemoteClient: Send + Sync {
    /// Fetches one page of a collection
    ///
    /// # Arguments
    /// * `account` - Account whose namespace is listed
    /// * `resource` - Collection to list
    /// * `cursor` - Continuation cursor from a previous page (None for the first)
    ///
    /// # Errors
    /// Fails on transport errors and on non-success statuses.
    async fn list(
        &self,
        account: AccountId,
        resource: &Resource,
        cursor: Option<&str>,
    ) -> anyhow::Result<ListPage>;

    /// Creates a record in a collection
    async fn create(
        &self,
        account: AccountId,
        resource: &Resource,
        body: &Value,
    ) -> anyhow::Result<RemoteResponse>;

    /// Updates an existing record in a collection
    async fn update(
        &self,
        account: AccountId,
        resource: &Resource,
        id: RemoteId,
        body: &Value,
    ) -> anyhow::Result<RemoteResponse>;

    /// Lists the campaigns visible to the credential
    async fn list_campaigns(&self) -> anyhow::Result<Vec<CampaignInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_paths() {
        assert_eq!(
            Resource::Entity(EntityType::Character).collection_path().as_deref(),
            Some("characters")
        );
        assert_eq!(
            Resource::Post {
                entity_id: RemoteId::new(42).unwrap()
            }
            .collection_path()
            .as_deref(),
            Some("entities/42/posts")
        );
        assert_eq!(Resource::Tag.collection_path().as_deref(), Some("tags"));
        assert_eq!(Resource::Entity(EntityType::Undefined).collection_path(), None);
    }

    #[test]
    fn test_response_success_range() {
        let ok = RemoteResponse { status: 201, body: None };
        let redirect = RemoteResponse { status: 302, body: None };
        let bad = RemoteResponse { status: 422, body: None };
        assert!(ok.is_success());
        assert!(redirect.is_success());
        assert!(!bad.is_success());
        assert!(ok.id().is_none());
    }
}
