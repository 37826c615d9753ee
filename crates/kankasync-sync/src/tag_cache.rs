//! Per-account tag name/id cache
//!
//! Each account gets a name→id map that is populated by listing the
//! remote tag collection (all pages) and grows as missing tags are created
//! on demand. A refresh only hits the network when the configured interval
//! has elapsed since the account's previous refresh.
//!
//! ## Failure semantics
//!
//! - A failed listing is logged and swallowed: the previous map is kept and
//!   no pages from the failed refresh are merged.
//! - A failed creation is returned to the caller; the tag is never skipped.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use kankasync_core::domain::{AccountId, RemoteId};
use kankasync_core::ports::{Clock, IRemoteClient, Resource};

/// Errors raised while resolving tag names
#[derive(Debug, Error)]
pub enum TagError {
    /// The create call did not reach the server or could not be decoded
    #[error("Failed to create tag '{name}': {source}")]
    Create {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The server refused to create the tag
    #[error("Tag '{name}' was rejected with status {status}")]
    Rejected { name: String, status: u16 },

    /// The server accepted the tag but did not return its id
    #[error("Server returned no id for tag '{name}'")]
    MissingId { name: String },
}

/// What a call to [`TagCache::refresh`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The interval has not elapsed; the cached map was reused
    Fresh,
    /// The remote listing completed
    Refreshed { pages: usize, tags: usize },
    /// The remote listing failed; the previous map was kept
    Failed,
}

#[derive(Debug, Default)]
struct AccountTags {
    by_name: BTreeMap<String, RemoteId>,
    last_refresh: Option<DateTime<Utc>>,
}

/// Process-lifetime tag cache shared by all documents of all accounts
pub struct TagCache {
    remote: Arc<dyn IRemoteClient>,
    clock: Arc<dyn Clock>,
    refresh_interval: Duration,
    accounts: DashMap<AccountId, AccountTags>,
    /// Serialises on-miss creation per account
    create_locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl TagCache {
    pub fn new(remote: Arc<dyn IRemoteClient>, clock: Arc<dyn Clock>, refresh_interval: Duration) -> Self {
        Self {
            remote,
            clock,
            refresh_interval,
            accounts: DashMap::new(),
            create_locks: DashMap::new(),
        }
    }

    /// Re-lists the account's tags if the refresh interval has elapsed
    ///
    /// The refresh time is stamped before the listing starts, so a failed
    /// refresh is not retried until the interval elapses again.
    pub async fn refresh(&self, account: AccountId) -> RefreshOutcome {
        let now = self.clock.now();
        {
            let mut entry = self.accounts.entry(account).or_default();
            if let Some(last) = entry.last_refresh {
                if now - last <= self.refresh_interval {
                    debug!(%account, "Tag cache is fresh");
                    return RefreshOutcome::Fresh;
                }
            }
            entry.last_refresh = Some(now);
        }

        match self.fetch_all(account).await {
            Ok((pages, listed)) => {
                let tags = listed.len();
                let mut entry = self.accounts.entry(account).or_default();
                entry.by_name.extend(listed);
                info!(%account, pages, tags, cached = entry.by_name.len(), "Refreshed tag cache");
                RefreshOutcome::Refreshed { pages, tags }
            }
            Err(err) => {
                warn!(%account, error = %format!("{err:#}"), "Tag refresh failed, keeping cached tags");
                RefreshOutcome::Failed
            }
        }
    }

    /// Lists every page of the account's tags
    async fn fetch_all(&self, account: AccountId) -> anyhow::Result<(usize, Vec<(String, RemoteId)>)> {
        let mut listed = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = self
                .remote
                .list(account, &Resource::Tag, cursor.as_deref())
                .await?;
            pages += 1;
            listed.extend(
                page.items
                    .into_iter()
                    .filter_map(|tag| Some((tag.name?, tag.id?))),
            );
            match page.next_page {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok((pages, listed))
    }

    fn lookup(&self, account: AccountId, name: &str) -> Option<RemoteId> {
        self.accounts
            .get(&account)
            .and_then(|tags| tags.by_name.get(name).copied())
    }

    /// Resolves tag names to ids, creating missing tags remotely
    ///
    /// Ids are returned in input order.
    ///
    /// # Errors
    /// Fails on the first tag that could not be created.
    pub async fn resolve(&self, account: AccountId, names: &[String]) -> Result<Vec<RemoteId>, TagError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = match self.lookup(account, name) {
                Some(id) => id,
                None => self.create(account, name).await?,
            };
            ids.push(id);
        }
        Ok(ids)
    }

    async fn create(&self, account: AccountId, name: &str) -> Result<RemoteId, TagError> {
        let lock = self
            .create_locks
            .entry(account)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another document may have created it while we waited.
        if let Some(id) = self.lookup(account, name) {
            return Ok(id);
        }

        let response = self
            .remote
            .create(account, &Resource::Tag, &json!({ "name": name }))
            .await
            .map_err(|source| TagError::Create {
                name: name.to_string(),
                source,
            })?;

        if !response.is_success() {
            return Err(TagError::Rejected {
                name: name.to_string(),
                status: response.status,
            });
        }
        let id = response.id().ok_or_else(|| TagError::MissingId {
            name: name.to_string(),
        })?;

        self.accounts
            .entry(account)
            .or_default()
            .by_name
            .insert(name.to_string(), id);
        info!(%account, tag = name, %id, "Created tag");
        Ok(id)
    }

    /// Names of the cached tags whose id is in `ids`, sorted by name
    pub fn reverse(&self, account: AccountId, ids: &[RemoteId]) -> Vec<String> {
        self.accounts
            .get(&account)
            .map(|tags| {
                tags.by_name
                    .iter()
                    .filter(|(_, id)| ids.contains(id))
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of the account's cached map (empty if never populated)
    pub fn snapshot(&self, account: AccountId) -> BTreeMap<String, RemoteId> {
        self.accounts
            .get(&account)
            .map(|tags| tags.by_name.clone())
            .unwrap_or_default()
    }

    /// When the account's tags were last refreshed
    pub fn last_refresh(&self, account: AccountId) -> Option<DateTime<Utc>> {
        self.accounts.get(&account).and_then(|tags| tags.last_refresh)
    }
}
