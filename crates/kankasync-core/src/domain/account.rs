//! Account domain entity
//!
//! An Account binds one folder of the local vault to one remote campaign.
//! Accounts are created from configuration and are read-only to the sync core.

use serde::{Deserialize, Serialize};

use super::newtypes::{AccountId, DocumentPath};

/// Rate-limit tier of a remote account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTier {
    /// Regular campaign
    #[default]
    Standard,
    /// Boosted, superboosted or premium campaign
    Boosted,
}

impl AccountTier {
    /// Maps the remote boost flag onto a tier
    pub fn from_boosted(boosted: bool) -> Self {
        if boosted {
            AccountTier::Boosted
        } else {
            AccountTier::Standard
        }
    }

    /// Returns true for the higher tier
    pub fn is_boosted(self) -> bool {
        matches!(self, AccountTier::Boosted)
    }
}

impl std::fmt::Display for AccountTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountTier::Standard => write!(f, "standard"),
            AccountTier::Boosted => write!(f, "boosted"),
        }
    }
}

/// A remote namespace that the documents of one vault folder sync into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Remote campaign identifier
    id: AccountId,
    /// Display name, written into front matter as `campaign_name`
    name: String,
    /// Vault-relative folder holding this account's documents
    path: String,
    /// Optional glob further restricting the eligible documents
    glob: Option<String>,
    /// Disabled accounts are never synced
    enabled: bool,
    /// Rate-limit tier
    tier: AccountTier,
}

impl Account {
    /// Creates an enabled, standard-tier account with no glob selector
    pub fn new(id: AccountId, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
            glob: None,
            enabled: true,
            tier: AccountTier::Standard,
        }
    }

    /// Sets the glob selector
    pub fn with_glob(mut self, glob: impl Into<String>) -> Self {
        self.glob = Some(glob.into());
        self
    }

    /// Sets the rate-limit tier
    pub fn with_tier(mut self, tier: AccountTier) -> Self {
        self.tier = tier;
        self
    }

    /// Sets whether the account participates in syncs
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    // --- Getters ---

    /// Returns the account's remote identifier
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the vault-relative root folder
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the glob selector, if any
    pub fn glob(&self) -> Option<&str> {
        self.glob.as_deref()
    }

    /// Returns true if the account participates in syncs
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the rate-limit tier
    pub fn tier(&self) -> AccountTier {
        self.tier
    }

    /// Returns true if `path` is under this account's folder
    ///
    /// Glob matching is left to the document store, which owns the
    /// pattern syntax.
    pub fn contains(&self, path: &DocumentPath) -> bool {
        path.is_under(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_account() -> Account {
        Account::new(AccountId::new(194416), "Shattered Isles", "Campaigns/Isles")
    }

    #[test]
    fn test_new_account_defaults() {
        let account = create_test_account();
        assert_eq!(account.id().get(), 194416);
        assert_eq!(account.name(), "Shattered Isles");
        assert_eq!(account.path(), "Campaigns/Isles");
        assert!(account.glob().is_none());
        assert!(account.is_enabled());
        assert_eq!(account.tier(), AccountTier::Standard);
    }

    #[test]
    fn test_builders() {
        let account = create_test_account()
            .with_glob("**/*.md")
            .with_tier(AccountTier::Boosted)
            .with_enabled(false);
        assert_eq!(account.glob(), Some("**/*.md"));
        assert!(account.tier().is_boosted());
        assert!(!account.is_enabled());
    }

    #[test]
    fn test_contains() {
        let account = create_test_account();
        assert!(account.contains(&DocumentPath::new("Campaigns/Isles/Bob.md").unwrap()));
        assert!(!account.contains(&DocumentPath::new("Campaigns/Other/Bob.md").unwrap()));
    }

    #[test]
    fn test_tier_from_boosted() {
        assert_eq!(AccountTier::from_boosted(true), AccountTier::Boosted);
        assert_eq!(AccountTier::from_boosted(false), AccountTier::Standard);
        assert_eq!(AccountTier::Boosted.to_string(), "boosted");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let account = create_test_account().with_tier(AccountTier::Boosted);
        let json = serde_json::to_string(&account).unwrap();
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(account, back);
    }
}
