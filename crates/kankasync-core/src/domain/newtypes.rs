//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for remote identifiers and
//! document paths. Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Numeric remote identifiers
// ============================================================================

/// Identifier of a remote account (a Kanka campaign)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u64);

impl AccountId {
    /// Create an AccountId from its numeric value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("account id '{s}': {e}")))
    }
}

/// Identifier assigned by the server to an entity, entity wrapper, post or tag
///
/// Always positive; zero is rejected because the remote API never assigns it
/// and the document format uses its absence to mean "not yet uploaded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RemoteId(u64);

impl RemoteId {
    /// Create a new RemoteId with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRemoteId` for zero
    pub fn new(id: u64) -> Result<Self, DomainError> {
        if id == 0 {
            return Err(DomainError::InvalidRemoteId("0".to_string()));
        }
        Ok(Self(id))
    }

    /// Get the numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for RemoteId {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RemoteId> for u64 {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<u64>()
            .map_err(|_| DomainError::InvalidRemoteId(s.to_string()))?;
        Self::new(value)
    }
}

// ============================================================================
// DocumentPath
// ============================================================================

/// Vault-relative path identifying a document
///
/// Uses forward slashes regardless of platform so that account path prefixes
/// and glob selectors behave identically everywhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Create a new DocumentPath with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path is empty, absolute or
    /// escapes the vault with `..`
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into().replace('\\', "/");
        if path.is_empty() {
            return Err(DomainError::InvalidPath("path cannot be empty".to_string()));
        }
        if path.starts_with('/') {
            return Err(DomainError::InvalidPath(format!(
                "path must be vault-relative: {path}"
            )));
        }
        if path.split('/').any(|segment| segment == "..") {
            return Err(DomainError::InvalidPath(format!(
                "path escapes the vault: {path}"
            )));
        }
        Ok(Self(path))
    }

    /// Get the path as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without directory and extension
    #[must_use]
    pub fn stem(&self) -> &str {
        let file_name = self.0.rsplit('/').next().unwrap_or(&self.0);
        match file_name.rfind('.') {
            Some(0) | None => file_name,
            Some(idx) => &file_name[..idx],
        }
    }

    /// Returns true if this path lies under the given vault-relative folder
    ///
    /// An empty prefix matches every document.
    #[must_use]
    pub fn is_under(&self, folder: &str) -> bool {
        let folder = folder.trim_matches('/');
        if folder.is_empty() {
            return true;
        }
        self.0
            .strip_prefix(folder)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.0
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
