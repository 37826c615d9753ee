//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures and malformed document metadata.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid document path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid remote ID format
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Front matter names an entity type that is not known
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// A front matter field has a shape the sync cannot interpret
    #[error("Invalid front matter field '{field}': {message}")]
    InvalidField {
        /// Front matter key
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidPath("/bad/path".to_string());
        assert_eq!(err.to_string(), "Invalid path: /bad/path");

        let err = DomainError::UnknownEntityType("dragon".to_string());
        assert_eq!(err.to_string(), "Unknown entity type: dragon");

        let err = DomainError::InvalidField {
            field: "tags".to_string(),
            message: "expected a list".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid front matter field 'tags': expected a list"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidRemoteId("x".to_string());
        let err2 = DomainError::InvalidRemoteId("x".to_string());
        let err3 = DomainError::InvalidRemoteId("y".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
