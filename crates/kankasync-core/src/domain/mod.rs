//! Domain entities and business logic
//!
//! This module contains the core domain types for kankasync:
//! - Newtypes for type-safe identifiers and validated paths
//! - Accounts (campaign-to-folder bindings)
//! - Documents, entity metadata and server responses
//! - Body segments (posts)
//! - Domain-specific error types

pub mod account;
pub mod document;
pub mod entity;
pub mod errors;
pub mod newtypes;
pub mod segment;

// Re-export commonly used types
pub use account::{Account, AccountTier};
pub use document::{Document, FrontMatter};
pub use entity::{EntityMetadata, EntityResponse, EntityType, ENTITY_TYPE_KEY};
pub use errors::DomainError;
pub use newtypes::*;
pub use segment::{Heading, Post, Segmentation};
