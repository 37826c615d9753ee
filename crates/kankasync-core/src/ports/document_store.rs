//! Document store port (driven/secondary port)
//!
//! This module defines the interface for reading and rewriting the
//! documents being synced. The store owns front matter parsing; the core
//! sees a document as an ordered front matter mapping plus a body.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific.
//! - Body reads and writes never touch the front matter block, and front
//!   matter mutations never touch the body.
//! - `mutate_front_matter` is a scoped read-modify-write: the mapping is
//!   persisted even when the mutator fails, and the mutator's error is
//!   returned afterwards.

use crate::domain::{document::FrontMatter, newtypes::DocumentPath};

/// Closure applied to a document's front matter by [`IDocumentStore::mutate_front_matter`]
pub type FrontMatterMutator =
    Box<dyn FnOnce(&mut FrontMatter) -> anyhow::Result<()> + Send + 'static>;

/// Port trait for document storage
#[async_trait::async_trait]
pub trait IDocumentStore: Send + Sync {
    /// Lists Markdown documents under a vault-relative folder
    ///
    /// # Arguments
    /// * `prefix` - Folder prefix; empty means the whole vault
    /// * `glob` - Optional pattern the vault-relative path must also match
    ///
    /// # Returns
    /// Matching paths in lexicographic order
    async fn list_documents(
        &self,
        prefix: &str,
        glob: Option<&str>,
    ) -> anyhow::Result<Vec<DocumentPath>>;

    /// Reads the document body (the text after the front matter block)
    async fn read_body(&self, path: &DocumentPath) -> anyhow::Result<String>;

    /// Reads the document's front matter (empty if it has none)
    async fn read_front_matter(&self, path: &DocumentPath) -> anyhow::Result<FrontMatter>;

    /// Replaces the document body, keeping the current front matter
    async fn write_body(&self, path: &DocumentPath, body: &str) -> anyhow::Result<()>;

    /// Applies `mutator` to the front matter and persists the result
    ///
    /// # Errors
    /// Returns the storage error if persisting fails, otherwise the
    /// mutator's error if it failed.
    async fn mutate_front_matter(
        &self,
        path: &DocumentPath,
        mutator: FrontMatterMutator,
    ) -> anyhow::Result<()>;
}
