//! Kankasync Sync - Document-to-entity synchronization engine
//!
//! Provides:
//! - Heading-based document segmentation and identifier restamping
//! - Per-account tag name/id caching
//! - Per-account rate limiting by tier
//! - Projection of server responses into front matter
//! - Batch orchestration with per-document outcomes
//!
//! ## Modules
//!
//! - [`markdown`] - Heading scanner and Markdown-to-HTML renderer
//! - [`segmenter`] - Splits documents into entity body and posts
//! - [`tag_cache`] - Tag resolution and reverse lookup
//! - [`rate_limit`] - Reservoir and in-flight limits per account
//! - [`merger`] - Declarative front matter field table
//! - [`orchestrator`] - Per-document state machine and batch driver
//! - [`store`] - Filesystem document store (atomic writes)

pub mod markdown;
pub mod merger;
pub mod orchestrator;
pub mod rate_limit;
pub mod segmenter;
pub mod store;
pub mod tag_cache;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

use kankasync_core::domain::DomainError;

pub use merger::MergeError;
pub use orchestrator::{BatchReport, DocumentOutcome, DocumentResult, DocumentState, SyncOrchestrator};
pub use segmenter::SegmentError;
pub use tag_cache::{TagCache, TagError};

/// Reasons a single document's sync can fail
#[derive(Debug, Error)]
pub enum SyncError {
    /// The front matter or a heading could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// A tag could not be resolved or created
    #[error("Tag resolution failed: {0}")]
    TagResolution(#[from] TagError),

    /// The server refused or could not be reached for an upload
    #[error("Upload of {resource} failed: {message}")]
    Upload {
        resource: String,
        status: Option<u16>,
        message: String,
    },

    /// The response could not be projected into the front matter
    #[error("Metadata merge failed: {0}")]
    Merge(#[from] MergeError),

    /// The document could not be read or written
    #[error("Document store error: {0}")]
    Store(String),
}

impl From<SegmentError> for SyncError {
    fn from(err: SegmentError) -> Self {
        SyncError::Parse(err.to_string())
    }
}

impl From<DomainError> for SyncError {
    fn from(err: DomainError) -> Self {
        SyncError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_errors_are_parse_errors() {
        let err: SyncError = SegmentError::EmptyTitle { offset: 4 }.into();
        assert!(matches!(err, SyncError::Parse(ref m) if m.contains("byte 4")));
    }

    #[test]
    fn test_upload_error_display() {
        let err = SyncError::Upload {
            resource: "characters".to_string(),
            status: Some(422),
            message: "server answered 422".to_string(),
        };
        assert_eq!(err.to_string(), "Upload of characters failed: server answered 422");
    }
}
