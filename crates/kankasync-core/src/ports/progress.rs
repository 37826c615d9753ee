//! Progress reporting port
//!
//! The orchestrator publishes a "documents completed / documents total"
//! signal. The count only ever grows within one batch and is reset when
//! the next batch starts.

use crate::domain::newtypes::DocumentPath;

/// Final state of one document, as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Synced,
    Skipped,
    Failed,
}

/// Port trait for batch progress reporting
pub trait IProgressReporter: Send + Sync {
    /// Starts a new batch of `total` documents
    fn reset(&self, total: usize);

    /// Records that one more document has settled
    fn advance(&self, path: &DocumentPath, status: DocumentStatus, done: usize, total: usize);
}

/// Reporter that discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl IProgressReporter for NoopProgress {
    fn reset(&self, _total: usize) {}

    fn advance(&self, _path: &DocumentPath, _status: DocumentStatus, _done: usize, _total: usize) {}
}
