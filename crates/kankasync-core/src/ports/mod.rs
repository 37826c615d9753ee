//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteClient`] - Remote entity API (list/create/update, campaigns)
//! - [`IDocumentStore`] - Document bodies and front matter
//! - [`IMarkdownRenderer`] - Source-to-display conversion
//! - [`IProgressReporter`] - Batch progress signal
//! - [`Clock`] - Wall-clock time for TTL decisions

pub mod clock;
pub mod document_store;
pub mod progress;
pub mod remote_client;
pub mod renderer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use document_store::{FrontMatterMutator, IDocumentStore};
pub use progress::{DocumentStatus, IProgressReporter, NoopProgress};
pub use remote_client::{CampaignInfo, IRemoteClient, ListPage, RemoteResponse, Resource};
pub use renderer::IMarkdownRenderer;
