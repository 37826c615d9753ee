//! kankasync Core - Domain types, configuration and ports
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Account`, `Document`, `EntityMetadata`, `Post`, `EntityResponse`
//! - **Port definitions** - Traits for adapters: `IRemoteClient`, `IDocumentStore`,
//!   `IMarkdownRenderer`, `IProgressReporter`, `Clock`
//! - **Configuration** - YAML config with validation and a builder
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure data types and validation.
//! Ports define trait interfaces that adapter crates implement.
//! The sync engine in `kankasync-sync` orchestrates the domain through them.

pub mod config;
pub mod domain;
pub mod ports;
