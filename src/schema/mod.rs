//! Schema cache layer
//!
//! This module discovers the newest published package and registry schemas,
//! decides which cached copies are stale, downloads them and serves the
//! cached files to callers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Discovery  │────▶│  Reconcile  │◀────│    Cache    │
//! │  (latest)   │     │  (staleness)│     │  (record)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   ▲
//!        ▼                   ▼                   │
//! ┌─────────────┐     ┌─────────────┐            │
//! │ Discoveries │     │   Fetcher   │────────────┘
//! │(releases,   │     │(direct, zip)│
//! │ manifest)   │     └─────────────┘
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`manager`]: `SchemaCacheManager`, the update pass and schema loading
//! - [`discovery`]: Discovery trait for finding the latest versions
//! - [`discoveries`]: Releases API and manifest discovery implementations
//! - [`reconcile`]: Per-type staleness decisions
//! - [`fetcher`]: Fetcher trait for materializing schemas
//! - [`fetchers`]: Direct file and zip archive fetchers
//! - [`cache`]: On-disk cache record and schema files
//! - [`http`]: Shared HTTP client helpers
//! - [`error`]: Error types
//! - [`types`]: Schema types, version descriptors and snapshots

pub mod cache;
pub mod discoveries;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod fetchers;
pub mod http;
pub mod manager;
pub mod reconcile;
pub mod types;

pub use manager::SchemaCacheManager;
pub use types::{SchemaType, SchemaVersion};
