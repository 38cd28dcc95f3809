//! # Artifact Storage
//!
//! Persists classified artifacts under a storage root:
//!
//! - **Canonical layout**: one directory tree per category, refined by
//!   subcategory, owner and element
//! - **Deduplication**: content is addressed by a truncated SHA-256 checksum
//! - **Catalog**: an ordered in-memory index mirrored to
//!   `index/catalog.json`, rewritten in full on every mutation
//! - **Soft delete**: removed files are kept under `archive/`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       StorageManager                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  bytes ──► checksum ──► dedup? ──► StorageLayout ──► write      │
//! │                                                       │         │
//! │                                                       ▼         │
//! │  search / stats ◄──── ArtifactIndex ──► catalog.json            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod checksum;
pub mod config_file;
pub mod error;
pub mod index;
pub mod layout;
pub mod manager;
pub mod search;
pub mod stats;

pub use checksum::checksum;
pub use config_file::{load_config, save_config};
pub use error::{Result, StorageError};
pub use index::ArtifactIndex;
pub use layout::StorageLayout;
pub use manager::{StorageManager, StoreOptions, StoreOutcome};
pub use search::{SearchHit, SearchOptions};
pub use stats::{DEFAULT_RECENT_LIMIT, StorageStats};
