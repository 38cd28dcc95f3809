//! # Artifact Protocol
//!
//! Shared data types for the artifact pipeline. Every other crate in the
//! workspace speaks in these types:
//!
//! - [`Category`]: the closed set of top-level artifact kinds
//! - [`ClassificationResult`] / [`PartialClassification`]: classifier output
//! - [`Artifact`]: the persisted record kept by the storage manager
//! - [`FlowConfig`]: process-wide pipeline configuration
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Artifact Pipeline                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Watcher ──► Classifier ──► StorageManager                     │
//! │     │             │                │                            │
//! │     ▼             ▼                ▼                            │
//! │  FileEvent   ClassificationResult  Artifact                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod artifact;
pub mod category;
pub mod classification;
pub mod config;

pub use artifact::{Artifact, ArtifactPatch};
pub use category::{Category, ParseCategoryError};
pub use classification::{ClassificationOverrides, ClassificationResult, PartialClassification};
pub use config::FlowConfig;

/// Open metadata map carried by classifications and artifacts.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
