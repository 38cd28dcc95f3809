//! # Artifact Flow
//!
//! The caller-facing surface of the artifact pipeline. It combines:
//!
//! - **Classifier**: rule-based classification of files
//! - **Storage**: content-addressed storage with a searchable catalog
//! - **Watcher**: directory watching that feeds both
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Artifact Flow                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │  Classifier  │  │   Storage    │  │   Artifact   │           │
//! │  │              │  │   Manager    │  │   Watcher    │           │
//! │  └──────────────┘  └──────────────┘  └──────────────┘           │
//! │         │                │                  │                   │
//! │         └────────────────┼──────────────────┘                   │
//! │                          ▼                                      │
//! │                  ┌──────────────┐                               │
//! │                  │ ArtifactFlow │                               │
//! │                  └──────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use artifact_flow::{ArtifactFlow, SearchOptions};
//!
//! let flow = ArtifactFlow::open("~/.local/share/artifact-flow").await?;
//! let outcome = flow.store_artifact(b"# Kael\n", "kael.md", None).await?;
//! let hits = flow.search_artifacts(&SearchOptions::query("kael")).await;
//! ```

pub mod error;
pub mod flow;

pub use error::{FlowError, Result};
pub use flow::{ArtifactFlow, ArtifactFlowBuilder};

// Re-export from dependencies for convenience
pub use artifact_classifier::{Classifier, PatternRule, Rule, Vocabulary};
pub use artifact_protocol::{
    Artifact, ArtifactPatch, Category, ClassificationOverrides, ClassificationResult, FlowConfig,
};
pub use artifact_storage::{SearchOptions, StorageStats, StoreOptions, StoreOutcome};
pub use artifact_watcher::{ArtifactWatcher, ScanSummary, WatchEvent, WatcherState};
