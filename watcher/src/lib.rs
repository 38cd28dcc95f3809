//! # Artifact Watcher
//!
//! Watches directories and feeds the files that settle there through the
//! classifier and, when connected, the storage manager.
//!
//! ## Features
//!
//! - **Real-time Watching**: recursive notify watches on every root
//! - **Debounce and Stability**: per-path coalescing, and a quiet period
//!   before a file being written is touched
//! - **Filtering**: supported extensions only, minus ignore globs
//! - **Initial Scan**: push files already present through the same steps
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Artifact Watcher                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatcherConfig ──► notify ──► Debouncer ──► Pipeline            │
//! │       │                                        │                │
//! │       ▼                                        ▼                │
//! │   PathFilter                    Classifier ─► StorageManager    │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                                   WatchEvent ──► subscribers    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod watcher;

pub use config::{CONFIDENCE_FLOOR, PathFilter, WatcherConfig};
pub use debounce::{Debouncer, Settled};
pub use error::{Result, WatcherError};
pub use event::{FileEvent, FileEventKind, FileSnapshot, WatchEvent};
pub use pipeline::{Pipeline, ScanSummary};
pub use watcher::{ArtifactWatcher, WatcherState};
