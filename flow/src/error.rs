//! Error types for the artifact flow facade.

use thiserror::Error;

/// Result type alias for flow operations.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that can occur in the artifact flow.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] artifact_storage::StorageError),

    /// Watcher error.
    #[error("watcher error: {0}")]
    Watcher(#[from] artifact_watcher::WatcherError),
}
