//! Error types for the artifact watcher.

use artifact_storage::StorageError;
use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors surfaced by starting, stopping or scanning a watcher.
///
/// Failures while processing an individual file never end up here; they
/// are published as [`WatchEvent::Error`](crate::WatchEvent::Error).
#[derive(Error, Debug)]
pub enum WatcherError {
    /// No directories configured.
    #[error("no watch roots configured")]
    NoWatchRoots,

    /// A watch root does not exist or is not a directory.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// `start` was called on a watcher that is not idle.
    #[error("watcher is already running")]
    AlreadyRunning,

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
