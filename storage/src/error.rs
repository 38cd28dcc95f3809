//! Error types for artifact storage.

use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while reading or writing the artifact store.
///
/// "Not found" is never an error: lookups return `Option` instead.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create a directory.
    #[error("failed to create directory: {0}")]
    CreateDirectory(String),

    /// Failed to read a file.
    #[error("failed to read file: {0}")]
    ReadFile(String),

    /// Failed to write a file.
    #[error("failed to write file: {0}")]
    WriteFile(String),

    /// Failed to move a file into the archive.
    #[error("failed to move file: {0}")]
    MoveFile(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
