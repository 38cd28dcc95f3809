//! Events flowing out of the watcher.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use artifact_protocol::{Artifact, ClassificationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A settled file system change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvent {
    /// The kind of change.
    pub kind: FileEventKind,

    /// Path to the affected file.
    pub path: PathBuf,

    /// File size in bytes (if known).
    pub size: Option<u64>,

    /// Last modification time (if known).
    pub modified: Option<DateTime<Utc>>,

    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl FileEvent {
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            size: None,
            modified: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a size/mtime snapshot.
    pub fn with_snapshot(mut self, snapshot: FileSnapshot) -> Self {
        self.size = snapshot.size;
        self.modified = snapshot.modified.map(DateTime::<Utc>::from);
        self
    }
}

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEventKind {
    /// File appeared.
    Add,

    /// File contents changed.
    Change,

    /// File went away.
    Remove,
}

impl FileEventKind {
    /// Map a raw notification. Access events and anything else that does
    /// not alter a file are dropped.
    pub fn from_notify(kind: notify::EventKind) -> Option<Self> {
        use notify::event::{ModifyKind, RenameMode};

        match kind {
            notify::EventKind::Create(_) => Some(Self::Add),
            notify::EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(Self::Remove),
            notify::EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(Self::Add),
            notify::EventKind::Modify(ModifyKind::Metadata(_)) => None,
            notify::EventKind::Modify(_) => Some(Self::Change),
            notify::EventKind::Remove(_) => Some(Self::Remove),
            _ => None,
        }
    }

    /// Fold a later notification for the same path into this one.
    ///
    /// An add followed by changes is still an add; anything followed by a
    /// remove is a remove; a remove followed by an add is a change.
    pub fn coalesce(self, next: Self) -> Self {
        match (self, next) {
            (_, Self::Remove) => Self::Remove,
            (Self::Remove, _) => Self::Change,
            (Self::Add, _) => Self::Add,
            (Self::Change, _) => Self::Change,
        }
    }
}

/// Size and modification time of a file at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSnapshot {
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl FileSnapshot {
    /// Read the current snapshot. A missing file yields an empty snapshot.
    pub fn probe(path: &Path) -> Self {
        match path.metadata() {
            Ok(metadata) => Self {
                size: Some(metadata.len()),
                modified: metadata.modified().ok(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Whether the snapshot describes an existing file.
    pub fn exists(&self) -> bool {
        self.size.is_some()
    }
}

/// What subscribers of a watcher receive.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchEvent {
    /// A settled change passed the filters.
    File(FileEvent),

    /// The file was stored, or matched an already-stored artifact.
    Stored {
        event: FileEvent,
        artifact: Box<Artifact>,
        duplicate: bool,
    },

    /// The file was classified but storing is disabled.
    Classified {
        event: FileEvent,
        classification: ClassificationResult,
    },

    /// Classification fell below the confidence floor; nothing was stored.
    LowConfidence {
        event: FileEvent,
        classification: ClassificationResult,
    },

    /// Processing the file failed.
    Error { path: PathBuf, message: String },
}
