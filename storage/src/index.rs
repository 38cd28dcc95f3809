//! The artifact catalog: an ordered in-memory map mirrored to one JSON file.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use artifact_protocol::Artifact;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Result, StorageError};

/// Current schema version of the catalog file.
pub const CATALOG_VERSION: u32 = 1;

/// On-disk shape of the catalog.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    updated_at: DateTime<Utc>,
    artifacts: Vec<Artifact>,
}

/// Active artifacts in insertion order, with a checksum lookup.
#[derive(Debug, Clone, Default)]
pub struct ArtifactIndex {
    artifacts: IndexMap<String, Artifact>,
    by_checksum: HashMap<String, String>,
}

impl ArtifactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from records, dropping any whose checksum was already
    /// seen.
    pub fn from_artifacts(artifacts: Vec<Artifact>) -> Self {
        let mut index = Self::new();
        for artifact in artifacts {
            if index.by_checksum.contains_key(&artifact.checksum) {
                warn!(
                    "Dropping duplicate catalog entry {} (checksum {})",
                    artifact.id, artifact.checksum
                );
                continue;
            }
            index.insert(artifact);
        }
        index
    }

    /// Load the catalog at `path`.
    ///
    /// A missing catalog is an empty index. An unreadable or malformed one
    /// is moved aside and also yields an empty index, so the store stays
    /// usable.
    pub async fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No catalog at {}, starting empty", path.display());
                return Self::new();
            }
            Err(e) => {
                warn!("Failed to read catalog {}: {e}; starting empty", path.display());
                return Self::new();
            }
        };

        match serde_json::from_str::<CatalogFile>(&content) {
            Ok(catalog) => {
                let index = Self::from_artifacts(catalog.artifacts);
                info!("Loaded {} artifacts from {}", index.len(), path.display());
                index
            }
            Err(e) => {
                warn!("Catalog {} is corrupt: {e}; starting empty", path.display());
                let aside = sibling_with_suffix(path, &format!(".corrupt-{}", Utc::now().timestamp()));
                if let Err(e) = fs::rename(path, &aside).await {
                    warn!("Failed to move corrupt catalog aside: {e}");
                }
                Self::new()
            }
        }
    }

    /// Rewrite the whole catalog at `path`.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let catalog = CatalogFile {
            version: CATALOG_VERSION,
            updated_at: Utc::now(),
            artifacts: self.artifacts.values().cloned().collect(),
        };
        let content = serde_json::to_vec_pretty(&catalog)?;
        write_atomic(path, &content).await?;
        debug!("Saved catalog with {} artifacts", self.artifacts.len());
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    pub fn find_by_checksum(&self, checksum: &str) -> Option<&Artifact> {
        self.by_checksum
            .get(checksum)
            .and_then(|id| self.artifacts.get(id))
    }

    pub fn find_by_path(&self, relative: &str) -> Option<&Artifact> {
        self.artifacts.values().find(|a| a.path == relative)
    }

    /// The record last stored from `source` on disk.
    pub fn find_by_source(&self, source: &Path) -> Option<&Artifact> {
        self.artifacts
            .values()
            .find(|a| a.source_path.as_deref() == Some(source))
    }

    /// Insert or replace a record. A replaced record keeps its position.
    pub fn insert(&mut self, artifact: Artifact) -> Option<Artifact> {
        let previous = self.artifacts.insert(artifact.id.clone(), artifact.clone());
        if let Some(ref previous) = previous {
            if previous.checksum != artifact.checksum {
                self.by_checksum.remove(&previous.checksum);
            }
        }
        self.by_checksum.insert(artifact.checksum, artifact.id);
        previous
    }

    /// Remove a record, preserving the order of the others.
    pub fn remove(&mut self, id: &str) -> Option<Artifact> {
        let removed = self.artifacts.shift_remove(id)?;
        if self.by_checksum.get(&removed.checksum) == Some(&removed.id) {
            self.by_checksum.remove(&removed.checksum);
        }
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Write through a temporary sibling and rename over the target.
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::CreateDirectory(format!("{}: {e}", parent.display())))?;
    }

    let temp_path = sibling_with_suffix(path, ".tmp");
    fs::write(&temp_path, content)
        .await
        .map_err(|e| StorageError::WriteFile(format!("{}: {e}", temp_path.display())))?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::WriteFile(format!("{}: {e}", path.display())));
    }
    Ok(())
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
