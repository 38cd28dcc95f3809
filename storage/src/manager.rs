//! The storage manager: dedup, canonical placement and the artifact index.

use std::path::{Path, PathBuf};

use artifact_protocol::{
    Artifact, ArtifactPatch, Category, ClassificationResult, FlowConfig,
};
use chrono::Utc;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::checksum::checksum;
use crate::config_file::{load_config, save_config};
use crate::error::{Result, StorageError};
use crate::index::{ArtifactIndex, write_atomic};
use crate::layout::{StorageLayout, sanitize_file_name, with_id_suffix};
use crate::search::{SearchHit, SearchOptions, search};
use crate::stats::StorageStats;

/// Options for [`StorageManager::store`].
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Replace an existing record with the same content, source or path
    /// instead of deduplicating against it.
    pub overwrite: bool,

    /// Where the content came from on disk.
    pub source_path: Option<PathBuf>,

    /// Label of the workspace the content came from.
    pub workspace: Option<String>,
}

impl StoreOptions {
    pub fn overwrite() -> Self {
        Self {
            overwrite: true,
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source_path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }
}

/// What a store call did.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    /// A new record was written.
    Created(Artifact),
    /// The content was already stored; nothing was written.
    Duplicate(Artifact),
    /// An existing record was rewritten in place (same id).
    Replaced(Artifact),
}

impl StoreOutcome {
    pub fn artifact(&self) -> &Artifact {
        match self {
            Self::Created(artifact) | Self::Duplicate(artifact) | Self::Replaced(artifact) => {
                artifact
            }
        }
    }

    pub fn into_artifact(self) -> Artifact {
        match self {
            Self::Created(artifact) | Self::Duplicate(artifact) | Self::Replaced(artifact) => {
                artifact
            }
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Content-addressed artifact store rooted at one directory.
///
/// All mutations run under a single lock covering "read index, write file,
/// mutate, persist", so concurrent calls within one process are serialized.
/// Nothing guards against a second process using the same root: run at
/// most one pipeline per storage root.
pub struct StorageManager {
    layout: StorageLayout,

    config: RwLock<FlowConfig>,

    index: Mutex<ArtifactIndex>,
}

impl StorageManager {
    /// Create a manager for `config.storage_root` with an empty index.
    ///
    /// Call [`initialize`](Self::initialize) before use.
    pub fn new(config: FlowConfig) -> Self {
        Self {
            layout: StorageLayout::new(config.storage_root.clone()),
            config: RwLock::new(config),
            index: Mutex::new(ArtifactIndex::new()),
        }
    }

    /// Open the store at `root`, loading its persisted configuration and
    /// index.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let layout = StorageLayout::new(root.as_ref());
        let config = load_config(&layout).await;
        let manager = Self::new(config);
        manager.initialize().await?;
        Ok(manager)
    }

    /// Create the directory skeleton, reload the index from disk and
    /// persist the effective configuration. Safe to call repeatedly.
    pub async fn initialize(&self) -> Result<()> {
        for dir in self.layout.skeleton_dirs() {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::CreateDirectory(format!("{}: {e}", dir.display())))?;
        }

        let loaded = ArtifactIndex::load(&self.layout.catalog_path()).await;
        let count = loaded.len();
        *self.index.lock().await = loaded;

        save_config(&self.layout, &*self.config.read().await).await?;

        info!(
            "Initialized artifact store at {} ({count} artifacts)",
            self.layout.root().display()
        );
        Ok(())
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Current configuration.
    pub async fn config(&self) -> FlowConfig {
        self.config.read().await.clone()
    }

    /// Replace and persist the configuration. The storage root cannot be
    /// changed this way.
    pub async fn update_config(&self, mut config: FlowConfig) -> Result<FlowConfig> {
        config.storage_root = self.layout.root().to_path_buf();
        let mut current = self.config.write().await;
        save_config(&self.layout, &config).await?;
        *current = config.clone();
        info!("Updated flow configuration");
        Ok(config)
    }

    /// Store `content` under the path derived from `classification`.
    pub async fn store(
        &self,
        content: &[u8],
        file_name: &str,
        classification: &ClassificationResult,
        options: StoreOptions,
    ) -> Result<StoreOutcome> {
        let checksum = checksum(content);
        let file_name = sanitize_file_name(file_name);
        let mut index = self.index.lock().await;

        let same_content = index.find_by_checksum(&checksum).cloned();
        if let Some(ref existing) = same_content {
            if !options.overwrite {
                debug!("Content of {file_name} already stored as {}", existing.id);
                return Ok(StoreOutcome::Duplicate(existing.clone()));
            }
        }

        let id = Uuid::new_v4().to_string();
        let mut relative = self.layout.relative_path(classification, &file_name);
        let occupant = index.find_by_path(&relative).cloned();

        // The record being rewritten in place, if any.
        let replaced = if options.overwrite {
            same_content
                .or_else(|| {
                    options
                        .source_path
                        .as_deref()
                        .and_then(|source| index.find_by_source(source))
                        .cloned()
                })
                .or_else(|| occupant.clone())
        } else {
            if occupant.is_some() || self.exists(&relative).await {
                relative = with_id_suffix(&relative, &id);
            }
            None
        };
        // A different record whose file the overwrite clobbers.
        let displaced = occupant
            .filter(|o| options.overwrite && replaced.as_ref().is_none_or(|r| r.id != o.id));

        let target = self.layout.absolute(&relative);
        let prior = if options.overwrite {
            fs::read(&target).await.ok()
        } else {
            None
        };
        write_atomic(&target, content).await?;

        let now = Utc::now();
        let artifact = Artifact {
            id: replaced.as_ref().map_or(id, |r| r.id.clone()),
            file_name,
            source_path: options.source_path,
            path: relative,
            category: classification.category,
            subcategory: classification.subcategory.clone(),
            element: classification.element.clone(),
            gate: classification.gate.clone(),
            owner: classification.owner.clone(),
            tags: classification.tags.clone(),
            metadata: classification.metadata.clone(),
            created_at: replaced.as_ref().map_or(now, |r| r.created_at),
            updated_at: now,
            workspace: options.workspace,
            checksum,
        };

        let snapshot = index.clone();
        if let Some(ref displaced) = displaced {
            index.remove(&displaced.id);
        }
        index.insert(artifact.clone());
        if let Err(e) = index.save(&self.layout.catalog_path()).await {
            *index = snapshot;
            self.restore(&target, prior).await;
            return Err(e);
        }

        if let Some(displaced) = displaced {
            info!("Overwrite of {} displaced artifact {}", artifact.path, displaced.id);
        }
        match replaced {
            Some(previous) => {
                if previous.path != artifact.path {
                    self.remove_file(&previous.path).await;
                }
                info!("Replaced artifact {} at {}", artifact.id, artifact.path);
                Ok(StoreOutcome::Replaced(artifact))
            }
            None => {
                info!("Stored artifact {} at {}", artifact.id, artifact.path);
                Ok(StoreOutcome::Created(artifact))
            }
        }
    }

    pub async fn get(&self, id: &str) -> Option<Artifact> {
        self.index.lock().await.get(id).cloned()
    }

    /// The record last stored from `source` on disk, if any.
    pub async fn find_by_source(&self, source: &Path) -> Option<Artifact> {
        self.index.lock().await.find_by_source(source).cloned()
    }

    /// Read the stored bytes of an artifact. `None` when the id is unknown
    /// or its file has gone missing.
    pub async fn get_content(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let Some(relative) = self.index.lock().await.get(id).map(|a| a.path.clone()) else {
            return Ok(None);
        };
        let path = self.layout.absolute(&relative);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("File of artifact {id} is missing: {}", path.display());
                Ok(None)
            }
            Err(e) => Err(StorageError::ReadFile(format!("{}: {e}", path.display()))),
        }
    }

    /// Active artifacts in insertion order, optionally of one category.
    pub async fn list(&self, category: Option<Category>) -> Vec<Artifact> {
        self.index
            .lock()
            .await
            .iter()
            .filter(|a| category.is_none_or(|c| a.category == c))
            .cloned()
            .collect()
    }

    pub async fn search(&self, options: &SearchOptions) -> Vec<Artifact> {
        self.search_scored(options)
            .await
            .into_iter()
            .map(|hit| hit.artifact)
            .collect()
    }

    pub async fn search_scored(&self, options: &SearchOptions) -> Vec<SearchHit> {
        search(self.index.lock().await.iter(), options)
    }

    /// Apply a partial update. `None` when the id is unknown.
    pub async fn update(&self, id: &str, patch: &ArtifactPatch) -> Result<Option<Artifact>> {
        let mut index = self.index.lock().await;
        let Some(mut artifact) = index.get(id).cloned() else {
            return Ok(None);
        };
        artifact.apply_patch(patch);

        let snapshot = index.clone();
        index.insert(artifact.clone());
        if let Err(e) = index.save(&self.layout.catalog_path()).await {
            *index = snapshot;
            return Err(e);
        }

        debug!("Updated artifact {id}");
        Ok(Some(artifact))
    }

    /// Soft delete: move the file into the archive and drop the record.
    /// `false` when the id is unknown.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut index = self.index.lock().await;
        let Some(artifact) = index.get(id).cloned() else {
            return Ok(false);
        };

        let source = self.layout.absolute(&artifact.path);
        let archived = self.layout.archive_path(&artifact.id, &artifact.file_name);
        let moved = match fs::rename(&source, &archived).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("File of artifact {id} was already gone: {}", source.display());
                false
            }
            Err(e) => {
                return Err(StorageError::MoveFile(format!(
                    "{} -> {}: {e}",
                    source.display(),
                    archived.display()
                )));
            }
        };

        let snapshot = index.clone();
        index.remove(id);
        if let Err(e) = index.save(&self.layout.catalog_path()).await {
            *index = snapshot;
            if moved {
                if let Err(e) = fs::rename(&archived, &source).await {
                    warn!("Failed to restore {} from archive: {e}", source.display());
                }
            }
            return Err(e);
        }

        info!("Archived artifact {id} to {}", archived.display());
        Ok(true)
    }

    pub async fn stats(&self, recent_limit: usize) -> StorageStats {
        StorageStats::collect(self.index.lock().await.iter(), recent_limit)
    }

    async fn exists(&self, relative: &str) -> bool {
        fs::try_exists(self.layout.absolute(relative))
            .await
            .unwrap_or(false)
    }

    /// Put back what `target` held before a store whose catalog write
    /// failed: the previous bytes, or nothing at all.
    async fn restore(&self, target: &Path, prior: Option<Vec<u8>>) {
        match prior {
            Some(bytes) => {
                if let Err(e) = write_atomic(target, &bytes).await {
                    warn!("Failed to restore {}: {e}", target.display());
                }
            }
            None => {
                if let Err(e) = fs::remove_file(target).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove {}: {e}", target.display());
                    }
                }
            }
        }
    }

    async fn remove_file(&self, relative: &str) {
        let path = self.layout.absolute(relative);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {e}", path.display());
            }
        }
    }
}
