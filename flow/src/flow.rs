//! The caller-facing artifact flow.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use artifact_classifier::{ClassificationContext, Classifier, Rule, Vocabulary};
use artifact_protocol::{
    Artifact, ArtifactPatch, Category, ClassificationOverrides, ClassificationResult, FlowConfig,
};
use artifact_storage::{
    DEFAULT_RECENT_LIMIT, SearchOptions, StorageManager, StorageStats, StoreOptions, StoreOutcome,
};
use artifact_watcher::{ArtifactWatcher, ScanSummary, WatcherConfig};
use tracing::{debug, info};

use crate::error::Result;

/// One classifier plus one storage root.
///
/// This is the surface a CLI or HTTP layer talks to: store, classify,
/// search, inspect and delete artifacts, and build watchers that share the
/// same classifier and storage.
pub struct ArtifactFlow {
    /// Shared classifier.
    classifier: Arc<Classifier>,

    /// Shared storage manager.
    storage: Arc<StorageManager>,
}

impl ArtifactFlow {
    /// Create a builder.
    pub fn builder() -> ArtifactFlowBuilder {
        ArtifactFlowBuilder::new()
    }

    /// Open the store at `root` with the default rules.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::builder().with_root(root.as_ref()).build().await
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    pub fn storage(&self) -> &Arc<StorageManager> {
        &self.storage
    }

    /// Classify and store content.
    ///
    /// An override category is fed to the classifier as a type hint; the
    /// other override fields are applied on top of the result.
    pub async fn store_artifact(
        &self,
        content: &[u8],
        file_name: &str,
        overrides: Option<&ClassificationOverrides>,
    ) -> Result<StoreOutcome> {
        self.store_artifact_with(content, file_name, overrides, StoreOptions::default())
            .await
    }

    /// [`store_artifact`](Self::store_artifact) with explicit store options.
    pub async fn store_artifact_with(
        &self,
        content: &[u8],
        file_name: &str,
        overrides: Option<&ClassificationOverrides>,
        options: StoreOptions,
    ) -> Result<StoreOutcome> {
        let mut ctx = ClassificationContext::from_bytes(file_name, content.to_vec());
        if let Some(category) = overrides.and_then(|o| o.category) {
            ctx = ctx.with_type_hint(category);
        }
        let mut classification = self.classifier.classify(&ctx);
        if let Some(overrides) = overrides {
            classification.apply_overrides(overrides);
        }
        debug!(
            "Classified {file_name} as {} ({:.2})",
            classification.category, classification.confidence
        );

        let outcome = self
            .storage
            .store(content, file_name, &classification, options)
            .await?;
        Ok(outcome)
    }

    /// Classify content without storing it.
    pub fn classify_only(&self, content: &[u8], file_name: &str) -> ClassificationResult {
        self.classifier.classify_bytes(file_name, content.to_vec())
    }

    pub async fn search_artifacts(&self, options: &SearchOptions) -> Vec<Artifact> {
        self.storage.search(options).await
    }

    pub async fn get_artifact(&self, id: &str) -> Option<Artifact> {
        self.storage.get(id).await
    }

    /// Stored bytes of an artifact, `None` when unknown or missing on disk.
    pub async fn get_artifact_content(&self, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.storage.get_content(id).await?)
    }

    pub async fn list_artifacts(&self, category: Option<Category>) -> Vec<Artifact> {
        self.storage.list(category).await
    }

    pub async fn update_artifact(&self, id: &str, patch: &ArtifactPatch) -> Result<Option<Artifact>> {
        Ok(self.storage.update(id, patch).await?)
    }

    /// Soft delete. `false` when the id is unknown.
    pub async fn delete_artifact(&self, id: &str) -> Result<bool> {
        Ok(self.storage.delete(id).await?)
    }

    pub async fn get_stats(&self) -> StorageStats {
        self.storage.stats(DEFAULT_RECENT_LIMIT).await
    }

    pub async fn config(&self) -> FlowConfig {
        self.storage.config().await
    }

    /// Replace and persist the configuration. Watchers built afterwards
    /// pick up the change.
    pub async fn update_config(&self, config: FlowConfig) -> Result<FlowConfig> {
        Ok(self.storage.update_config(config).await?)
    }

    /// Build an idle watcher over the configured watch roots, sharing this
    /// flow's classifier and storage.
    pub async fn watcher(&self) -> ArtifactWatcher {
        let config = WatcherConfig::from_flow_config(&self.config().await);
        ArtifactWatcher::new(
            config,
            Arc::clone(&self.classifier),
            Some(Arc::clone(&self.storage)),
        )
    }

    /// Push every file already under the watch roots through the pipeline.
    pub async fn scan_watch_roots(&self) -> Result<ScanSummary> {
        let summary = self.watcher().await.scan().await?;
        Ok(summary)
    }
}

/// Builder for [`ArtifactFlow`].
#[derive(Default)]
pub struct ArtifactFlowBuilder {
    root: Option<PathBuf>,
    config: Option<FlowConfig>,
    vocabulary: Option<Vocabulary>,
    rules: Vec<Rule>,
}

impl ArtifactFlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage root. Defaults to the configuration's root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Configuration to persist over whatever the root already holds.
    pub fn with_config(mut self, config: FlowConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default vocabulary.
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Register an extra rule on top of the defaults.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub async fn build(self) -> Result<ArtifactFlow> {
        let root = match (self.root, &self.config) {
            (Some(root), _) => root,
            (None, Some(config)) => config.storage_root.clone(),
            (None, None) => FlowConfig::default().storage_root,
        };

        let storage = StorageManager::open(&root).await?;
        if let Some(config) = self.config {
            storage.update_config(config).await?;
        }

        let mut classifier = self
            .vocabulary
            .map_or_else(Classifier::new, Classifier::with_vocabulary);
        for rule in self.rules {
            classifier.register(rule);
        }

        info!("Artifact flow ready at {}", root.display());
        Ok(ArtifactFlow {
            classifier: Arc::new(classifier),
            storage: Arc::new(storage),
        })
    }
}
