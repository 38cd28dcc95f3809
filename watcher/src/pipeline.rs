//! The classify-and-store step applied to each settled file.

use std::path::Path;
use std::sync::Arc;

use artifact_classifier::{ClassificationContext, Classifier};
use artifact_storage::{StorageManager, StoreOptions, checksum};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::config::WatcherConfig;
use crate::event::{FileEvent, FileEventKind, WatchEvent};

/// Runs settled file events through the classifier and, when connected,
/// the storage manager.
pub struct Pipeline {
    config: WatcherConfig,
    classifier: Arc<Classifier>,
    storage: Option<Arc<StorageManager>>,
}

impl Pipeline {
    pub fn new(
        config: WatcherConfig,
        classifier: Arc<Classifier>,
        storage: Option<Arc<StorageManager>>,
    ) -> Self {
        Self {
            config,
            classifier,
            storage,
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Process one event. Returns the follow-up event to publish after the
    /// [`WatchEvent::File`] itself, if any. Never fails: problems come back
    /// as [`WatchEvent::Error`].
    pub async fn process(&self, event: &FileEvent) -> Option<WatchEvent> {
        if event.kind == FileEventKind::Remove || !self.config.auto_classify {
            return None;
        }

        let bytes = match fs::read(&event.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {e}", event.path.display());
                return Some(WatchEvent::Error {
                    path: event.path.clone(),
                    message: format!("failed to read file: {e}"),
                });
            }
        };

        let root = self.config.root_of(&event.path);
        let mut ctx = ClassificationContext::from_bytes(&event.path, bytes.clone());
        if let Some(root) = root {
            ctx = ctx.relative_to(root);
        }
        let classification = self.classifier.classify(&ctx);
        debug!(
            "Classified {} as {} ({:.2})",
            event.path.display(),
            classification.category,
            classification.confidence
        );

        if classification.confidence < self.config.confidence_floor {
            return Some(WatchEvent::LowConfidence {
                event: event.clone(),
                classification,
            });
        }

        let storage = match self.storage {
            Some(ref storage) if self.config.auto_store => storage,
            _ => {
                return Some(WatchEvent::Classified {
                    event: event.clone(),
                    classification,
                });
            }
        };

        // A file already tracked from this path is replaced when its content
        // moved on, whatever event kind reported the save.
        let mut options = StoreOptions::default().with_source(&event.path);
        options.overwrite = match storage.find_by_source(&event.path).await {
            Some(tracked) => tracked.checksum != checksum(&bytes),
            None => event.kind == FileEventKind::Change,
        };
        if let Some(label) = root.and_then(workspace_label) {
            options = options.with_workspace(label);
        }

        match storage
            .store(&bytes, &ctx.file_name, &classification, options)
            .await
        {
            Ok(outcome) => {
                let duplicate = outcome.is_duplicate();
                Some(WatchEvent::Stored {
                    event: event.clone(),
                    artifact: Box::new(outcome.into_artifact()),
                    duplicate,
                })
            }
            Err(e) => {
                warn!("Failed to store {}: {e}", event.path.display());
                Some(WatchEvent::Error {
                    path: event.path.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}

/// Directory name of a watch root, used as the workspace label.
fn workspace_label(root: &Path) -> Option<String> {
    root.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Tally of outcomes used by scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Files that passed the filters.
    pub seen: usize,
    pub stored: usize,
    pub duplicates: usize,
    /// Classified but not stored because storing is off.
    pub classified: usize,
    pub low_confidence: usize,
    pub errors: usize,
}

impl ScanSummary {
    pub fn record(&mut self, outcome: Option<&WatchEvent>) {
        self.seen += 1;
        match outcome {
            Some(WatchEvent::Stored { duplicate: true, .. }) => self.duplicates += 1,
            Some(WatchEvent::Stored { .. }) => self.stored += 1,
            Some(WatchEvent::Classified { .. }) => self.classified += 1,
            Some(WatchEvent::LowConfidence { .. }) => self.low_confidence += 1,
            Some(WatchEvent::Error { .. }) => self.errors += 1,
            Some(WatchEvent::File(_)) | None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_protocol::{Category, FlowConfig};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct Fixture {
        _store: TempDir,
        notes: TempDir,
        storage: Arc<StorageManager>,
    }

    async fn fixture() -> Fixture {
        let store = TempDir::new().unwrap();
        let notes = TempDir::new().unwrap();
        let storage = Arc::new(StorageManager::open(store.path()).await.unwrap());
        Fixture {
            _store: store,
            notes,
            storage,
        }
    }

    fn pipeline(fixture: &Fixture, config: FlowConfig) -> Pipeline {
        let config = WatcherConfig::from_flow_config(&config.with_watch_root(fixture.notes.path()));
        Pipeline::new(
            config,
            Arc::new(Classifier::new()),
            Some(Arc::clone(&fixture.storage)),
        )
    }

    fn write(fixture: &Fixture, relative: &str, content: &str) -> FileEvent {
        let path = fixture.notes.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        FileEvent::new(FileEventKind::Add, path)
    }

    #[tokio::test]
    async fn test_stores_classified_file() {
        let fixture = fixture().await;
        let pipeline = pipeline(&fixture, FlowConfig::new(fixture.storage.root()));
        let event = write(&fixture, "characters/kael.md", "---\ntags: [hero]\n---\nKael rides north.");

        let Some(WatchEvent::Stored { artifact, duplicate, .. }) = pipeline.process(&event).await else {
            panic!("expected a stored event");
        };
        assert!(!duplicate);
        assert_eq!(artifact.category, Category::Character);
        assert_eq!(artifact.workspace, fixture.notes.path().file_name().map(|n| n.to_string_lossy().into_owned()));
        assert!(artifact.has_tag("hero"));

        // Stored bytes keep the front-matter.
        let stored = fixture.storage.get_content(&artifact.id).await.unwrap().unwrap();
        assert!(stored.starts_with(b"---\n"));

        let again = pipeline.process(&event).await;
        assert!(matches!(again, Some(WatchEvent::Stored { duplicate: true, .. })));
    }

    #[tokio::test]
    async fn test_resaved_file_replaces_its_record() {
        let fixture = fixture().await;
        let pipeline = pipeline(&fixture, FlowConfig::new(fixture.storage.root()));

        // Rename-on-save editors report every save as an add.
        let mut ids = Vec::new();
        for draft in ["Kael rides north.", "Kael rides north at dawn.", "Kael turns back."] {
            let event = write(&fixture, "characters/kael.md", draft);
            let Some(WatchEvent::Stored { artifact, .. }) = pipeline.process(&event).await else {
                panic!("expected a stored event");
            };
            ids.push(artifact.id);
        }

        let records = fixture.storage.list(None).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "characters/kael.md");
        assert!(ids.iter().all(|id| *id == records[0].id));
        let stored = fixture.storage.get_content(&records[0].id).await.unwrap().unwrap();
        assert_eq!(stored, b"Kael turns back.");
    }

    #[tokio::test]
    async fn test_low_confidence_is_not_stored() {
        let fixture = fixture().await;
        let mut pipeline = pipeline(&fixture, FlowConfig::new(fixture.storage.root()));
        pipeline.config.confidence_floor = 0.9;
        let event = write(&fixture, "misc/note.txt", "buy milk");

        let outcome = pipeline.process(&event).await;
        assert!(matches!(outcome, Some(WatchEvent::LowConfidence { .. })));
        assert!(fixture.storage.list(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_auto_store_off_only_classifies() {
        let fixture = fixture().await;
        let pipeline = pipeline(&fixture, FlowConfig::new(fixture.storage.root()).without_auto_store());
        let event = write(&fixture, "settings.json", "{}");

        let Some(WatchEvent::Classified { classification, .. }) = pipeline.process(&event).await else {
            panic!("expected a classified event");
        };
        assert_eq!(classification.category, Category::Config);
        assert!(fixture.storage.list(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_removes_and_unreadable_files() {
        let fixture = fixture().await;
        let pipeline = pipeline(&fixture, FlowConfig::new(fixture.storage.root()));

        let removed = FileEvent::new(FileEventKind::Remove, fixture.notes.path().join("gone.md"));
        assert!(pipeline.process(&removed).await.is_none());

        let missing = FileEvent::new(FileEventKind::Add, fixture.notes.path().join("gone.md"));
        assert!(matches!(pipeline.process(&missing).await, Some(WatchEvent::Error { .. })));
    }

    #[test]
    fn test_scan_summary_tally() {
        let event = FileEvent::new(FileEventKind::Add, "/notes/a.md");
        let mut summary = ScanSummary::default();
        summary.record(None);
        summary.record(Some(&WatchEvent::Error {
            path: event.path.clone(),
            message: "boom".to_string(),
        }));

        assert_eq!(summary.seen, 2);
        assert_eq!(summary.errors, 1);
    }
}
