//! Artifact watcher implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use artifact_classifier::Classifier;
use artifact_storage::StorageManager;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::{PathFilter, WatcherConfig};
use crate::debounce::Debouncer;
use crate::error::{Result, WatcherError};
use crate::event::{FileEvent, FileEventKind, FileSnapshot, WatchEvent};
use crate::pipeline::{Pipeline, ScanSummary};

/// Capacity of the raw notification and worker channels.
const CHANNEL_CAPACITY: usize = 1000;

/// Capacity of the subscriber broadcast channel.
const BROADCAST_CAPACITY: usize = 256;

/// Lifecycle of a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatcherState {
    /// Not watching.
    Idle,

    /// Watching and emitting events.
    Active,

    /// Draining after a stop request.
    Stopping,
}

/// A notification as it leaves the notify callback.
#[derive(Debug)]
struct RawEvent {
    kind: FileEventKind,
    path: PathBuf,
    snapshot: FileSnapshot,
}

/// Resources of one active watch session.
struct Session {
    watcher: RecommendedWatcher,
    cancel: CancellationToken,
    debounce_task: JoinHandle<()>,
    worker_task: JoinHandle<()>,
}

/// Watches directories and feeds settled files through classification and
/// storage.
///
/// ```text
/// notify ──► raw channel ──► debounce loop ──► worker channel ──► worker
///                                                                   │
///                                     subscribers ◄── broadcast ◄───┘
/// ```
pub struct ArtifactWatcher {
    /// Shared classify/store step.
    pipeline: Arc<Pipeline>,

    /// Subscriber channel.
    events_tx: broadcast::Sender<WatchEvent>,

    /// Current lifecycle state.
    state_tx: watch::Sender<WatcherState>,

    /// Present while active.
    session: Option<Session>,
}

impl ArtifactWatcher {
    /// Create an idle watcher. Without storage, settled files are only
    /// classified.
    pub fn new(
        config: WatcherConfig,
        classifier: Arc<Classifier>,
        storage: Option<Arc<StorageManager>>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (state_tx, _) = watch::channel(WatcherState::Idle);

        Self {
            pipeline: Arc::new(Pipeline::new(config, classifier, storage)),
            events_tx,
            state_tx,
            session: None,
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        self.pipeline.config()
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events_tx.subscribe()
    }

    pub fn state(&self) -> WatcherState {
        *self.state_tx.borrow()
    }

    /// Observe state transitions.
    pub fn state_changes(&self) -> watch::Receiver<WatcherState> {
        self.state_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.state() == WatcherState::Active
    }

    /// Start watching every configured root.
    ///
    /// Fails without side effects when the watcher is not idle, no roots
    /// are configured, or a root is missing.
    pub async fn start(&mut self) -> Result<()> {
        if self.state() != WatcherState::Idle {
            return Err(WatcherError::AlreadyRunning);
        }
        let config = self.config().clone();
        validate_roots(&config.roots)?;

        let (raw_tx, raw_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (work_tx, work_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let filter = config.filter.clone();
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let Some(kind) = FileEventKind::from_notify(event.kind) else {
                        return;
                    };
                    for path in event.paths {
                        if path.is_dir() || !filter.accepts(&path) {
                            continue;
                        }
                        let raw = RawEvent {
                            kind,
                            snapshot: FileSnapshot::probe(&path),
                            path,
                        };
                        if let Err(e) = raw_tx.blocking_send(raw) {
                            error!("Failed to send file event: {e}");
                        }
                    }
                }
                Err(e) => {
                    warn!("Watch error: {e}");
                }
            },
        )?;

        for root in &config.roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            debug!("Started watching: {}", root.display());
        }

        let cancel = CancellationToken::new();
        let debouncer = Debouncer::new(config.debounce, config.stability_threshold);
        let debounce_task = tokio::spawn(debounce_loop(
            raw_rx,
            work_tx,
            debouncer,
            tick_interval(config.debounce),
            cancel.clone(),
        ));
        let worker_task = tokio::spawn(worker_loop(
            work_rx,
            Arc::clone(&self.pipeline),
            self.events_tx.clone(),
            cancel.clone(),
        ));

        self.session = Some(Session {
            watcher,
            cancel,
            debounce_task,
            worker_task,
        });
        self.state_tx.send_replace(WatcherState::Active);
        info!("Artifact watcher started on {} root(s)", config.roots.len());
        Ok(())
    }

    /// Stop watching. Waits for the file currently being processed, then
    /// returns to idle. A no-op when idle.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.state_tx.send_replace(WatcherState::Stopping);

        // No notifications after this point.
        drop(session.watcher);
        session.cancel.cancel();

        for (name, task) in [("debounce", session.debounce_task), ("worker", session.worker_task)] {
            if let Err(e) = task.await {
                warn!("Watcher {name} task ended abnormally: {e}");
            }
        }

        self.state_tx.send_replace(WatcherState::Idle);
        info!("Artifact watcher stopped");
    }

    /// Run every existing file under the watch roots through the pipeline
    /// as an add. Events are published to subscribers as they happen.
    pub async fn scan(&self) -> Result<ScanSummary> {
        let config = self.config();
        validate_roots(&config.roots)?;

        let roots = config.roots.clone();
        let filter = config.filter.clone();
        let paths = tokio::task::spawn_blocking(move || collect_files(&roots, &filter))
            .await
            .map_err(std::io::Error::other)?;

        let mut summary = ScanSummary::default();
        for path in paths {
            let event = FileEvent::new(FileEventKind::Add, &path).with_snapshot(FileSnapshot::probe(&path));
            let _ = self.events_tx.send(WatchEvent::File(event.clone()));
            let outcome = self.pipeline.process(&event).await;
            summary.record(outcome.as_ref());
            if let Some(outcome) = outcome {
                let _ = self.events_tx.send(outcome);
            }
        }

        info!(
            "Scan finished: {} seen, {} stored, {} duplicates, {} errors",
            summary.seen, summary.stored, summary.duplicates, summary.errors
        );
        Ok(summary)
    }
}

impl Drop for ArtifactWatcher {
    fn drop(&mut self) {
        if let Some(ref session) = self.session {
            session.cancel.cancel();
        }
    }
}

fn validate_roots(roots: &[PathBuf]) -> Result<()> {
    if roots.is_empty() {
        return Err(WatcherError::NoWatchRoots);
    }
    match roots.iter().find(|root| !root.is_dir()) {
        Some(missing) => Err(WatcherError::DirectoryNotFound(missing.display().to_string())),
        None => Ok(()),
    }
}

/// Files under `roots` that pass the filter, in walk order.
fn collect_files(roots: &[PathBuf], filter: &PathFilter) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in roots {
        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        for entry in walker.into_iter().filter_map(std::result::Result::ok) {
            if entry.file_type().is_file() && filter.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files
}

/// How often pending paths are checked for readiness.
fn tick_interval(debounce: Duration) -> Duration {
    (debounce / 2).clamp(Duration::from_millis(10), Duration::from_millis(250))
}

async fn debounce_loop(
    mut raw_rx: mpsc::Receiver<RawEvent>,
    work_tx: mpsc::Sender<FileEvent>,
    mut debouncer: Debouncer,
    tick: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            raw = raw_rx.recv() => match raw {
                Some(raw) => debouncer.notify(raw.path, raw.kind, raw.snapshot, Instant::now()),
                None => break,
            },
            _ = ticker.tick() => {
                for settled in debouncer.poll(Instant::now(), FileSnapshot::probe) {
                    let event = FileEvent::new(settled.kind, settled.path).with_snapshot(settled.snapshot);
                    if work_tx.send(event).await.is_err() {
                        error!("Watcher worker channel closed");
                        return;
                    }
                }
            }
        }
    }

    if !debouncer.is_empty() {
        debug!("Dropping {} unsettled path(s) on stop", debouncer.len());
    }
}

async fn worker_loop(
    mut work_rx: mpsc::Receiver<FileEvent>,
    pipeline: Arc<Pipeline>,
    events_tx: broadcast::Sender<WatchEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = work_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        debug!("Processing {:?} {}", event.kind, event.path.display());
        // Send errors only mean nobody is subscribed.
        let _ = events_tx.send(WatchEvent::File(event.clone()));
        if let Some(outcome) = pipeline.process(&event).await {
            let _ = events_tx.send(outcome);
        }
    }
}
