//! Per-path coalescing and write-stability tracking.
//!
//! The debouncer is driven by explicit instants so the timing rules can be
//! exercised without sleeping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::event::{FileEventKind, FileSnapshot};

#[derive(Debug, Clone)]
struct Pending {
    kind: FileEventKind,
    last_seen: Instant,
    snapshot: FileSnapshot,
}

/// A path that has settled and can be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    pub path: PathBuf,
    pub kind: FileEventKind,
    pub snapshot: FileSnapshot,
}

/// Coalesces notifications per path and releases them once they settle.
///
/// Removes settle after the debounce window. Adds and changes settle once
/// no notification has arrived for `max(debounce, stability)` and the
/// size/mtime snapshot has stopped moving; any new notification or snapshot
/// change restarts the wait.
#[derive(Debug)]
pub struct Debouncer {
    debounce: Duration,
    quiet: Duration,
    pending: BTreeMap<PathBuf, Pending>,
}

impl Debouncer {
    pub fn new(debounce: Duration, stability_threshold: Duration) -> Self {
        Self {
            debounce,
            quiet: debounce.max(stability_threshold),
            pending: BTreeMap::new(),
        }
    }

    /// Record a notification for `path`.
    pub fn notify(&mut self, path: PathBuf, kind: FileEventKind, snapshot: FileSnapshot, now: Instant) {
        self.pending
            .entry(path)
            .and_modify(|pending| {
                pending.kind = pending.kind.coalesce(kind);
                pending.last_seen = now;
                pending.snapshot = snapshot;
            })
            .or_insert(Pending {
                kind,
                last_seen: now,
                snapshot,
            });
    }

    /// Release every path that has settled by `now`, in path order.
    ///
    /// `probe` reads a fresh snapshot for adds and changes whose quiet
    /// period has elapsed. A file that vanished in the meantime is released
    /// as a remove.
    pub fn poll(&mut self, now: Instant, probe: impl Fn(&Path) -> FileSnapshot) -> Vec<Settled> {
        let (debounce, quiet) = (self.debounce, self.quiet);
        let mut settled = Vec::new();
        self.pending.retain(|path, pending| {
            let idle = now.saturating_duration_since(pending.last_seen);
            if pending.kind == FileEventKind::Remove {
                if idle < debounce {
                    return true;
                }
                settled.push(Settled {
                    path: path.clone(),
                    kind: FileEventKind::Remove,
                    snapshot: FileSnapshot::default(),
                });
                return false;
            }

            if idle < quiet {
                return true;
            }
            let current = probe(path);
            if !current.exists() {
                settled.push(Settled {
                    path: path.clone(),
                    kind: FileEventKind::Remove,
                    snapshot: current,
                });
                return false;
            }
            if current != pending.snapshot {
                // Still being written.
                pending.snapshot = current;
                pending.last_seen = now;
                return true;
            }
            settled.push(Settled {
                path: path.clone(),
                kind: pending.kind,
                snapshot: current,
            });
            false
        });
        settled
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
