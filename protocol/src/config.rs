//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Current schema version of [`FlowConfig`].
pub const FLOW_CONFIG_VERSION: u32 = 1;

/// Process-wide pipeline configuration.
///
/// Loaded when the pipeline starts and persisted next to the storage root
/// whenever it changes. The file is advisory: two processes sharing a
/// storage root are not kept from stepping on each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Schema version.
    pub version: u32,

    /// Root directory of the artifact store.
    pub storage_root: PathBuf,

    /// Directories the watcher observes.
    pub watch_roots: Vec<PathBuf>,

    /// Glob patterns the watcher skips.
    pub ignore_patterns: Vec<String>,

    /// Classify files picked up by the watcher.
    pub auto_classify: bool,

    /// Store files picked up by the watcher.
    pub auto_store: bool,

    /// Window over which notifications for one path are coalesced.
    pub debounce_ms: u64,

    /// Quiet period after the last write before a file is processed.
    pub stability_threshold_ms: u64,
}

impl FlowConfig {
    /// Create a configuration rooted at `storage_root`.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            version: FLOW_CONFIG_VERSION,
            storage_root: storage_root.into(),
            watch_roots: Vec::new(),
            ignore_patterns: Self::default_ignores(),
            auto_classify: true,
            auto_store: true,
            debounce_ms: 300,
            stability_threshold_ms: 2000,
        }
    }

    /// Add a directory to watch.
    pub fn with_watch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.watch_roots.push(root.into());
        self
    }

    /// Add an ignore pattern.
    pub fn with_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_patterns.push(pattern.into());
        self
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    /// Set the stability threshold.
    pub fn with_stability_threshold(mut self, threshold: Duration) -> Self {
        self.stability_threshold_ms = threshold.as_millis() as u64;
        self
    }

    /// Disable storing of watched files (classification still runs).
    pub fn without_auto_store(mut self) -> Self {
        self.auto_store = false;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn stability_threshold(&self) -> Duration {
        Duration::from_millis(self.stability_threshold_ms)
    }

    fn default_ignores() -> Vec<String> {
        vec![
            // Version control
            "**/.git/**".to_string(),
            // Dependencies and build output
            "**/node_modules/**".to_string(),
            "**/target/**".to_string(),
            // Editor and system noise
            "**/.DS_Store".to_string(),
            "**/*.swp".to_string(),
            "**/*~".to_string(),
            "**/*.tmp".to_string(),
        ]
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::new(dirs::data_dir().unwrap_or_default().join("artifact-flow"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_builder() {
        let config = FlowConfig::new("/tmp/store")
            .with_watch_root("/tmp/notes")
            .with_stability_threshold(Duration::from_secs(5));

        assert_eq!(config.storage_root, Path::new("/tmp/store"));
        assert_eq!(config.watch_roots.len(), 1);
        assert_eq!(config.stability_threshold(), Duration::from_secs(5));
        assert!(config.auto_store);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: FlowConfig =
            serde_json::from_str(r#"{"storage_root": "/srv/artifacts", "debounce_ms": 50}"#)
                .unwrap();
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.version, FLOW_CONFIG_VERSION);
        assert_eq!(config.stability_threshold_ms, 2000);
    }
}
