//! Watcher configuration and path filtering.

use std::path::{Path, PathBuf};
use std::time::Duration;

use artifact_classifier::extensions::is_supported;
use artifact_protocol::FlowConfig;
use wildmatch::WildMatch;

/// Minimum confidence for a watched file to be stored.
pub const CONFIDENCE_FLOOR: f32 = 0.5;

/// Settings for one watcher, derived from a [`FlowConfig`].
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Directories to watch recursively.
    pub roots: Vec<PathBuf>,

    /// Which paths are considered at all.
    pub filter: PathFilter,

    /// Coalescing window for notifications on one path.
    pub debounce: Duration,

    /// Quiet period before an added or changed file is processed.
    pub stability_threshold: Duration,

    /// Classify files after they settle.
    pub auto_classify: bool,

    /// Store classified files.
    pub auto_store: bool,

    /// Minimum confidence for storing.
    pub confidence_floor: f32,
}

impl WatcherConfig {
    pub fn from_flow_config(config: &FlowConfig) -> Self {
        Self {
            roots: config.watch_roots.clone(),
            filter: PathFilter::new(&config.ignore_patterns),
            debounce: config.debounce(),
            stability_threshold: config.stability_threshold(),
            auto_classify: config.auto_classify,
            auto_store: config.auto_store,
            confidence_floor: CONFIDENCE_FLOOR,
        }
    }

    /// How long an added or changed file must stay quiet.
    pub fn quiet_period(&self) -> Duration {
        self.debounce.max(self.stability_threshold)
    }

    /// Watch root containing `path`, deepest first.
    pub fn root_of(&self, path: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .map(PathBuf::as_path)
    }
}

impl From<&FlowConfig> for WatcherConfig {
    fn from(config: &FlowConfig) -> Self {
        Self::from_flow_config(config)
    }
}

/// Ignore globs plus the supported-extension check.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    ignore: Vec<WildMatch>,
}

impl PathFilter {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            ignore: patterns.iter().map(|p| WildMatch::new(p.as_str())).collect(),
        }
    }

    /// Whether any ignore pattern matches the `/`-separated path.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");
        self.ignore.iter().any(|glob| glob.matches(&normalized))
    }

    /// Whether a file at `path` should enter the pipeline.
    pub fn accepts(&self, path: &Path) -> bool {
        is_supported(path) && !self.is_ignored(path)
    }
}
