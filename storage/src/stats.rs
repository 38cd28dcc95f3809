//! Aggregate counts over the active index.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use artifact_protocol::{Artifact, Category};
use serde::Serialize;

/// Number of recent artifacts reported by default.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorageStats {
    pub total: usize,

    pub by_category: BTreeMap<Category, usize>,

    /// Counts per element, for artifacts that have one.
    pub by_element: BTreeMap<String, usize>,

    /// Most recently created artifacts, newest first.
    pub recent: Vec<Artifact>,
}

impl StorageStats {
    pub fn collect<'a>(artifacts: impl Iterator<Item = &'a Artifact>, recent_limit: usize) -> Self {
        let mut stats = Self::default();
        let mut all = Vec::new();
        for artifact in artifacts {
            stats.total += 1;
            *stats.by_category.entry(artifact.category).or_default() += 1;
            if let Some(ref element) = artifact.element {
                *stats.by_element.entry(element.to_lowercase()).or_default() += 1;
            }
            all.push(artifact);
        }

        // Stable sort: artifacts created in the same instant keep index order.
        all.sort_by_key(|a| Reverse(a.created_at));
        stats.recent = all.into_iter().take(recent_limit).cloned().collect();
        stats
    }
}
