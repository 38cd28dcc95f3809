//! The persisted artifact record.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Metadata;
use crate::category::Category;

/// A classified file that has been stored under the storage root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// File name the artifact was submitted under.
    pub file_name: String,

    /// Where the file came from, when it was picked up from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,

    /// Location relative to the storage root, always `/`-separated.
    pub path: String,

    pub category: Category,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub metadata: Metadata,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Label of the workspace (watch root) the artifact was ingested from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,

    /// Truncated SHA-256 of the raw bytes.
    pub checksum: String,
}

impl Artifact {
    /// Refresh the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether the artifact carries the given tag (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Apply a partial update and refresh the update timestamp.
    pub fn apply_patch(&mut self, patch: &ArtifactPatch) {
        if let Some(ref tags) = patch.tags {
            self.tags = tags.iter().cloned().collect();
        }
        if let Some(ref metadata) = patch.metadata {
            for (key, value) in metadata {
                self.metadata.insert(key.clone(), value.clone());
            }
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(ref subcategory) = patch.subcategory {
            self.subcategory = Some(subcategory.clone());
        }
        self.touch();
    }
}

/// Partial update for an [`Artifact`].
///
/// Tags replace the existing set; metadata is merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPatch {
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Metadata>,
    pub category: Option<Category>,
    pub subcategory: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Artifact {
        let now = Utc::now();
        Artifact {
            id: "a1".to_string(),
            file_name: "kael.md".to_string(),
            source_path: None,
            path: "characters/kael.md".to_string(),
            category: Category::Character,
            subcategory: None,
            element: None,
            gate: None,
            owner: None,
            tags: BTreeSet::from(["Hero".to_string()]),
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
            workspace: None,
            checksum: "0123456789abcdef".to_string(),
        }
    }

    #[test]
    fn test_patch_replaces_tags_and_merges_metadata() {
        let mut artifact = sample();
        artifact.metadata.insert("keep".to_string(), json!(1));
        let before = artifact.updated_at;

        let mut metadata = Metadata::new();
        metadata.insert("added".to_string(), json!(true));
        artifact.apply_patch(&ArtifactPatch {
            tags: Some(vec!["villain".to_string()]),
            metadata: Some(metadata),
            subcategory: Some("villains".to_string()),
            ..Default::default()
        });

        assert!(artifact.has_tag("VILLAIN"));
        assert!(!artifact.has_tag("hero"));
        assert_eq!(artifact.metadata.len(), 2);
        assert_eq!(artifact.subcategory.as_deref(), Some("villains"));
        assert!(artifact.updated_at >= before);
    }

    #[test]
    fn test_timestamps_serialize_as_rfc3339() {
        let artifact = sample();
        let value = serde_json::to_value(&artifact).unwrap();
        let created = value["created_at"].as_str().unwrap();
        assert!(created.parse::<DateTime<Utc>>().is_ok());
        assert!(value.get("source_path").is_none());
    }
}
