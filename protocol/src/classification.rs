//! Classification results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Metadata;
use crate::category::Category;

/// The final answer the classifier gives for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Top-level category.
    pub category: Category,

    /// Finer-grained kind within the category (e.g. "heroes", "skill").
    pub subcategory: Option<String>,

    /// Confidence score (0.0 exclusive to 1.0 inclusive).
    pub confidence: f32,

    /// Elemental affinity, if any.
    pub element: Option<String>,

    /// Gate affinity, if any.
    pub gate: Option<String>,

    /// Persona the artifact is attributed to.
    pub owner: Option<String>,

    /// Free-form tags.
    pub tags: BTreeSet<String>,

    /// Open metadata (front-matter, detector details).
    pub metadata: Metadata,

    /// Human-readable explanation of the winning rule.
    pub reasoning: String,
}

impl ClassificationResult {
    /// Create a result with only a category, confidence and reasoning.
    pub fn new(category: Category, confidence: f32, reasoning: impl Into<String>) -> Self {
        Self {
            category,
            subcategory: None,
            confidence,
            element: None,
            gate: None,
            owner: None,
            tags: BTreeSet::new(),
            metadata: Metadata::new(),
            reasoning: reasoning.into(),
        }
    }

    /// Apply caller-supplied overrides on top of this result.
    ///
    /// The category override is expected to have already been fed to the
    /// classifier as a type hint, so only the descriptive fields are
    /// touched here.
    pub fn apply_overrides(&mut self, overrides: &ClassificationOverrides) {
        if let Some(ref subcategory) = overrides.subcategory {
            self.subcategory = Some(subcategory.clone());
        }
        if let Some(ref element) = overrides.element {
            self.element = Some(element.clone());
        }
        if let Some(ref gate) = overrides.gate {
            self.gate = Some(gate.clone());
        }
        if let Some(ref owner) = overrides.owner {
            self.owner = Some(owner.clone());
        }
        self.tags.extend(overrides.tags.iter().cloned());
        for (key, value) in &overrides.metadata {
            self.metadata.insert(key.clone(), value.clone());
        }
    }
}

/// What a single classification rule contributes.
///
/// Every field is optional; the classifier folds partials from all
/// matching rules into one [`ClassificationResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialClassification {
    pub category: Option<Category>,
    pub subcategory: Option<String>,
    pub confidence: Option<f32>,
    pub element: Option<String>,
    pub gate: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub reasoning: Option<String>,
}

impl PartialClassification {
    /// A partial that proposes a category.
    pub fn category(category: Category, confidence: f32, reasoning: impl Into<String>) -> Self {
        Self {
            category: Some(category),
            confidence: Some(confidence),
            reasoning: Some(reasoning.into()),
            ..Default::default()
        }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn with_gate(mut self, gate: impl Into<String>) -> Self {
        self.gate = Some(gate.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Caller-supplied adjustments for an explicit store request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOverrides {
    /// Forced category, treated as an explicit type hint.
    pub category: Option<Category>,
    pub subcategory: Option<String>,
    pub element: Option<String>,
    pub gate: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ClassificationOverrides {
    /// Overrides that only force a category.
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }
}
