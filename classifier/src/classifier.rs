//! The rule engine and its merge policy.

use std::path::Path;

use artifact_protocol::{Category, ClassificationResult, PartialClassification};
use serde_json::json;
use tracing::debug;

use crate::context::ClassificationContext;
use crate::rule::{FALLBACK_CONFIDENCE, Rule};
use crate::vocabulary::Vocabulary;

/// Lowest confidence a merged result may carry.
const MIN_CONFIDENCE: f32 = 0.01;

/// Confidence assumed for a rule that names a category without a score.
const DEFAULT_RULE_CONFIDENCE: f32 = 0.5;

/// Runs every registered rule against a context and merges the results.
///
/// Build one at start-up and share it (e.g. behind an `Arc`); it holds no
/// interior state and classification only needs `&self`.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Rules sorted by priority, highest first.
    rules: Vec<Rule>,

    vocabulary: Vocabulary,
}

impl Classifier {
    /// Classifier with the default rules and vocabulary.
    pub fn new() -> Self {
        Self::with_vocabulary(Vocabulary::default())
    }

    /// Classifier with the default rules and a custom vocabulary.
    pub fn with_vocabulary(vocabulary: Vocabulary) -> Self {
        let mut classifier = Self {
            rules: Vec::new(),
            vocabulary,
        };
        for rule in Rule::defaults() {
            classifier.register(rule);
        }
        classifier
    }

    /// Add a rule. Rules with equal priority keep registration order.
    pub fn register(&mut self, rule: Rule) {
        let priority = rule.priority();
        let position = self
            .rules
            .iter()
            .position(|existing| existing.priority() < priority)
            .unwrap_or(self.rules.len());
        self.rules.insert(position, rule);
    }

    /// Registered rules in fold order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Classify a context. Never fails.
    pub fn classify(&self, ctx: &ClassificationContext) -> ClassificationResult {
        let mut matched = Vec::new();
        for rule in &self.rules {
            if !rule.matches(ctx, &self.vocabulary) {
                continue;
            }
            match rule.classify(ctx, &self.vocabulary) {
                Ok(partial) => matched.push((rule.name().to_string(), partial)),
                Err(e) => debug!("Rule {} skipped for {}: {e}", rule.name(), ctx.path),
            }
        }

        let result = merge(matched);
        debug!(
            "Classified {} as {} ({:.2}): {}",
            ctx.path, result.category, result.confidence, result.reasoning
        );
        result
    }

    /// Classify raw bytes for a file name or path.
    pub fn classify_bytes(&self, path: impl AsRef<Path>, bytes: Vec<u8>) -> ClassificationResult {
        self.classify(&ClassificationContext::from_bytes(path, bytes))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold partial results in priority order.
///
/// - category, confidence and reasoning travel together from the partial
///   with the highest confidence; ties keep the earlier one
/// - subcategory, element, gate and owner: last writer wins
/// - tags: union
/// - metadata: shallow merge, last writer wins
fn merge(matched: Vec<(String, PartialClassification)>) -> ClassificationResult {
    let mut result = ClassificationResult::new(
        Category::Unknown,
        FALLBACK_CONFIDENCE,
        "no rule recognised this file",
    );
    let mut best: Option<f32> = None;
    let mut names = Vec::with_capacity(matched.len());

    for (name, partial) in matched {
        if let Some(category) = partial.category {
            let confidence = partial.confidence.unwrap_or(DEFAULT_RULE_CONFIDENCE);
            if best.is_none_or(|current| confidence > current) {
                best = Some(confidence);
                result.category = category;
                result.confidence = confidence;
                result.reasoning = partial
                    .reasoning
                    .unwrap_or_else(|| format!("matched rule {name}"));
            }
        }

        if partial.subcategory.is_some() {
            result.subcategory = partial.subcategory;
        }
        if partial.element.is_some() {
            result.element = partial.element;
        }
        if partial.gate.is_some() {
            result.gate = partial.gate;
        }
        if partial.owner.is_some() {
            result.owner = partial.owner;
        }
        result
            .tags
            .extend(partial.tags.into_iter().filter(|t| !t.is_empty()));
        result.metadata.extend(partial.metadata);
        names.push(name);
    }

    result.confidence = if result.confidence.is_finite() {
        result.confidence.clamp(MIN_CONFIDENCE, 1.0)
    } else {
        MIN_CONFIDENCE
    };
    if result.reasoning.trim().is_empty() {
        result.reasoning = format!("classified as {}", result.category);
    }
    result.metadata.insert("matched_rules".to_string(), json!(names));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FileContent;
    use crate::rule::PatternRule;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_front_matter_hint_beats_keywords() {
        let classifier = Classifier::new();
        let result = classifier.classify_bytes(
            "kael.md",
            b"---\ntype: character\n---\nHis personality was shaped by a grim backstory.".to_vec(),
        );
        assert_eq!(result.category, Category::Character);
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn test_png_is_always_an_image() {
        let classifier = Classifier::new();
        for bytes in [vec![0x89, b'P', b'N', b'G'], b"personality backstory".to_vec()] {
            let result = classifier.classify_bytes("characters/portrait.png", bytes);
            assert_eq!(result.category, Category::Image);
            assert!(result.confidence >= 0.9);
        }
    }

    #[test]
    fn test_unrecognised_file_is_unknown_but_confident() {
        let classifier = Classifier::new();
        let result = classifier.classify_bytes("blob", vec![0, 1, 2, 3]);
        assert_eq!(result.category, Category::Unknown);
        assert!(result.confidence > 0.0);
        assert!(!result.reasoning.is_empty());
    }

    #[test]
    fn test_classification_is_total_for_odd_inputs() {
        let classifier = Classifier::new();
        let inputs: Vec<(&str, Vec<u8>)> = vec![
            ("", Vec::new()),
            ("---", b"---\n".to_vec()),
            ("a.md", b"---\ntype: 42\n---\n".to_vec()),
            ("b.md", b"---\ntags: {a: 1}\n---\n".to_vec()),
            ("c.json", vec![0xff, 0xfe, 0xfd]),
            ("d/e/f.arc", "日本語のテキスト".as_bytes().to_vec()),
        ];
        for (name, bytes) in inputs {
            let result = classifier.classify_bytes(name, bytes);
            assert!(result.confidence > 0.0 && result.confidence <= 1.0, "{name}");
            assert!(!result.reasoning.is_empty(), "{name}");
        }
    }

    #[test]
    fn test_merge_policy() {
        let first = PartialClassification::category(Category::Lore, 0.7, "first")
            .with_subcategory("history")
            .with_tag("a")
            .with_metadata("k", json!(1));
        let tie = PartialClassification::category(Category::Creature, 0.7, "tie")
            .with_tag("b")
            .with_metadata("k", json!(2));
        let later = PartialClassification::default()
            .with_subcategory("legends")
            .with_tag("a");

        let result = merge(vec![
            ("first".to_string(), first),
            ("tie".to_string(), tie),
            ("later".to_string(), later),
        ]);

        assert_eq!(result.category, Category::Lore);
        assert_eq!(result.reasoning, "first");
        assert_eq!(result.subcategory.as_deref(), Some("legends"));
        assert_eq!(result.tags.len(), 2);
        assert_eq!(result.metadata.get("k"), Some(&json!(2)));
    }

    #[test]
    fn test_repeated_classification_is_identical() {
        let classifier = Classifier::new();
        let ctx = ClassificationContext::new(
            "lore/history/fall.md",
            FileContent::Text(
                "An ancient prophecy of fire and water, told by Lyra at the Crown Gate.".into(),
            ),
        );
        let first = classifier.classify(&ctx);
        for _ in 0..10 {
            assert_eq!(classifier.classify(&ctx), first);
        }
    }

    #[test]
    fn test_register_keeps_priority_order() {
        let mut classifier = Classifier::new();
        classifier.register(Rule::Pattern(PatternRule::new(
            "drafts",
            90,
            "drafts/*",
            PartialClassification::default().with_tag("draft"),
        )));
        let priorities: Vec<u32> = classifier.rules().iter().map(Rule::priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        sorted.reverse();
        assert_eq!(priorities, sorted);

        // Equal priority lands after the built-in rule.
        let names: Vec<&str> = classifier.rules().iter().map(Rule::name).collect();
        let location = names.iter().position(|n| *n == "source_location").unwrap();
        assert_eq!(names[location + 1], "drafts");
    }
}
