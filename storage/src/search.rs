//! Linear search over the active index.

use artifact_protocol::{Artifact, Category};
use serde::{Deserialize, Serialize};

/// Score of a query found in the file name.
pub const FILE_NAME_SCORE: f32 = 1.0;
/// Score of a query found in any searchable field.
pub const FIELD_SCORE: f32 = 0.8;
/// Score of a single query word found in any searchable field.
pub const WORD_SCORE: f32 = 0.5;

/// Filters and pagination for a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Free-text query. Empty matches everything.
    pub query: String,

    pub category: Option<Category>,

    pub element: Option<String>,

    pub gate: Option<String>,

    /// Every tag listed must be present on the artifact.
    pub tags: Vec<String>,

    pub limit: Option<usize>,

    pub offset: usize,
}

impl SearchOptions {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Whether the artifact passes every hard filter.
    pub fn accepts(&self, artifact: &Artifact) -> bool {
        if self.category.is_some_and(|c| c != artifact.category) {
            return false;
        }
        if !field_matches(self.element.as_deref(), artifact.element.as_deref()) {
            return false;
        }
        if !field_matches(self.gate.as_deref(), artifact.gate.as_deref()) {
            return false;
        }
        self.tags.iter().all(|tag| artifact.has_tag(tag))
    }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual.is_some_and(|actual| actual.eq_ignore_ascii_case(wanted)),
    }
}

/// A search result with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub artifact: Artifact,
    pub score: f32,
}

/// Relevance of an artifact for a query, `None` when it does not match.
pub fn score(artifact: &Artifact, query: &str) -> Option<f32> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Some(FILE_NAME_SCORE);
    }
    if artifact.file_name.to_lowercase().contains(&query) {
        return Some(FILE_NAME_SCORE);
    }

    let haystack = searchable_text(artifact);
    if haystack.contains(&query) {
        return Some(FIELD_SCORE);
    }
    query
        .split_whitespace()
        .any(|word| haystack.contains(word))
        .then_some(WORD_SCORE)
}

/// File name, category, subcategory, owner and tags, lowercased.
fn searchable_text(artifact: &Artifact) -> String {
    let mut fields = vec![artifact.file_name.as_str(), artifact.category.as_str()];
    fields.extend(artifact.subcategory.as_deref());
    fields.extend(artifact.owner.as_deref());
    fields.extend(artifact.tags.iter().map(String::as_str));
    fields.join(" ").to_lowercase()
}

/// Filter, score, sort and paginate.
pub fn search<'a>(
    artifacts: impl Iterator<Item = &'a Artifact>,
    options: &SearchOptions,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = artifacts
        .filter(|artifact| options.accepts(artifact))
        .filter_map(|artifact| {
            score(artifact, &options.query).map(|score| SearchHit {
                artifact: artifact.clone(),
                score,
            })
        })
        .collect();

    // Stable, so equal scores keep index order.
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));

    let page = hits.into_iter().skip(options.offset);
    match options.limit {
        Some(limit) => page.take(limit).collect(),
        None => page.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_protocol::Metadata;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn artifact(id: &str, file_name: &str, category: Category, tags: &[&str]) -> Artifact {
        let now = Utc::now();
        Artifact {
            id: id.to_string(),
            file_name: file_name.to_string(),
            source_path: None,
            path: format!("x/{file_name}"),
            category,
            subcategory: None,
            element: None,
            gate: None,
            owner: None,
            tags: tags.iter().map(ToString::to_string).collect::<BTreeSet<_>>(),
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
            workspace: None,
            checksum: id.to_string(),
        }
    }

    fn corpus() -> Vec<Artifact> {
        vec![
            artifact("1", "dragon-notes.md", Category::Lore, &["fire"]),
            artifact("2", "kael.md", Category::Character, &["dragon", "hero"]),
            artifact("3", "map.png", Category::Image, &[]),
            artifact("4", "ember.md", Category::Creature, &["fire", "dragon"]),
        ]
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.artifact.id.as_str()).collect()
    }

    #[test]
    fn test_scores() {
        let kael = artifact("2", "kael.md", Category::Character, &["dragon rider"]);
        assert_eq!(score(&kael, "KAEL"), Some(FILE_NAME_SCORE));
        assert_eq!(score(&kael, "dragon rider"), Some(FIELD_SCORE));
        assert_eq!(score(&kael, "red dragon"), Some(WORD_SCORE));
        assert_eq!(score(&kael, "unicorn"), None);
        assert_eq!(score(&kael, "  "), Some(FILE_NAME_SCORE));
    }

    #[test]
    fn test_ranking_is_stable() {
        let corpus = corpus();
        let hits = search(corpus.iter(), &SearchOptions::query("dragon"));
        assert_eq!(ids(&hits), vec!["1", "2", "4"]);
        assert_eq!(hits[0].score, FILE_NAME_SCORE);
        assert_eq!(hits[1].score, FIELD_SCORE);
    }

    #[test]
    fn test_filters_apply_before_scoring() {
        let corpus = corpus();
        let options = SearchOptions::default().with_tag("FIRE");
        assert_eq!(ids(&search(corpus.iter(), &options)), vec!["1", "4"]);

        let options = SearchOptions::query("dragon")
            .with_category(Category::Creature)
            .with_tag("fire");
        assert_eq!(ids(&search(corpus.iter(), &options)), vec!["4"]);
    }

    #[test]
    fn test_pagination_prefix_is_monotonic() {
        let corpus = corpus();
        let full = search(corpus.iter(), &SearchOptions::default());
        for limit in 0..=full.len() {
            let page = search(corpus.iter(), &SearchOptions::default().with_limit(limit));
            assert_eq!(ids(&page), ids(&full[..limit]));
        }

        let second = search(
            corpus.iter(),
            &SearchOptions::default().with_offset(1).with_limit(2),
        );
        assert_eq!(ids(&second), vec!["2", "3"]);
    }
}
