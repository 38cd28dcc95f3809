//! Classification rules.
//!
//! Rules are a closed set of variants registered at construction time. Each
//! one has a priority, a predicate ([`Rule::matches`]) and a scorer
//! ([`Rule::classify`]) producing a [`PartialClassification`].

use artifact_protocol::{Category, PartialClassification};
use serde_json::{Value, json};
use wildmatch::WildMatch;

use crate::context::ClassificationContext;
use crate::error::RuleError;
use crate::extensions::{FileFamily, language_for};
use crate::vocabulary::{Vocabulary, count_word};

/// Confidence given to a type hint from the caller or front-matter.
pub const TYPE_HINT_CONFIDENCE: f32 = 0.95;

/// Confidence of the catch-all rule.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

const SKILL_SUFFIX: &str = "-skill";

/// A single classification rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Explicit category from the caller or a front-matter `type` field.
    TypeHint,
    /// Descriptive front-matter fields (subcategory, element, tags, ...).
    FrontMatter,
    /// A path segment naming a known content root.
    SourceLocation,
    /// A path segment ending in `-skill`.
    SkillPath,
    /// Image, code, data and prompt extensions.
    ExtensionFamily,
    /// At least two category keywords in the text.
    ContentKeywords,
    /// Known persona names in the text.
    PersonaMention,
    /// Element and gate vocabulary in the text.
    AffinityVocabulary,
    /// Any other document extension.
    DocumentFallback,
    /// Always matches with `unknown`.
    Fallback,
    /// A caller-registered glob rule.
    Pattern(PatternRule),
}

impl Rule {
    /// The built-in rule set.
    pub fn defaults() -> Vec<Rule> {
        vec![
            Rule::TypeHint,
            Rule::SourceLocation,
            Rule::SkillPath,
            Rule::ExtensionFamily,
            Rule::ContentKeywords,
            Rule::PersonaMention,
            Rule::AffinityVocabulary,
            Rule::DocumentFallback,
            Rule::FrontMatter,
            Rule::Fallback,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            Self::TypeHint => "type_hint",
            Self::FrontMatter => "front_matter",
            Self::SourceLocation => "source_location",
            Self::SkillPath => "skill_path",
            Self::ExtensionFamily => "extension_family",
            Self::ContentKeywords => "content_keywords",
            Self::PersonaMention => "persona_mention",
            Self::AffinityVocabulary => "affinity_vocabulary",
            Self::DocumentFallback => "document_fallback",
            Self::Fallback => "fallback",
            Self::Pattern(rule) => &rule.name,
        }
    }

    /// Higher priorities are folded first. Front-matter folds after every
    /// heuristic so its descriptive fields override theirs.
    pub fn priority(&self) -> u32 {
        match self {
            Self::TypeHint => 100,
            Self::SourceLocation => 90,
            Self::SkillPath => 85,
            Self::ExtensionFamily => 80,
            Self::ContentKeywords => 70,
            Self::PersonaMention => 60,
            Self::AffinityVocabulary => 55,
            Self::DocumentFallback => 10,
            Self::FrontMatter => 5,
            Self::Fallback => 0,
            Self::Pattern(rule) => rule.priority,
        }
    }

    /// Whether this rule applies to the context.
    pub fn matches(&self, ctx: &ClassificationContext, vocab: &Vocabulary) -> bool {
        match self {
            Self::TypeHint => ctx.type_hint.is_some() || hint_field(ctx).is_some(),
            Self::FrontMatter => ctx.front_matter.as_ref().is_some_and(|fm| !fm.is_empty()),
            Self::SourceLocation => find_content_root(ctx, vocab).is_some(),
            Self::SkillPath => find_skill_segment(ctx).is_some(),
            Self::ExtensionFamily => matches!(
                ctx.family(),
                Some(FileFamily::Image | FileFamily::Code | FileFamily::Data | FileFamily::Prompt)
            ),
            Self::ContentKeywords => keyword_match(ctx, vocab).is_some(),
            Self::PersonaMention => persona_match(ctx, vocab).is_some(),
            Self::AffinityVocabulary => affinity_match(ctx, vocab).is_some(),
            Self::DocumentFallback => ctx.family() == Some(FileFamily::Document),
            Self::Fallback => true,
            Self::Pattern(rule) => rule.matches(ctx),
        }
    }

    /// Score a context this rule matched.
    pub fn classify(
        &self,
        ctx: &ClassificationContext,
        vocab: &Vocabulary,
    ) -> Result<PartialClassification, RuleError> {
        match self {
            Self::TypeHint => classify_type_hint(ctx),
            Self::FrontMatter => classify_front_matter(ctx),
            Self::SourceLocation => Ok(classify_location(ctx, vocab)),
            Self::SkillPath => Ok(classify_skill(ctx)),
            Self::ExtensionFamily => Ok(classify_extension(ctx)),
            Self::ContentKeywords => Ok(classify_keywords(ctx, vocab)),
            Self::PersonaMention => Ok(classify_persona(ctx, vocab)),
            Self::AffinityVocabulary => Ok(classify_affinity(ctx, vocab)),
            Self::DocumentFallback => Ok(PartialClassification::category(
                Category::Document,
                0.5,
                format!("generic document (.{})", ctx.extension),
            )),
            Self::Fallback => Ok(PartialClassification::category(
                Category::Unknown,
                FALLBACK_CONFIDENCE,
                "no rule recognised this file",
            )),
            Self::Pattern(rule) => Ok(rule.classify()),
        }
    }
}

/// A glob over the relative path that yields a fixed partial result.
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: String,
    priority: u32,
    pattern: String,
    matcher: WildMatch,
    result: PartialClassification,
}

impl PatternRule {
    /// Create a rule. Matching is case-insensitive.
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        pattern: impl Into<String>,
        result: PartialClassification,
    ) -> Self {
        let pattern = pattern.into();
        Self {
            name: name.into(),
            priority,
            matcher: WildMatch::new(&pattern.to_lowercase()),
            pattern,
            result,
        }
    }

    fn matches(&self, ctx: &ClassificationContext) -> bool {
        self.matcher.matches(&ctx.relative_path.to_lowercase())
    }

    fn classify(&self) -> PartialClassification {
        let mut partial = self.result.clone();
        if partial.category.is_some() && partial.confidence.is_none() {
            partial.confidence = Some(0.8);
        }
        if partial.reasoning.is_none() {
            partial.reasoning = Some(format!("matched pattern `{}`", self.pattern));
        }
        partial
    }
}

fn hint_field(ctx: &ClassificationContext) -> Option<(&'static str, &Value)> {
    let fm = ctx.front_matter.as_ref()?;
    ["type", "category"]
        .into_iter()
        .find_map(|key| fm.get(key).map(|value| (key, value)))
}

fn classify_type_hint(ctx: &ClassificationContext) -> Result<PartialClassification, RuleError> {
    if let Some(hint) = ctx.type_hint {
        return Ok(PartialClassification::category(
            hint,
            TYPE_HINT_CONFIDENCE,
            format!("explicit type hint: {hint}"),
        ));
    }

    let Some((key, value)) = hint_field(ctx) else {
        return Err(RuleError::InvalidField("type".to_string()));
    };
    let Value::String(raw) = value else {
        return Err(RuleError::InvalidField(key.to_string()));
    };
    let category = raw
        .parse::<Category>()
        .map_err(|_| RuleError::UnknownCategory(raw.clone()))?;

    Ok(PartialClassification::category(
        category,
        TYPE_HINT_CONFIDENCE,
        format!("front-matter {key} is `{raw}`"),
    ))
}

fn classify_front_matter(ctx: &ClassificationContext) -> Result<PartialClassification, RuleError> {
    let mut partial = PartialClassification::default();
    let Some(ref fm) = ctx.front_matter else {
        return Ok(partial);
    };

    partial.subcategory = ctx.front_matter_str("subcategory").map(str::to_lowercase);
    partial.element = ctx.front_matter_str("element").map(str::to_lowercase);
    partial.gate = ctx.front_matter_str("gate").map(str::to_lowercase);
    partial.owner = ctx.front_matter_str("owner").map(String::from);

    match fm.get("tags") {
        None | Some(Value::Null) => {}
        Some(Value::String(list)) => partial.tags.extend(
            list.split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
        ),
        Some(Value::Array(items)) => {
            for item in items {
                let Value::String(tag) = item else {
                    return Err(RuleError::InvalidField("tags".to_string()));
                };
                partial.tags.push(tag.trim().to_lowercase());
            }
        }
        Some(_) => return Err(RuleError::InvalidField("tags".to_string())),
    }

    partial.metadata = fm.clone();
    Ok(partial)
}

fn find_content_root(
    ctx: &ClassificationContext,
    vocab: &Vocabulary,
) -> Option<(usize, Category, f32)> {
    ctx.segments
        .iter()
        .enumerate()
        .rev()
        .find_map(|(idx, segment)| {
            vocab
                .content_root(segment)
                .map(|(category, confidence)| (idx, category, confidence))
        })
}

fn classify_location(ctx: &ClassificationContext, vocab: &Vocabulary) -> PartialClassification {
    let Some((idx, category, confidence)) = find_content_root(ctx, vocab) else {
        return PartialClassification::default();
    };

    let root = &ctx.segments[idx];
    let mut partial =
        PartialClassification::category(category, confidence, format!("located under `{root}/`"));

    let next = ctx.segments.get(idx + 1).map(|s| s.to_lowercase());
    if category == Category::Agent {
        match next.as_deref() {
            Some("personas") => {
                if let Some(owner) = ctx.segments.get(idx + 2) {
                    partial = partial.with_owner(owner.clone());
                }
            }
            Some("skills") => partial = partial.with_subcategory("skill"),
            Some(_) => {
                if let Some(owner) = ctx.segments.get(idx + 1) {
                    partial = partial.with_owner(owner.clone());
                }
            }
            None => {}
        }
    } else if let Some(subcategory) = next {
        partial = partial.with_subcategory(subcategory);
    }
    partial
}

fn find_skill_segment(ctx: &ClassificationContext) -> Option<String> {
    ctx.segments.iter().rev().find_map(|segment| {
        let lower = segment.to_lowercase();
        let stem = lower.strip_suffix(SKILL_SUFFIX)?;
        (!stem.is_empty()).then(|| stem.to_string())
    })
}

fn classify_skill(ctx: &ClassificationContext) -> PartialClassification {
    let Some(stem) = find_skill_segment(ctx) else {
        return PartialClassification::default();
    };
    PartialClassification::category(
        Category::Agent,
        0.85,
        format!("inside skill directory `{stem}{SKILL_SUFFIX}`"),
    )
    .with_subcategory("skill")
    .with_metadata("skill", json!(stem))
    .with_tag(stem)
}

fn classify_extension(ctx: &ClassificationContext) -> PartialClassification {
    let ext = &ctx.extension;
    let partial = match ctx.family() {
        Some(FileFamily::Image) => {
            PartialClassification::category(Category::Image, 0.95, format!("image file (.{ext})"))
        }
        Some(FileFamily::Prompt) => {
            PartialClassification::category(Category::Prompt, 0.9, format!("prompt file (.{ext})"))
        }
        Some(FileFamily::Code) => {
            let partial = PartialClassification::category(
                Category::Code,
                0.85,
                format!("source file (.{ext})"),
            );
            match language_for(ext) {
                Some(language) => partial.with_tag(language),
                None => partial,
            }
        }
        Some(FileFamily::Data) => PartialClassification::category(
            Category::Config,
            0.85,
            format!("structured data file (.{ext})"),
        ),
        Some(FileFamily::Document) | None => return PartialClassification::default(),
    };
    partial.with_metadata("extension", json!(ext))
}

/// Best category by number of distinct keywords found, if it has at least
/// two.
fn keyword_match(
    ctx: &ClassificationContext,
    vocab: &Vocabulary,
) -> Option<(Category, Vec<String>)> {
    let text = ctx.text()?.to_lowercase();
    let mut best: Option<(Category, Vec<String>)> = None;

    for entry in &vocab.category_keywords {
        let found: Vec<String> = entry
            .keywords
            .iter()
            .filter(|keyword| count_word(&text, &keyword.to_lowercase()) > 0)
            .cloned()
            .collect();
        let better = best
            .as_ref()
            .is_none_or(|(_, current)| found.len() > current.len());
        if found.len() >= 2 && better {
            best = Some((entry.category, found));
        }
    }
    best
}

fn classify_keywords(ctx: &ClassificationContext, vocab: &Vocabulary) -> PartialClassification {
    let Some((category, found)) = keyword_match(ctx, vocab) else {
        return PartialClassification::default();
    };
    let extra = found.len().saturating_sub(2) as f32;
    let confidence = (0.7 + 0.05 * extra).min(0.8);
    PartialClassification::category(
        category,
        confidence,
        format!("{} {category} keywords: {}", found.len(), found.join(", ")),
    )
    .with_metadata("keywords", json!(found))
}

/// Most-mentioned persona and its mention count.
fn persona_match(ctx: &ClassificationContext, vocab: &Vocabulary) -> Option<(usize, usize)> {
    let text = ctx.text()?.to_lowercase();
    let mut best: Option<(usize, usize)> = None;
    for (idx, persona) in vocab.personas.iter().enumerate() {
        let count = count_word(&text, &persona.name.to_lowercase());
        if count > 0 && best.is_none_or(|(_, current)| count > current) {
            best = Some((idx, count));
        }
    }
    best
}

fn classify_persona(ctx: &ClassificationContext, vocab: &Vocabulary) -> PartialClassification {
    let Some((idx, count)) = persona_match(ctx, vocab) else {
        return PartialClassification::default();
    };
    let persona = &vocab.personas[idx];
    let confidence = if count >= 3 { 0.75 } else { 0.65 };
    let mut partial = PartialClassification::category(
        Category::Agent,
        confidence,
        format!("mentions persona {} ({count}x)", persona.name),
    )
    .with_owner(persona.name.clone())
    .with_tag(persona.name.to_lowercase());
    if let Some(ref gate) = persona.gate {
        partial = partial.with_gate(gate.clone());
    }
    partial
}

/// Dominant element (with its mention count) and first named gate.
fn affinity_match(
    ctx: &ClassificationContext,
    vocab: &Vocabulary,
) -> Option<(Option<String>, Option<String>)> {
    let text = ctx.text()?.to_lowercase();

    let mut total = 0;
    let mut element: Option<(&str, usize)> = None;
    for name in &vocab.elements {
        let count = count_word(&text, &name.to_lowercase());
        total += count;
        if count > 0 && element.is_none_or(|(_, current)| count > current) {
            element = Some((name.as_str(), count));
        }
    }

    let gate = vocab
        .gates
        .iter()
        .find(|gate| count_word(&text, &format!("{} gate", gate.to_lowercase())) > 0);

    if gate.is_none() && total < 2 {
        return None;
    }
    Some((
        element.map(|(name, _)| name.to_lowercase()),
        gate.map(|g| g.to_lowercase()),
    ))
}

fn classify_affinity(ctx: &ClassificationContext, vocab: &Vocabulary) -> PartialClassification {
    let Some((element, gate)) = affinity_match(ctx, vocab) else {
        return PartialClassification::default();
    };

    let mut reasons = Vec::new();
    let mut partial = PartialClassification::default();
    if let Some(element) = element {
        reasons.push(format!("element {element}"));
        partial = partial.with_tag(element.clone()).with_element(element);
    }
    if let Some(gate) = gate {
        reasons.push(format!("{gate} gate"));
        partial = partial.with_tag(format!("{gate}-gate")).with_gate(gate);
    }
    partial.category = Some(Category::Lore);
    partial.confidence = Some(0.6);
    partial.reasoning = Some(format!("affinity vocabulary: {}", reasons.join(", ")));
    partial
}
