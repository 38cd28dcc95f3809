//! Word lists the content rules match against.

use artifact_protocol::Category;
use serde::{Deserialize, Serialize};

/// Keywords that suggest a category when at least two of them appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// A named persona content can be attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub gate: Option<String>,
}

/// Vocabulary used by the content and path rules.
///
/// The defaults cover the built-in taxonomy; callers can extend any list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Per-category keyword lists, checked in order.
    pub category_keywords: Vec<CategoryKeywords>,

    /// Directory names that mark a content root, with their confidence.
    pub content_roots: Vec<(String, Category, f32)>,

    pub personas: Vec<Persona>,

    pub elements: Vec<String>,

    /// Gate names, matched as "<name> gate".
    pub gates: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            category_keywords: vec![
                keywords(
                    Category::Character,
                    &[
                        "personality", "backstory", "appearance", "motivation", "traits",
                        "abilities", "allies", "occupation", "character arc", "age",
                    ],
                ),
                keywords(
                    Category::Location,
                    &[
                        "geography", "climate", "population", "landmarks", "terrain", "region",
                        "inhabitants", "capital", "borders", "architecture",
                    ],
                ),
                keywords(
                    Category::Creature,
                    &[
                        "habitat", "diet", "species", "predator", "prey", "lifespan",
                        "natural weapons", "behavior", "creature", "beast",
                    ],
                ),
                keywords(
                    Category::Artifact,
                    &[
                        "forged", "wielder", "enchantment", "relic", "artifact", "power source",
                        "crafted", "inscription", "weapon", "cursed",
                    ],
                ),
                keywords(
                    Category::Lore,
                    &[
                        "legend", "prophecy", "ancient", "mythology", "era", "history",
                        "chronicle", "dynasty", "creation myth", "war",
                    ],
                ),
                keywords(
                    Category::Prompt,
                    &[
                        "negative prompt", "aspect ratio", "in the style of", "highly detailed",
                        "render", "generate an image", "lighting", "--ar",
                    ],
                ),
                keywords(
                    Category::Agent,
                    &[
                        "system prompt", "you are", "instructions", "capabilities", "tools",
                        "persona", "guidelines", "respond", "workflow",
                    ],
                ),
            ],
            content_roots: [
                ("characters", Category::Character, 0.9),
                ("locations", Category::Location, 0.9),
                ("creatures", Category::Creature, 0.9),
                ("artifacts", Category::Artifact, 0.9),
                ("lore", Category::Lore, 0.9),
                ("prompts", Category::Prompt, 0.9),
                ("agents", Category::Agent, 0.9),
                ("places", Category::Location, 0.85),
                ("bestiary", Category::Creature, 0.85),
                ("items", Category::Artifact, 0.85),
                ("history", Category::Lore, 0.85),
                ("mythology", Category::Lore, 0.85),
            ]
            .into_iter()
            .map(|(name, category, confidence)| (name.to_string(), category, confidence))
            .collect(),
            personas: [
                ("Lyra", Some("sight")),
                ("Draconis", Some("fire")),
                ("Seren", Some("flow")),
                ("Thalor", Some("foundation")),
                ("Maren", Some("heart")),
                ("Orin", Some("voice")),
            ]
            .into_iter()
            .map(|(name, gate)| Persona {
                name: name.to_string(),
                gate: gate.map(String::from),
            })
            .collect(),
            elements: ["fire", "water", "earth", "wind", "void"]
                .into_iter()
                .map(String::from)
                .collect(),
            gates: [
                "foundation", "flow", "fire", "heart", "voice", "sight", "crown", "shift",
                "unity", "source",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Vocabulary {
    /// The content root a directory name stands for.
    pub fn content_root(&self, segment: &str) -> Option<(Category, f32)> {
        self.content_roots
            .iter()
            .find(|(name, _, _)| name.eq_ignore_ascii_case(segment))
            .map(|(_, category, confidence)| (*category, *confidence))
    }
}

fn keywords(category: Category, words: &[&str]) -> CategoryKeywords {
    CategoryKeywords {
        category,
        keywords: words.iter().map(|w| (*w).to_string()).collect(),
    }
}

/// Count occurrences of `needle` in `haystack` that are not embedded in a
/// longer word. Both sides are expected to be lowercase already.
pub fn count_word(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }

    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut count = 0;
    let mut start = 0;
    while let Some(found) = haystack[start..].find(needle) {
        let begin = start + found;
        let end = begin + needle.len();
        let before_ok = haystack[..begin].chars().next_back().is_none_or(|c| !is_word(c));
        let after_ok = haystack[end..].chars().next().is_none_or(|c| !is_word(c));
        if before_ok && after_ok {
            count += 1;
        }
        start = end;
    }
    count
}
