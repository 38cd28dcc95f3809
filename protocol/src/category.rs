//! Artifact categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level classification of an artifact.
///
/// The category decides where an artifact lives in the storage tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Lore,
    Character,
    Location,
    Creature,
    Artifact,
    Prompt,
    Agent,
    Code,
    Image,
    Document,
    Config,
    Unknown,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 12] = [
        Category::Lore,
        Category::Character,
        Category::Location,
        Category::Creature,
        Category::Artifact,
        Category::Prompt,
        Category::Agent,
        Category::Code,
        Category::Image,
        Category::Document,
        Category::Config,
        Category::Unknown,
    ];

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lore => "lore",
            Self::Character => "character",
            Self::Location => "location",
            Self::Creature => "creature",
            Self::Artifact => "artifact",
            Self::Prompt => "prompt",
            Self::Agent => "agent",
            Self::Code => "code",
            Self::Image => "image",
            Self::Document => "document",
            Self::Config => "config",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    /// Accepts the canonical name, its plural, and a few common aliases,
    /// ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let category = match normalized.as_str() {
            "lore" | "history" | "myth" | "mythology" => Self::Lore,
            "character" | "characters" | "npc" => Self::Character,
            "location" | "locations" | "place" | "places" => Self::Location,
            "creature" | "creatures" | "monster" | "beast" => Self::Creature,
            "artifact" | "artifacts" | "item" | "items" | "relic" => Self::Artifact,
            "prompt" | "prompts" => Self::Prompt,
            "agent" | "agents" | "persona" => Self::Agent,
            "code" | "source" => Self::Code,
            "image" | "images" => Self::Image,
            "document" | "documents" | "doc" | "docs" => Self::Document,
            "config" | "configuration" => Self::Config,
            "unknown" => Self::Unknown,
            _ => return Err(ParseCategoryError(s.to_string())),
        };
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Characters".parse::<Category>(), Ok(Category::Character));
        assert_eq!(" relic ".parse::<Category>(), Ok(Category::Artifact));
        assert!("spaceship".parse::<Category>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&Category::Creature).unwrap();
        assert_eq!(json, "\"creature\"");
    }
}
