//! # Artifact Classifier
//!
//! Decides what kind of artifact a file is. A fixed set of rules is
//! evaluated against a [`ClassificationContext`]; every matching rule
//! contributes a [`PartialClassification`] and the [`Classifier`] folds
//! them into one [`ClassificationResult`].
//!
//! ## Rule precedence
//!
//! ```text
//! type hint (0.95) > source location (0.85-0.9) > file family (0.8-0.95)
//!   > content keywords (0.7-0.8) > domain vocabulary (0.6-0.8)
//!   > document fallback (0.5) > unknown (0.3)
//! ```
//!
//! Classification is total: a rule that fails is skipped, and the catch-all
//! rule always answers.
//!
//! [`PartialClassification`]: artifact_protocol::PartialClassification
//! [`ClassificationResult`]: artifact_protocol::ClassificationResult

pub mod classifier;
pub mod context;
pub mod error;
pub mod extensions;
pub mod frontmatter;
pub mod rule;
pub mod vocabulary;

pub use classifier::Classifier;
pub use context::{ClassificationContext, FileContent};
pub use error::RuleError;
pub use extensions::FileFamily;
pub use frontmatter::{FrontMatter, FrontMatterError, split_front_matter};
pub use rule::{PatternRule, Rule};
pub use vocabulary::{CategoryKeywords, Persona, Vocabulary};
