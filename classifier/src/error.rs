//! Error types for classification rules.
//!
//! These never leave the crate's public `classify` entry points: a rule
//! that fails is logged and treated as a non-match.

use thiserror::Error;

/// Errors a single rule can raise while scoring a context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// A type hint named a category that does not exist.
    #[error("unknown category in type hint: {0}")]
    UnknownCategory(String),

    /// A front-matter field had the wrong shape.
    #[error("invalid front-matter field `{0}`")]
    InvalidField(String),
}
