//! YAML front-matter extraction.

use artifact_protocol::Metadata;
use thiserror::Error;

/// Errors while reading a front-matter block.
#[derive(Error, Debug)]
pub enum FrontMatterError {
    /// Opening delimiter without a closing one.
    #[error("front-matter block is not terminated")]
    Unterminated,

    /// The block is YAML but not a mapping.
    #[error("front-matter is not a mapping")]
    NotAMapping,

    /// The block is not valid YAML.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A parsed front-matter block and the text following it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
}

/// Split a leading `---` delimited YAML block off `text`.
///
/// Returns `Ok(None)` when the text does not start with a front-matter
/// delimiter.
pub fn split_front_matter(text: &str) -> Result<Option<FrontMatter<'_>>, FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = strip_delimiter_line(text) else {
        return Ok(None);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "---" || trimmed == "..." {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let value: serde_json::Value = if yaml.trim().is_empty() {
                serde_json::Value::Null
            } else {
                serde_yaml::from_str(yaml)?
            };
            let metadata = match value {
                serde_json::Value::Object(map) => map,
                serde_json::Value::Null => Metadata::new(),
                _ => return Err(FrontMatterError::NotAMapping),
            };
            return Ok(Some(FrontMatter { metadata, body }));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

fn strip_delimiter_line(text: &str) -> Option<&str> {
    text.strip_prefix("---\r\n")
        .or_else(|| text.strip_prefix("---\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_splits_mapping_and_body() {
        let text = "---\ntype: character\ntags:\n  - hero\n---\n# Kael\n";
        let fm = split_front_matter(text).unwrap().unwrap();
        assert_eq!(fm.metadata.get("type"), Some(&json!("character")));
        assert_eq!(fm.metadata.get("tags"), Some(&json!(["hero"])));
        assert_eq!(fm.body, "# Kael\n");
    }

    #[test]
    fn test_crlf_and_empty_block() {
        let fm = split_front_matter("---\r\n---\r\nbody").unwrap().unwrap();
        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_no_front_matter() {
        assert!(split_front_matter("# Title\n---\n").unwrap().is_none());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            split_front_matter("---\ntype: lore\n"),
            Err(FrontMatterError::Unterminated)
        ));
        assert!(matches!(
            split_front_matter("---\n- a\n- b\n---\n"),
            Err(FrontMatterError::NotAMapping)
        ));
        assert!(matches!(
            split_front_matter("---\ntype: [unclosed\n---\n"),
            Err(FrontMatterError::Yaml(_))
        ));
    }
}
