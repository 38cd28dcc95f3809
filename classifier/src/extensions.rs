//! File families by extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extension reserved for structured prompt files.
pub const PROMPT_EXTENSION: &str = "arc";

const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "mdx", "txt"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];
const DATA_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];
const CODE_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "mjs", "py", "go", "java", "kt", "swift", "c", "h", "cpp",
    "hpp", "cs", "rb", "sh", "lua",
];

/// Broad kind of file, decided from its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFamily {
    Document,
    Image,
    Data,
    Code,
    Prompt,
}

impl FileFamily {
    /// Family of a lowercase extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        if DOCUMENT_EXTENSIONS.contains(&ext) {
            Some(Self::Document)
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            Some(Self::Image)
        } else if DATA_EXTENSIONS.contains(&ext) {
            Some(Self::Data)
        } else if CODE_EXTENSIONS.contains(&ext) {
            Some(Self::Code)
        } else if ext == PROMPT_EXTENSION {
            Some(Self::Prompt)
        } else {
            None
        }
    }

    /// Family of a path, if its extension is supported.
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(&extension_of(path))
    }

    /// Whether files of this family may carry front-matter.
    pub fn has_front_matter(self) -> bool {
        matches!(self, Self::Document | Self::Prompt)
    }
}

/// Lowercase extension of a path, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Whether the pipeline ingests files with this path's extension.
pub fn is_supported(path: &Path) -> bool {
    FileFamily::from_path(path).is_some()
}

/// Language tag for a code extension.
pub fn language_for(ext: &str) -> Option<&'static str> {
    let language = match ext {
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" => "javascript",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "swift" => "swift",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "sh" => "shell",
        "lua" => "lua",
        _ => return None,
    };
    Some(language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_families() {
        assert_eq!(FileFamily::from_path(Path::new("a/b/Map.PNG")), Some(FileFamily::Image));
        assert_eq!(FileFamily::from_path(Path::new("notes.md")), Some(FileFamily::Document));
        assert_eq!(FileFamily::from_path(Path::new("scene.arc")), Some(FileFamily::Prompt));
        assert_eq!(FileFamily::from_path(Path::new("archive.zip")), None);
        assert_eq!(FileFamily::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_language_tags() {
        assert_eq!(language_for("tsx"), Some("typescript"));
        assert_eq!(language_for("md"), None);
    }
}
