//! Per-file classification context.

use std::path::Path;

use artifact_protocol::{Category, Metadata};
use tracing::debug;

use crate::extensions::{FileFamily, extension_of};
use crate::frontmatter::split_front_matter;

/// How many leading bytes are inspected when sniffing for binary data.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Raw file content as the rules see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    /// Decode bytes as text when they look like UTF-8 text, otherwise keep
    /// them as binary.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
        if sniff.contains(&0) {
            return Self::Binary(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the rules know about one file.
///
/// Built once per classification call and dropped afterwards.
#[derive(Debug, Clone)]
pub struct ClassificationContext {
    /// Path as given, with `/` separators.
    pub path: String,

    /// Path relative to the watch root, or `path` when there is no root.
    pub relative_path: String,

    pub file_name: String,

    /// Lowercase extension without the dot (empty when absent).
    pub extension: String,

    /// Content with any front-matter block removed.
    pub content: FileContent,

    /// Parsed front-matter mapping.
    pub front_matter: Option<Metadata>,

    /// Name of the directory containing the file.
    pub parent_dir: Option<String>,

    /// Directory segments of `relative_path`, outermost first.
    pub segments: Vec<String>,

    /// Category requested explicitly by the caller.
    pub type_hint: Option<Category>,
}

impl ClassificationContext {
    /// Build a context from already-decoded content. No front-matter is
    /// extracted.
    pub fn new(path: impl AsRef<Path>, content: FileContent) -> Self {
        let path = path.as_ref();
        let normalized = normalize(path);
        let mut ctx = Self {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| normalized.clone()),
            extension: extension_of(path),
            path: normalized.clone(),
            relative_path: String::new(),
            content,
            front_matter: None,
            parent_dir: None,
            segments: Vec::new(),
            type_hint: None,
        };
        ctx.locate(&normalized);
        ctx
    }

    /// Build a context from raw file bytes.
    ///
    /// Images are always treated as binary. Markdown-like text gets its
    /// front-matter parsed; a malformed block leaves the content untouched
    /// and the front-matter empty.
    pub fn from_bytes(path: impl AsRef<Path>, bytes: Vec<u8>) -> Self {
        let path = path.as_ref();
        let family = FileFamily::from_path(path);
        let content = if family == Some(FileFamily::Image) {
            FileContent::Binary(bytes)
        } else {
            FileContent::from_bytes(bytes)
        };

        let mut ctx = Self::new(path, content);
        if family.is_some_and(FileFamily::has_front_matter) {
            ctx.extract_front_matter();
        }
        ctx
    }

    /// Re-anchor the path segments at `root`.
    pub fn relative_to(mut self, root: &Path) -> Self {
        let root = normalize(root);
        let root = root.trim_end_matches('/');
        if let Some(rest) = self.path.strip_prefix(root) {
            if rest.starts_with('/') {
                let relative = rest.trim_start_matches('/').to_string();
                self.locate(&relative);
            }
        }
        self
    }

    /// Attach an explicit category hint.
    pub fn with_type_hint(mut self, hint: Category) -> Self {
        self.type_hint = Some(hint);
        self
    }

    /// Text content, or `None` for binary files.
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }

    /// A string-valued front-matter field.
    pub fn front_matter_str(&self, key: &str) -> Option<&str> {
        self.front_matter.as_ref()?.get(key)?.as_str()
    }

    pub fn family(&self) -> Option<FileFamily> {
        FileFamily::from_extension(&self.extension)
    }

    fn extract_front_matter(&mut self) {
        let FileContent::Text(ref text) = self.content else {
            return;
        };
        match split_front_matter(text) {
            Ok(Some(fm)) => {
                let body = fm.body.to_string();
                self.front_matter = Some(fm.metadata);
                self.content = FileContent::Text(body);
            }
            Ok(None) => {}
            Err(e) => debug!("Ignoring front-matter in {}: {e}", self.path),
        }
    }

    fn locate(&mut self, relative: &str) {
        let mut parts: Vec<String> = relative
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(String::from)
            .collect();
        parts.pop();
        self.parent_dir = parts.last().cloned();
        self.segments = parts;
        self.relative_path = relative.to_string();
    }
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
