//! Canonical directory layout of a storage root.

use std::path::{Path, PathBuf};

use artifact_protocol::{Category, ClassificationResult};

pub const INBOX_DIR: &str = "inbox";
pub const ARCHIVE_DIR: &str = "archive";
pub const INDEX_DIR: &str = "index";
pub const CATALOG_FILE: &str = "catalog.json";
pub const CONFIG_FILE: &str = "flow-config.json";

/// Directory under which agents with an owner are filed.
const PERSONAS_DIR: &str = "personas";

/// Fixed subdirectories created for each category.
const SKELETON: &[(Category, &[&str])] = &[
    (Category::Lore, &["history", "mythology", "elements"]),
    (Category::Character, &["heroes", "villains", "npcs"]),
    (Category::Location, &["regions", "cities", "landmarks"]),
    (Category::Creature, &["beasts", "spirits"]),
    (Category::Artifact, &["weapons", "relics"]),
    (Category::Prompt, &["image", "text"]),
    (Category::Agent, &[PERSONAS_DIR, "skills"]),
    (Category::Code, &[]),
    (Category::Image, &["concept-art", "portraits", "maps"]),
    (Category::Document, &[]),
    (Category::Config, &[]),
    (Category::Unknown, &[]),
];

/// Top-level directory of a category.
pub fn category_dir(category: Category) -> &'static str {
    match category {
        Category::Lore => "lore",
        Category::Character => "characters",
        Category::Location => "locations",
        Category::Creature => "creatures",
        Category::Artifact => "artifacts",
        Category::Prompt => "prompts",
        Category::Agent => "agents",
        Category::Code => "code",
        Category::Image => "images",
        Category::Document => "documents",
        Category::Config => "config",
        Category::Unknown => INBOX_DIR,
    }
}

/// Paths inside one storage root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(INDEX_DIR).join(CATALOG_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    /// Archive location of a soft-deleted artifact.
    pub fn archive_path(&self, id: &str, file_name: &str) -> PathBuf {
        self.archive_dir().join(format!("{id}-{file_name}"))
    }

    /// Absolute path of a storage-relative path.
    pub fn absolute(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Every directory of the fixed skeleton.
    pub fn skeleton_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for (category, subdirs) in SKELETON {
            let base = self.root.join(category_dir(*category));
            dirs.extend(subdirs.iter().map(|sub| base.join(sub)));
            dirs.push(base);
        }
        dirs.push(self.archive_dir());
        dirs.push(self.root.join(INDEX_DIR));
        dirs
    }

    /// Storage-relative directory for a classification.
    ///
    /// Agents with an owner always go under `agents/personas/<owner>`.
    /// Otherwise the category directory is refined by subcategory, and lore
    /// additionally by element.
    pub fn relative_dir(&self, classification: &ClassificationResult) -> String {
        let category = classification.category;
        let mut parts = vec![category_dir(category).to_string()];

        let owner = classification.owner.as_deref().and_then(slug);
        if let (Category::Agent, Some(owner)) = (category, owner) {
            parts.push(PERSONAS_DIR.to_string());
            parts.push(owner);
            return parts.join("/");
        }

        if let Some(subcategory) = classification.subcategory.as_deref().and_then(slug) {
            parts.push(subcategory_dir(category, subcategory));
        }
        if category == Category::Lore {
            if let Some(element) = classification.element.as_deref().and_then(slug) {
                parts.push(element);
            }
        }
        parts.join("/")
    }

    /// Storage-relative path for a classified file.
    pub fn relative_path(&self, classification: &ClassificationResult, file_name: &str) -> String {
        format!("{}/{}", self.relative_dir(classification), sanitize_file_name(file_name))
    }
}

/// Prefer an existing skeleton directory when the subcategory is its
/// singular form (`skill` -> `skills`).
fn subcategory_dir(category: Category, subcategory: String) -> String {
    let known = SKELETON
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, subdirs)| *subdirs)
        .unwrap_or_default();
    if known.contains(&subcategory.as_str()) {
        return subcategory;
    }
    let plural = format!("{subcategory}s");
    if known.contains(&plural.as_str()) {
        plural
    } else {
        subcategory
    }
}

/// Lowercase directory-safe form of a label. `None` when nothing usable
/// remains.
pub fn slug(label: &str) -> Option<String> {
    let mut out = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            out.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '.') && !out.ends_with('-') {
            out.push('-');
        }
    }
    let out = out.trim_matches('-').to_string();
    (!out.is_empty()).then_some(out)
}

/// Strip directory components and control characters from a file name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `kael.md` + `1a2b3c4d...` -> `kael-1a2b3c4d.md`.
pub fn with_id_suffix(relative: &str, id: &str) -> String {
    let short: String = id.chars().filter(char::is_ascii_alphanumeric).take(8).collect();
    let (dir, name) = match relative.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, relative),
    };
    let renamed = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{short}.{ext}"),
        _ => format!("{name}-{short}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{renamed}"),
        None => renamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classified(category: Category) -> ClassificationResult {
        ClassificationResult::new(category, 0.9, "test")
    }

    #[test]
    fn test_category_and_subcategory_dirs() {
        let layout = StorageLayout::new("/store");

        let mut result = classified(Category::Character);
        assert_eq!(layout.relative_path(&result, "kael.md"), "characters/kael.md");

        result.subcategory = Some("Villains".to_string());
        assert_eq!(layout.relative_path(&result, "kael.md"), "characters/villains/kael.md");

        assert_eq!(layout.relative_path(&classified(Category::Unknown), "x.bin"), "inbox/x.bin");
    }

    #[test]
    fn test_agent_owner_overrides_subcategory() {
        let layout = StorageLayout::new("/store");
        let mut result = classified(Category::Agent);
        result.subcategory = Some("skill".to_string());
        assert_eq!(layout.relative_dir(&result), "agents/skills");

        result.owner = Some("Lyra".to_string());
        assert_eq!(layout.relative_dir(&result), "agents/personas/lyra");
    }

    #[test]
    fn test_lore_nests_by_element() {
        let layout = StorageLayout::new("/store");
        let mut result = classified(Category::Lore);
        result.subcategory = Some("history".to_string());
        result.element = Some("Fire".to_string());
        assert_eq!(layout.relative_dir(&result), "lore/history/fire");

        // Element only nests lore.
        let mut creature = classified(Category::Creature);
        creature.element = Some("fire".to_string());
        assert_eq!(layout.relative_dir(&creature), "creatures");
    }

    #[test]
    fn test_path_traversal_is_neutralised() {
        let layout = StorageLayout::new("/store");
        let mut result = classified(Category::Character);
        result.subcategory = Some("../../etc".to_string());
        assert_eq!(
            layout.relative_path(&result, "../../passwd"),
            "characters/etc/passwd"
        );
        assert_eq!(sanitize_file_name(".."), "untitled");
        assert_eq!(slug("..."), None);
    }

    #[test]
    fn test_id_suffix() {
        assert_eq!(
            with_id_suffix("characters/kael.md", "1a2b3c4d-5e6f"),
            "characters/kael-1a2b3c4d.md"
        );
        assert_eq!(with_id_suffix("README", "abcdef0123"), "README-abcdef01");
    }

    #[test]
    fn test_skeleton_contains_fixed_dirs() {
        let layout = StorageLayout::new("/store");
        let dirs = layout.skeleton_dirs();
        assert!(dirs.contains(&PathBuf::from("/store/inbox")));
        assert!(dirs.contains(&PathBuf::from("/store/archive")));
        assert!(dirs.contains(&PathBuf::from("/store/index")));
        assert!(dirs.contains(&PathBuf::from("/store/agents/personas")));
    }
}
