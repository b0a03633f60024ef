/// File categorization based on file extensions.
///
/// This is the collaborator that gives meaning to the opaque
/// [`Category`] tokens stored on tree nodes: it classifies names into
/// broad categories for coloring and legend display, and computes
/// size/count totals per category. The tree and the layout never look
/// inside a token; only this module (and consumers of its labels) do.
use crate::model::{Category, DirTree, NodeKind};
use std::collections::HashMap;

/// Broad file type categories for visual grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Documents,
    Images,
    Video,
    Audio,
    Archives,
    Code,
    Executables,
    Other,
}

impl FileCategory {
    /// Every category, in token order.
    pub const ALL: [FileCategory; 8] = [
        Self::Documents,
        Self::Images,
        Self::Video,
        Self::Audio,
        Self::Archives,
        Self::Code,
        Self::Executables,
        Self::Other,
    ];

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Archives => "Archives",
            Self::Code => "Code",
            Self::Executables => "Executables",
            Self::Other => "Other",
        }
    }

    /// The opaque token this category is stored as. Token 0 stays reserved
    /// for unclassified nodes (directories).
    pub fn token(self) -> Category {
        let position = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Category(position as u16 + 1)
    }

    /// Map a stored token back to its category, if it is one of ours.
    pub fn from_token(token: Category) -> Option<FileCategory> {
        match token.raw() {
            0 => None,
            raw => Self::ALL.get(raw as usize - 1).copied(),
        }
    }
}

/// Size and count totals for a single category.
#[derive(Debug, Clone)]
pub struct CategoryStats {
    pub category: FileCategory,
    pub total_size: u64,
    pub file_count: u64,
}

/// The extension part of a file name, without the dot.
/// Names with no dot (or only a leading dot) have no extension.
pub fn extension_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

/// Classify a file extension into a broad category.
///
/// Matching is ASCII-case-insensitive without heap allocation: the
/// extension is lowercased into a fixed stack buffer. Extensions longer
/// than the buffer are certainly not in the tables below.
pub fn categorize_extension(ext: &str) -> FileCategory {
    let bytes = ext.as_bytes();
    if bytes.is_empty() || bytes.len() > 12 {
        return FileCategory::Other;
    }

    let mut lower = [0u8; 12];
    for (dst, &src) in lower.iter_mut().zip(bytes) {
        *dst = src.to_ascii_lowercase();
    }
    let lower = match std::str::from_utf8(&lower[..bytes.len()]) {
        Ok(s) => s,
        Err(_) => return FileCategory::Other,
    };

    match lower {
        "doc" | "docx" | "pdf" | "txt" | "rtf" | "odt" | "ods" | "xls" | "xlsx" | "ppt"
        | "pptx" | "md" | "epub" | "tex" => FileCategory::Documents,
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" | "ico" | "tiff" | "tif"
        | "psd" | "raw" | "heic" | "heif" => FileCategory::Images,
        "mp4" | "mkv" | "avi" | "mov" | "wmv" | "webm" | "m4v" | "mpg" | "mpeg" | "flv" => {
            FileCategory::Video
        }
        "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" | "opus" | "wma" => FileCategory::Audio,
        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "zst" | "iso" | "dmg" | "deb"
        | "rpm" => FileCategory::Archives,
        "rs" | "py" | "js" | "ts" | "jsx" | "tsx" | "c" | "cpp" | "h" | "hpp" | "cs" | "java"
        | "go" | "rb" | "php" | "swift" | "kt" | "html" | "css" | "scss" | "json" | "xml"
        | "yaml" | "yml" | "toml" | "sql" | "sh" => FileCategory::Code,
        "exe" | "msi" | "dll" | "so" | "dylib" | "app" | "bin" | "appimage" => {
            FileCategory::Executables
        }
        _ => FileCategory::Other,
    }
}

/// Ready-made categorizer hook for
/// [`TreeBuilder::with_categorizer`](crate::builder::TreeBuilder::with_categorizer):
/// files are classified by extension, directories stay unclassified.
pub fn categorizer() -> impl Fn(&str, NodeKind) -> Category + Send + Sync + 'static {
    |name, kind| match kind {
        NodeKind::File => categorize_extension(extension_of(name)).token(),
        NodeKind::Directory => Category::UNCLASSIFIED,
    }
}

/// Compute per-category size and count totals for the entire tree,
/// sorted by total size descending (label tiebreak, so the legend order
/// is reproducible).
pub fn category_stats(tree: &DirTree) -> Vec<CategoryStats> {
    let mut map: HashMap<FileCategory, CategoryStats> =
        HashMap::with_capacity(FileCategory::ALL.len());

    for node in &tree.nodes {
        if node.is_dir() {
            continue;
        }
        let category = categorize_extension(extension_of(&node.name));
        let entry = map.entry(category).or_insert_with(|| CategoryStats {
            category,
            total_size: 0,
            file_count: 0,
        });
        entry.total_size += node.own_size;
        entry.file_count += 1;
    }

    let mut stats: Vec<CategoryStats> = map.into_values().collect();
    stats.sort_by(|a, b| {
        b.total_size
            .cmp(&a.total_size)
            .then_with(|| a.category.label().cmp(b.category.label()))
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_tree, Record, TreeBuilder};

    #[test]
    fn classify_known_extensions() {
        assert_eq!(categorize_extension("png"), FileCategory::Images);
        assert_eq!(categorize_extension("rs"), FileCategory::Code);
        assert_eq!(categorize_extension("tar"), FileCategory::Archives);
        assert_eq!(categorize_extension("pdf"), FileCategory::Documents);
        assert_eq!(categorize_extension("flac"), FileCategory::Audio);
        assert_eq!(categorize_extension("mkv"), FileCategory::Video);
        assert_eq!(categorize_extension("so"), FileCategory::Executables);
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(categorize_extension("PNG"), FileCategory::Images);
        assert_eq!(categorize_extension("Rs"), FileCategory::Code);
    }

    #[test]
    fn unknown_extension_is_other() {
        assert_eq!(categorize_extension("xyz"), FileCategory::Other);
        assert_eq!(categorize_extension(""), FileCategory::Other);
        assert_eq!(categorize_extension("waylongextension"), FileCategory::Other);
    }

    #[test]
    fn extension_extraction() {
        assert_eq!(extension_of("photo.JPG"), "JPG");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".bashrc"), "");
    }

    #[test]
    fn tokens_round_trip() {
        for category in FileCategory::ALL {
            assert_ne!(category.token(), Category::UNCLASSIFIED);
            assert_eq!(FileCategory::from_token(category.token()), Some(category));
        }
        assert_eq!(FileCategory::from_token(Category::UNCLASSIFIED), None);
        assert_eq!(FileCategory::from_token(Category(999)), None);
    }

    #[test]
    fn builder_hook_stores_tokens() {
        let tree = TreeBuilder::new("root")
            .with_categorizer(categorizer())
            .build(vec![Record::file("src/main.rs", 10)])
            .unwrap();

        let file = tree.locate("src/main.rs").unwrap();
        assert_eq!(
            FileCategory::from_token(tree.node(file).category),
            Some(FileCategory::Code)
        );
        let dir = tree.locate("src").unwrap();
        assert_eq!(tree.node(dir).category, Category::UNCLASSIFIED);
    }

    #[test]
    fn stats_aggregate_per_category() {
        let tree = build_tree(
            "root",
            vec![
                Record::file("a/main.rs", 100),
                Record::file("a/lib.rs", 100),
                Record::file("logo.png", 150),
            ],
        )
        .unwrap();

        let stats = category_stats(&tree);
        let code = stats
            .iter()
            .find(|s| s.category == FileCategory::Code)
            .expect("code stats");
        assert_eq!(code.file_count, 2);
        assert_eq!(code.total_size, 200);

        // Descending by total size.
        assert!(stats.windows(2).all(|w| w[0].total_size >= w[1].total_size));
    }

    #[test]
    fn stats_skip_directories() {
        let tree = build_tree("root", vec![Record::directory("src")]).unwrap();
        assert!(category_stats(&tree).is_empty());
    }
}
