//! Corpus discovery.
//!
//! The test corpus is partitioned into three fixed categories, each a
//! subdirectory of the corpus root holding `.flac` files. Discovery is
//! sorted for deterministic run order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{HarnessError, HarnessResult};

/// Corpus partition a test file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Streamable-subset conformant files; all expected to decode.
    Subset,
    /// Valid but unusual encodings (rare bit depths, block sizes).
    Uncommon,
    /// Intentionally invalid files; both decoders are expected to reject.
    Faulty,
}

impl Category {
    /// All categories, in scan order.
    pub const ALL: [Category; 3] = [Category::Subset, Category::Uncommon, Category::Faulty];

    /// Directory name of this partition under the corpus root.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Subset => "subset",
            Category::Uncommon => "uncommon",
            Category::Faulty => "faulty",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered corpus file. Immutable once discovered.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Path to the input FLAC file.
    pub path: PathBuf,
    /// Partition the file was found in.
    pub category: Category,
}

impl TestCase {
    /// File name without directory, for reporting.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Discovers all `.flac` files in one category partition, sorted by path.
///
/// A missing category directory is an empty partition, not an error; only
/// a missing corpus root is fatal (checked by the caller before scanning).
pub fn scan_category(corpus_root: &Path, category: Category) -> Vec<TestCase> {
    let dir = corpus_root.join(category.as_str());
    let mut files: Vec<PathBuf> = WalkDir::new(&dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("flac"))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    files
        .into_iter()
        .map(|path| TestCase { path, category })
        .collect()
}

/// Verifies the corpus root exists.
pub fn check_corpus_root(corpus_root: &Path) -> HarnessResult<()> {
    if corpus_root.is_dir() {
        Ok(())
    } else {
        Err(HarnessError::CorpusNotFound {
            path: corpus_root.to_path_buf(),
        })
    }
}
