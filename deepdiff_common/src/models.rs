use crate::DiffError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Comparison depth level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffDepth {
    /// File existence only.
    Structure,
    /// Content equality via hashing.
    Content,
    /// Line-level diff hunks.
    Text,
}

impl DiffDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffDepth::Structure => "structure",
            DiffDepth::Content => "content",
            DiffDepth::Text => "text",
        }
    }
}

impl fmt::Display for DiffDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a file in the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Identical,
    Modified,
    /// Present only on the right side.
    Added,
    /// Present only on the left side.
    Removed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Identical => "identical",
            FileStatus::Modified => "modified",
            FileStatus::Added => "added",
            FileStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a line-level change within a hunk.
///
/// `Substitute` is part of the serialized schema but is never emitted:
/// the diff engine decomposes every replacement into delete entries
/// followed by insert entries. Downstream renderers rely on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Insert,
    Delete,
    Substitute,
    Equal,
}

/// A single line-level change within a hunk.
///
/// `content` keeps its original line terminator. Equal changes carry both
/// line numbers; inserts carry only the right number, deletes only the left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChange {
    pub change_type: ChangeType,
    pub content: String,
    pub line_left: Option<usize>,
    pub line_right: Option<usize>,
}

/// A contiguous block of text changes with unified-diff header fields
/// (`@@ -start_left,count_left +start_right,count_right @@`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hunk {
    pub start_left: usize,
    pub count_left: usize,
    pub start_right: usize,
    pub count_right: usize,
    pub changes: Vec<TextChange>,
}

/// Comparison result for a single file pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileComparison {
    /// POSIX-style relative path, forward slashes on every host.
    pub relative_path: String,
    pub status: FileStatus,
    /// Absolute path on the left side, `None` for added files.
    pub left_path: Option<PathBuf>,
    /// Absolute path on the right side, `None` for removed files.
    pub right_path: Option<PathBuf>,
    #[serde(default)]
    pub hunks: Vec<Hunk>,
    pub content_hash_left: Option<String>,
    pub content_hash_right: Option<String>,
    pub similarity: Option<f64>,
}

impl FileComparison {
    /// A bare structural entry: no hashes, no hunks, no similarity.
    pub fn structural(
        relative_path: String,
        status: FileStatus,
        left_path: Option<PathBuf>,
        right_path: Option<PathBuf>,
    ) -> Self {
        Self {
            relative_path,
            status,
            left_path,
            right_path,
            hunks: Vec::new(),
            content_hash_left: None,
            content_hash_right: None,
            similarity: None,
        }
    }
}

/// Summary statistics for a comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub total_files: usize,
    pub identical: usize,
    pub modified: usize,
    pub added: usize,
    pub removed: usize,
}

impl DiffStats {
    /// Compute stats by counting file statuses. A pure reduction,
    /// recomputable from any comparison sequence.
    pub fn from_comparisons(comparisons: &[FileComparison]) -> Self {
        let count = |status: FileStatus| comparisons.iter().filter(|c| c.status == status).count();
        Self {
            total_files: comparisons.len(),
            identical: count(FileStatus::Identical),
            modified: count(FileStatus::Modified),
            added: count(FileStatus::Added),
            removed: count(FileStatus::Removed),
        }
    }
}

/// Top-level result of a comparison run. Created once by the orchestrator
/// and consumed read-only by renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    pub left_root: PathBuf,
    pub right_root: PathBuf,
    pub depth: DiffDepth,
    /// Sorted by `relative_path`; relative paths are unique.
    pub comparisons: Vec<FileComparison>,
    pub stats: DiffStats,
}

/// Immutable configuration for file filtering.
///
/// Filters apply in order: hidden -> ignore rules -> include glob ->
/// exclude glob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub respect_gitignore: bool,
    pub include_hidden: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Hash algorithm for content comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
    Md5,
    Blake3,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "md5" => Ok(HashAlgorithm::Md5),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(DiffError::Unsupported(format!(
                "unknown hash algorithm '{other}' (expected sha256, sha512, md5, or blake3)"
            ))),
        }
    }
}
