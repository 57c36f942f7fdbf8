use crate::scanner::TreeScanner;
use deepdiff_common::{FileComparison, FileStatus, FilterConfig, Result};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Compares two directory trees by file existence only.
///
/// Scans both roots with the same filter configuration, then classifies
/// each relative path as identical (present in both), removed (left only)
/// or added (right only). No file content is read at this depth.
pub struct StructureComparator {
    scanner: TreeScanner,
}

impl StructureComparator {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        Ok(Self {
            scanner: TreeScanner::new(config)?,
        })
    }

    pub fn compare(&self, left: &Path, right: &Path) -> Result<Vec<FileComparison>> {
        let left_paths: BTreeSet<String> = self.scanner.scan(left)?.into_iter().collect();
        let right_paths: BTreeSet<String> = self.scanner.scan(right)?.into_iter().collect();

        let comparisons: Vec<FileComparison> = left_paths
            .union(&right_paths)
            .map(|rel_path| {
                let in_left = left_paths.contains(rel_path);
                let in_right = right_paths.contains(rel_path);
                let status = match (in_left, in_right) {
                    (true, true) => FileStatus::Identical,
                    (true, false) => FileStatus::Removed,
                    _ => FileStatus::Added,
                };
                FileComparison::structural(
                    rel_path.clone(),
                    status,
                    in_left.then(|| left.join(rel_path)),
                    in_right.then(|| right.join(rel_path)),
                )
            })
            .collect();

        debug!(
            "structure pass: {} entries ({} left, {} right)",
            comparisons.len(),
            left_paths.len(),
            right_paths.len()
        );
        Ok(comparisons)
    }
}
