use crate::filter::{join_posix, IgnoreRules, PathFilter};
use deepdiff_common::{DiffError, FilterConfig, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Walks a directory tree and produces the filtered, sorted set of
/// relative file paths.
pub struct TreeScanner {
    filter: PathFilter,
}

impl TreeScanner {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        Ok(Self {
            filter: PathFilter::new(config)?,
        })
    }

    /// Scan `root` recursively, returning sorted POSIX-style relative
    /// paths for every file that passes all filter layers.
    pub fn scan(&self, root: &Path) -> Result<Vec<String>> {
        if !root.is_dir() {
            return Err(DiffError::NotADirectory(root.to_path_buf()));
        }

        let mut rules = IgnoreRules::new();
        let mut files = Vec::new();
        self.walk(root, "", &mut rules, &mut files)?;
        files.sort();

        debug!("scanned {} files under {}", files.len(), root.display());
        Ok(files)
    }

    fn walk(
        &self,
        root: &Path,
        rel_dir: &str,
        rules: &mut IgnoreRules,
        out: &mut Vec<String>,
    ) -> Result<()> {
        let abs_dir = if rel_dir.is_empty() {
            root.to_path_buf()
        } else {
            root.join(rel_dir)
        };

        // This directory's own ignore file is read before any prune
        // decision, so its rules are in force for everything below.
        if self.filter.config().respect_gitignore {
            rules.load_dir(rel_dir, &abs_dir)?;
        }

        let mut subdirs = Vec::new();
        let mut file_names = Vec::new();
        for entry in fs::read_dir(&abs_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                subdirs.push(name);
            } else {
                file_names.push(name);
            }
        }

        file_names.sort();
        for name in file_names {
            let rel_path = join_posix(rel_dir, &name);
            if self.filter.include_file(&rel_path, rules) {
                out.push(rel_path);
            }
        }

        // Sorted descent keeps traversal deterministic. Pruned directories
        // are never entered; their files must not appear in the result.
        subdirs.sort();
        for name in subdirs {
            let rel_path = join_posix(rel_dir, &name);
            if self.filter.descend(&rel_path, rules) {
                self.walk(root, &rel_path, rules, out)?;
            }
        }

        Ok(())
    }
}
