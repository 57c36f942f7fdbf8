use deepdiff_common::{DiffError, FilterConfig, Result};
use glob::Pattern;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub const GITIGNORE_FILENAME: &str = ".gitignore";

/// Join a relative directory and an entry name with a POSIX separator.
pub(crate) fn join_posix(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// All ancestor directory prefixes of a relative path, root first.
///
/// For `a/b/c.txt` this is `["", "a", "a/b"]`; for `file.txt` just `[""]`.
fn ancestor_dirs(rel_path: &str) -> Vec<&str> {
    let mut ancestors = vec![""];
    for (idx, ch) in rel_path.char_indices() {
        if ch == '/' {
            ancestors.push(&rel_path[..idx]);
        }
    }
    ancestors
}

/// Per-directory gitignore rules collected during a scan.
///
/// Rules declared in a directory apply to that directory and its
/// descendants, never to siblings or ancestors. Each scope keeps its own
/// compiled `Gitignore`; negation and later-wins ordering within one file
/// are handled by the `ignore` crate.
#[derive(Default)]
pub struct IgnoreRules {
    specs: HashMap<String, Gitignore>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `abs_dir`'s own ignore file, if present. Absence is not an
    /// error, just "no additional rules here".
    pub fn load_dir(&mut self, rel_dir: &str, abs_dir: &Path) -> Result<()> {
        let ignore_path = abs_dir.join(GITIGNORE_FILENAME);
        if !ignore_path.is_file() {
            return Ok(());
        }

        let mut builder = GitignoreBuilder::new(abs_dir);
        if let Some(err) = builder.add(&ignore_path) {
            return Err(DiffError::Config(format!(
                "failed to read {}: {err}",
                ignore_path.display()
            )));
        }
        let gitignore = builder
            .build()
            .map_err(|err| DiffError::Config(format!("failed to build ignore rules: {err}")))?;

        debug!("loaded ignore rules from {}", ignore_path.display());
        self.specs.insert(rel_dir.to_string(), gitignore);
        Ok(())
    }

    /// Whether any applicable scope's net decision for this path is ignore.
    ///
    /// Scopes are checked root-first; paths are rebased into each scope
    /// before matching so patterns stay relative to their own directory.
    pub fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        if self.specs.is_empty() {
            return false;
        }
        for ancestor in ancestor_dirs(rel_path) {
            let Some(spec) = self.specs.get(ancestor) else {
                continue;
            };
            let local = if ancestor.is_empty() {
                rel_path
            } else {
                &rel_path[ancestor.len() + 1..]
            };
            if spec.matched(local, is_dir).is_ignore() {
                return true;
            }
        }
        false
    }
}

/// Evaluates relative paths against the layered filter rules.
///
/// Include/exclude patterns use shell-style glob semantics over the whole
/// relative path; ignore rules use gitignore semantics. The two languages
/// are distinct and never conflated.
pub struct PathFilter {
    config: FilterConfig,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PathFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            include: compile_patterns(&config.include_patterns)?,
            exclude: compile_patterns(&config.exclude_patterns)?,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    fn is_hidden_name(name: &str) -> bool {
        name.starts_with('.')
    }

    /// Apply all four layers to a file path. Short-circuits on the first
    /// excluding layer: hidden, ignore rules, include allowlist, exclude
    /// blocklist. The exclude layer always wins over the allowlist.
    pub fn include_file(&self, rel_path: &str, rules: &IgnoreRules) -> bool {
        if !self.config.include_hidden && rel_path.split('/').any(Self::is_hidden_name) {
            return false;
        }

        if self.config.respect_gitignore && rules.is_ignored(rel_path, false) {
            return false;
        }

        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(rel_path)) {
            return false;
        }

        !self.exclude.iter().any(|p| p.matches(rel_path))
    }

    /// Whether a scan may descend into a directory. Only the hidden and
    /// ignore-rule layers apply; the glob layers are file-level filters.
    pub fn descend(&self, rel_dir_path: &str, rules: &IgnoreRules) -> bool {
        let name = rel_dir_path.rsplit('/').next().unwrap_or(rel_dir_path);
        if !self.config.include_hidden && Self::is_hidden_name(name) {
            return false;
        }
        !(self.config.respect_gitignore && rules.is_ignored(rel_dir_path, true))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|err| DiffError::Pattern {
                pattern: p.clone(),
                reason: err.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn filter(config: FilterConfig) -> PathFilter {
        PathFilter::new(&config).unwrap()
    }

    #[test]
    fn empty_include_list_means_no_restriction() {
        let f = filter(FilterConfig::default());
        assert!(f.include_file("src/main.rs", &IgnoreRules::new()));
    }

    #[test]
    fn hidden_segments_exclude_the_whole_path() {
        let f = filter(FilterConfig::default());
        let rules = IgnoreRules::new();
        assert!(!f.include_file(".env", &rules));
        assert!(!f.include_file(".config/settings.toml", &rules));
        assert!(f.include_file("visible/settings.toml", &rules));
    }

    #[test]
    fn include_hidden_allows_dotfiles() {
        let config = FilterConfig {
            include_hidden: true,
            ..FilterConfig::default()
        };
        assert!(filter(config).include_file(".env", &IgnoreRules::new()));
    }

    #[test]
    fn include_patterns_form_an_allowlist() {
        let config = FilterConfig {
            include_patterns: vec!["*.py".to_string()],
            ..FilterConfig::default()
        };
        let f = filter(config);
        let rules = IgnoreRules::new();
        assert!(f.include_file("main.py", &rules));
        assert!(f.include_file("pkg/util.py", &rules));
        assert!(!f.include_file("main.rs", &rules));
    }

    #[test]
    fn exclude_wins_over_include_for_the_same_path() {
        let config = FilterConfig {
            include_patterns: vec!["*.py".to_string()],
            exclude_patterns: vec!["test_*.py".to_string()],
            ..FilterConfig::default()
        };
        let f = filter(config);
        let rules = IgnoreRules::new();
        assert!(f.include_file("main.py", &rules));
        assert!(!f.include_file("test_main.py", &rules));
    }

    #[test]
    fn invalid_glob_pattern_is_a_typed_error() {
        let config = FilterConfig {
            include_patterns: vec!["[".to_string()],
            ..FilterConfig::default()
        };
        assert!(matches!(
            PathFilter::new(&config),
            Err(DiffError::Pattern { .. })
        ));
    }

    #[test]
    fn hidden_check_wins_over_ignore_negation() {
        // A `!.env` negation cannot resurrect a hidden file.
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(GITIGNORE_FILENAME), "!.env\n").unwrap();

        let mut rules = IgnoreRules::new();
        rules.load_dir("", temp.path()).unwrap();

        let f = filter(FilterConfig::default());
        assert!(!f.include_file(".env", &rules));
    }

    #[test]
    fn ignore_rules_scope_to_their_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub").join(GITIGNORE_FILENAME), "*.log\n").unwrap();

        let mut rules = IgnoreRules::new();
        rules.load_dir("sub", &temp.path().join("sub")).unwrap();

        // Applies to the declaring directory and its descendants only.
        assert!(rules.is_ignored("sub/app.log", false));
        assert!(rules.is_ignored("sub/deep/app.log", false));
        assert!(!rules.is_ignored("app.log", false));
        assert!(!rules.is_ignored("other/app.log", false));
    }

    #[test]
    fn later_patterns_override_earlier_within_one_scope() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(GITIGNORE_FILENAME),
            "*.log\n!keep.log\n",
        )
        .unwrap();

        let mut rules = IgnoreRules::new();
        rules.load_dir("", temp.path()).unwrap();

        assert!(rules.is_ignored("app.log", false));
        assert!(!rules.is_ignored("keep.log", false));
    }

    #[test]
    fn directory_only_patterns_match_directories() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(GITIGNORE_FILENAME), "build/\n").unwrap();

        let mut rules = IgnoreRules::new();
        rules.load_dir("", temp.path()).unwrap();

        assert!(rules.is_ignored("build", true));
        assert!(!rules.is_ignored("build", false));
    }

    #[test]
    fn ancestor_prefixes_are_root_first() {
        assert_eq!(ancestor_dirs("a/b/c.txt"), vec!["", "a", "a/b"]);
        assert_eq!(ancestor_dirs("file.txt"), vec![""]);
    }
}
