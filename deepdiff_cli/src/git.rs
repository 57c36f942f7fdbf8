//! Git ref resolution: extracts `git:REF` arguments into temporary
//! directories so the comparison pipeline only ever sees plain paths.
//!
//! All subprocess calls use list-form arguments, and user-supplied values
//! are rejected when they look like CLI options (leading `-`), so a ref
//! can never be interpreted as a git flag. `--` end-of-options markers are
//! used where git supports them.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

const GIT_PREFIX: &str = "git:";
const MAX_DISPLAY_NAME_LEN: usize = 50;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to run git: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not inside a git repository")]
    NotARepository,

    #[error("Invalid git ref '{ref_name}'{detail}")]
    InvalidRef { ref_name: String, detail: String },

    #[error("Failed to list tree at ref '{ref_name}'{detail}")]
    ListTree { ref_name: String, detail: String },

    #[error("Path '{path}' does not exist at ref '{ref_name}'")]
    MissingPath { ref_name: String, path: String },

    #[error("{label} must not start with '-': {value}")]
    OptionLike { label: &'static str, value: String },
}

/// True when the argument uses the `git:` prefix.
pub fn is_git_ref(value: &str) -> bool {
    value.starts_with(GIT_PREFIX)
}

/// Resolves `git:REF` arguments to temporary directory paths.
///
/// Extracted trees live inside `TempDir`s owned by the resolver, so they
/// stay on disk until the resolver is dropped, including on error paths.
/// Plain filesystem paths pass through unchanged.
pub struct GitResolver {
    cwd: Option<PathBuf>,
    tempdirs: Vec<TempDir>,
    repo_root: Option<PathBuf>,
}

impl GitResolver {
    pub fn new(cwd: Option<PathBuf>) -> Self {
        Self {
            cwd,
            tempdirs: Vec::new(),
            repo_root: None,
        }
    }

    /// Resolve both arguments; each is either a `git:REF` or a plain path.
    pub fn resolve_pair(&mut self, left: &str, right: &str) -> Result<(PathBuf, PathBuf), GitError> {
        let left_path = self.resolve_single(left)?;
        let right_path = self.resolve_single(right)?;
        Ok((left_path, right_path))
    }

    fn resolve_single(&mut self, value: &str) -> Result<PathBuf, GitError> {
        if !is_git_ref(value) {
            return Ok(PathBuf::from(value));
        }

        let ref_name = &value[GIT_PREFIX.len()..];
        let repo_root = self.repo_root()?;
        let sha = validate_ref(ref_name, &repo_root)?;
        debug!("resolved ref '{ref_name}' to {sha}");
        self.extract_to_tempdir(&sha, &sanitize_ref_name(ref_name), &repo_root)
    }

    fn repo_root(&mut self) -> Result<PathBuf, GitError> {
        if let Some(root) = &self.repo_root {
            return Ok(root.clone());
        }
        let root = find_repo_root(self.cwd.as_deref())?;
        self.repo_root = Some(root.clone());
        Ok(root)
    }

    /// Extract a tree into a fresh temp dir, under a subdirectory named
    /// after the ref so renderers show a meaningful root name.
    fn extract_to_tempdir(
        &mut self,
        sha: &str,
        display_name: &str,
        repo_root: &Path,
    ) -> Result<PathBuf, GitError> {
        let tempdir = TempDir::with_prefix("deepdiff-git-")?;
        let named_subdir = tempdir.path().join(display_name);
        std::fs::create_dir(&named_subdir)?;

        for rel_path in list_tree_files(sha, repo_root)? {
            let content = extract_file(sha, &rel_path, repo_root)?;
            let dest = named_subdir.join(&rel_path);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(dest, content)?;
        }

        self.tempdirs.push(tempdir);
        Ok(named_subdir)
    }
}

fn reject_option_like(value: &str, label: &'static str) -> Result<(), GitError> {
    if value.starts_with('-') {
        return Err(GitError::OptionLike {
            label,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn stderr_detail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Absolute path of the enclosing git repository root.
fn find_repo_root(cwd: Option<&Path>) -> Result<PathBuf, GitError> {
    let mut cmd = Command::new("git");
    cmd.args(["rev-parse", "--show-toplevel"]);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(GitError::NotARepository);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(PathBuf::from(stdout.trim()))
}

/// Resolve a ref (branch, tag, SHA, `HEAD~2`, ...) to its full commit SHA.
fn validate_ref(ref_name: &str, repo_root: &Path) -> Result<String, GitError> {
    reject_option_like(ref_name, "Git ref")?;
    let output = Command::new("git")
        .args(["rev-parse", "--verify", &format!("{ref_name}^{{commit}}")])
        .current_dir(repo_root)
        .output()?;
    if !output.status.success() {
        return Err(GitError::InvalidRef {
            ref_name: ref_name.to_string(),
            detail: stderr_detail(&output.stderr),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Sorted relative paths of all files in the tree at `ref_name`.
/// Submodule entries (mode 160000) are skipped.
fn list_tree_files(ref_name: &str, repo_root: &Path) -> Result<Vec<String>, GitError> {
    reject_option_like(ref_name, "Git ref")?;
    let output = Command::new("git")
        .args(["ls-tree", "-r", "--", ref_name])
        .current_dir(repo_root)
        .output()?;
    if !output.status.success() {
        return Err(GitError::ListTree {
            ref_name: ref_name.to_string(),
            detail: stderr_detail(&output.stderr),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut files: Vec<String> = stdout
        .lines()
        .filter_map(|line| {
            // Format: <mode> <type> <hash>\t<path>
            let (meta, path) = line.split_once('\t')?;
            let mode = meta.split_whitespace().next()?;
            if mode == "160000" {
                return None;
            }
            Some(path.to_string())
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Raw bytes of one file at `ref_name`.
fn extract_file(ref_name: &str, path_in_repo: &str, repo_root: &Path) -> Result<Vec<u8>, GitError> {
    reject_option_like(ref_name, "Git ref")?;
    reject_option_like(path_in_repo, "Path")?;
    let output = Command::new("git")
        .arg("show")
        .arg(format!("{ref_name}:{path_in_repo}"))
        .current_dir(repo_root)
        .output()?;
    if !output.status.success() {
        return Err(GitError::MissingPath {
            ref_name: ref_name.to_string(),
            path: path_in_repo.to_string(),
        });
    }
    Ok(output.stdout)
}

/// Filesystem-safe directory name derived from a git ref.
fn sanitize_ref_name(ref_name: &str) -> String {
    let safe: String = ref_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let truncated: String = safe.chars().take(MAX_DISPLAY_NAME_LEN).collect();
    if truncated.is_empty() {
        "ref".to_string()
    } else {
        truncated
    }
}
