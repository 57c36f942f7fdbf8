use crate::{DiffError, FilterConfig, HashAlgorithm, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "deepdiff.toml";

fn default_true() -> bool {
    true
}

fn default_context_lines() -> usize {
    3
}

/// Application defaults persisted in `deepdiff.toml`. CLI flags override
/// whatever is loaded from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Respect .gitignore rules when scanning
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Include hidden files and directories
    #[serde(default)]
    pub include_hidden: bool,

    /// Glob patterns for files to include (empty means no restriction)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Glob patterns for files to exclude
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Hash algorithm for content comparison
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Context lines around changes in text diffs
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            hash_algorithm: HashAlgorithm::default(),
            context_lines: default_context_lines(),
            portable_mode: false,
        }
    }
}

impl AppConfig {
    /// The filter settings this configuration describes.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            respect_gitignore: self.respect_gitignore,
            include_hidden: self.include_hidden,
            include_patterns: self.include_patterns.clone(),
            exclude_patterns: self.exclude_patterns.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    let exists = path.exists();

    let mut config = if exists {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data).map_err(|e| DiffError::Config(e.to_string()))?
    } else {
        AppConfig::default()
    };

    config.portable_mode = portable;

    Ok(LoadedConfig {
        config,
        path,
        exists,
        portable,
    })
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config).map_err(|e| DiffError::Config(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool)> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "deepdiff", "deepdiff")
        .ok_or_else(|| DiffError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert!(config.respect_gitignore);
        assert!(!config.include_hidden);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.context_lines, 3);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: AppConfig = toml::from_str("include_hidden = true\n").unwrap();
        assert!(config.include_hidden);
        assert!(config.respect_gitignore);
        assert_eq!(config.context_lines, 3);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.exclude_patterns = vec!["*.log".to_string()];
        config.hash_algorithm = HashAlgorithm::Blake3;
        save_config(&path, &config).unwrap();

        let data = fs::read_to_string(&path).unwrap();
        let reloaded: AppConfig = toml::from_str(&data).unwrap();
        assert_eq!(reloaded.exclude_patterns, vec!["*.log".to_string()]);
        assert_eq!(reloaded.hash_algorithm, HashAlgorithm::Blake3);
    }
}
