//! Configuration file discovery and loading

use std::fs;
use std::path::{Path, PathBuf};

use super::modlint_config::ModlintConfig;
use crate::error::ModlintError;
use crate::result::Result;

/// Config file names, in lookup priority order
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    ".modlintrc.toml",
    ".modlintrc.json",
    "modlint.toml",
    "modlint.json",
];

/// A configuration plus the file it came from, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: ModlintConfig,
    pub path: Option<PathBuf>,
    /// Directory relative paths in the config resolve against
    pub base_dir: PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Walk up from `start_path` looking for a config file.
    ///
    /// Within one directory the names in [`CONFIG_FILE_NAMES`] are tried in
    /// order; the nearest directory wins.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path.canonicalize().map_err(|e| {
            ModlintError::config_error(format!("Invalid path '{}': {e}", start_path.display()))
        })?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let candidate = current.join(filename);
                if candidate.is_file() {
                    tracing::debug!("Found config: {}", candidate.display());
                    return Ok(Some(candidate));
                }
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    /// Load a config file; the format follows the extension
    pub fn load_from_file(path: &Path) -> Result<ModlintConfig> {
        let text = fs::read_to_string(path).map_err(|e| ModlintError::io_error(path, e))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

        match extension {
            "toml" => toml::from_str(&text).map_err(|e| {
                ModlintError::config_error(format!("Failed to parse '{}': {e}", path.display()))
            }),
            "json" => serde_json::from_str(&text).map_err(|e| {
                ModlintError::config_error(format!("Failed to parse '{}': {e}", path.display()))
            }),
            other => Err(ModlintError::config_error(format!(
                "Unsupported config format '{other}' for '{}'; use .toml or .json",
                path.display()
            ))),
        }
    }

    /// Load an explicit config, or discover one from `start_dir`.
    ///
    /// An explicit path must exist; a failed discovery falls back to the
    /// defaults with `start_dir` as the base directory.
    pub fn load(custom_path: Option<&Path>, start_dir: &Path) -> Result<LoadedConfig> {
        let path = match custom_path {
            Some(path) if !path.is_file() => {
                return Err(ModlintError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::auto_discover(start_dir)?,
        };

        let Some(path) = path else {
            tracing::debug!("No config file found; using defaults");
            return Ok(LoadedConfig {
                config: ModlintConfig::default(),
                path: None,
                base_dir: start_dir.to_path_buf(),
            });
        };

        let config = Self::load_from_file(&path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| start_dir.to_path_buf());
        Ok(LoadedConfig {
            config,
            path: Some(path),
            base_dir,
        })
    }
}
