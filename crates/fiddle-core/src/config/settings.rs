//! Optional YAML settings file

use crate::product::ProductConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User settings (`config.yaml`). Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory for downloads, installs, fiddles and the release cache
    #[serde(default)]
    pub cache_root: Option<PathBuf>,

    /// Release index URL
    #[serde(default)]
    pub releases_url: Option<String>,

    /// Electron version fiddles run against
    #[serde(default)]
    pub fiddle_version: Option<String>,

    /// Offer alpha/beta/nightly releases in the version picker
    #[serde(default)]
    pub include_prereleases: bool,
}

impl Settings {
    /// Location of the settings file: the env override, else `<config dir>/<name>/config.yaml`
    pub fn default_path<C: ProductConfig>(config: &C) -> Option<PathBuf> {
        if let Ok(path) = std::env::var(config.settings_env()) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(config.name()).join("config.yaml"))
    }

    /// Load settings from the default location; a missing file yields defaults
    pub fn load<C: ProductConfig>(config: &C) -> Result<Self> {
        match Self::default_path(config) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }
}
