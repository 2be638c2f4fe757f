//! Cache locations used by the fiddle runner

use crate::config::settings::Settings;
use crate::product::ProductConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where the runner keeps Electron downloads, per-version installs,
/// materialised fiddles and the cached release index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerPaths {
    pub electron_downloads: PathBuf,
    pub electron_install: PathBuf,
    pub fiddles: PathBuf,
    pub versions_cache: PathBuf,
}

impl RunnerPaths {
    /// Lay out all paths below a single root
    pub fn under(root: &Path) -> Self {
        Self {
            electron_downloads: root.join("electron-downloads"),
            electron_install: root.join("electron-install"),
            fiddles: root.join("fiddles"),
            versions_cache: root.join("releases.json"),
        }
    }

    /// Pick the root: env override, then settings, then the platform cache dir
    pub fn resolve<C: ProductConfig>(config: &C, settings: &Settings) -> Self {
        let root = std::env::var(config.home_env())
            .ok()
            .map(PathBuf::from)
            .or_else(|| settings.cache_root.clone())
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(config.name())))
            .unwrap_or_else(|| std::env::temp_dir().join(config.name()));
        Self::under(&root)
    }

    /// Create the directories (the release cache is a file, only its parent is created)
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.electron_downloads, &self.electron_install, &self.fiddles] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        if let Some(parent) = self.versions_cache.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }
}
