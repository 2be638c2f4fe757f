//! Electron release index fetching from remote or a local file
//!
//! The remote index is the same `releases.json` the Electron release site
//! publishes. Every successful remote fetch refreshes the on-disk cache, and
//! the cache is used when the remote cannot be reached.

use super::version::{compare_newest_first, is_prerelease};
use crate::config::ResolvedConfig;
use crate::product::ProductConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

/// One entry of the release index. Only `version` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectronRelease {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome: Option<String>,
}

/// Release index source - either remote URL or local file
#[derive(Debug, Clone)]
pub enum ReleaseSource {
    Remote(Url),
    Local(PathBuf),
}

impl ReleaseSource {
    /// Treat `location` as a local file when it is not a URL
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Self::Remote(url),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::Local)
                .unwrap_or(Self::Remote(url)),
            _ => Self::Local(PathBuf::from(location)),
        }
    }

    pub fn local(path: PathBuf) -> Self {
        Self::Local(path)
    }
}

/// Where the releases of an index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    Remote,
    Cache,
    Local,
}

/// A fetched release index
#[derive(Debug, Clone)]
pub struct ReleaseIndex {
    releases: Vec<ElectronRelease>,
    origin: IndexOrigin,
}

impl ReleaseIndex {
    pub fn new(mut releases: Vec<ElectronRelease>, origin: IndexOrigin) -> Self {
        releases.sort_by(|a, b| compare_newest_first(&a.version, &b.version));
        releases.dedup_by(|a, b| a.version == b.version);
        Self { releases, origin }
    }

    pub fn origin(&self) -> IndexOrigin {
        self.origin
    }

    /// All releases, newest first
    pub fn releases(&self) -> &[ElectronRelease] {
        &self.releases
    }

    /// Version strings, newest first, optionally without prereleases
    pub fn versions(&self, include_prereleases: bool) -> Vec<String> {
        self.releases
            .iter()
            .filter(|r| include_prereleases || !is_prerelease(&r.version))
            .map(|r| r.version.clone())
            .collect()
    }

    pub fn contains(&self, version: &str) -> bool {
        let version = version.strip_prefix('v').unwrap_or(version);
        self.releases.iter().any(|r| r.version == version)
    }

    pub fn latest_stable(&self) -> Option<&ElectronRelease> {
        self.releases.iter().find(|r| !is_prerelease(&r.version))
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

/// Release fetcher - retrieves the index from its source, with a cache fallback
pub struct ReleaseFetcher {
    source: ReleaseSource,
    client: reqwest::Client,
    cache_path: Option<PathBuf>,
}

impl ReleaseFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(source: ReleaseSource, user_agent: &str) -> Self {
        Self {
            source,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            cache_path: None,
        }
    }

    /// Create a fetcher for the resolved release index URL, cached in the runner paths
    pub fn from_config<C: ProductConfig>(config: &C, resolved: &ResolvedConfig) -> Self {
        Self::new(
            ReleaseSource::parse(&resolved.releases_url),
            config.user_agent(),
        )
        .with_cache(resolved.paths.versions_cache.clone())
    }

    /// Keep a copy of every remote fetch at `path` and fall back to it
    pub fn with_cache(mut self, path: PathBuf) -> Self {
        self.cache_path = Some(path);
        self
    }

    fn parse(content: &str) -> Result<Vec<ElectronRelease>> {
        serde_json::from_str(content).context("Failed to parse release index")
    }

    async fn read_file(path: &Path) -> Result<Vec<ElectronRelease>> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    async fn fetch_remote(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch release index from {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch release index from {}: HTTP {}",
                url,
                response.status()
            );
        }

        Ok(response.text().await?)
    }

    async fn write_cache(&self, content: &str) {
        let Some(path) = &self.cache_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent).await;
        }
        if let Err(e) = fs::write(path, content).await {
            warn!(path = %path.display(), error = %e, "could not write release cache");
        }
    }

    /// Fetch the release index
    pub async fn fetch(&self) -> Result<ReleaseIndex> {
        match &self.source {
            ReleaseSource::Remote(url) => {
                let remote = match self.fetch_remote(url).await {
                    Ok(content) => Self::parse(&content).map(|releases| (content, releases)),
                    Err(e) => Err(e),
                };

                match remote {
                    Ok((content, releases)) => {
                        debug!(count = releases.len(), %url, "fetched release index");
                        self.write_cache(&content).await;
                        Ok(ReleaseIndex::new(releases, IndexOrigin::Remote))
                    }
                    Err(e) => match &self.cache_path {
                        Some(cache) if cache.exists() => {
                            warn!(error = %format!("{:#}", e), "using cached release index");
                            let releases = Self::read_file(cache).await?;
                            Ok(ReleaseIndex::new(releases, IndexOrigin::Cache))
                        }
                        _ => Err(e),
                    },
                }
            }
            ReleaseSource::Local(path) => {
                let releases = Self::read_file(path).await?;
                Ok(ReleaseIndex::new(releases, IndexOrigin::Local))
            }
        }
    }
}
