//! Configuration: settings file, runner cache paths, and resolution of the
//! effective values from product defaults, settings and environment

pub mod paths;
pub mod settings;

use crate::product::ProductConfig;
use anyhow::Result;

pub use paths::RunnerPaths;
pub use settings::Settings;

/// Effective configuration after defaults, settings file and env vars are applied.
///
/// CLI flags are applied on top by the binary.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub paths: RunnerPaths,
    /// Release index location: an http(s) URL or a local file
    pub releases_url: String,
    pub fiddle_version: String,
    pub include_prereleases: bool,
}

impl ResolvedConfig {
    pub fn resolve<C: ProductConfig>(config: &C, settings: &Settings) -> Result<Self> {
        let releases_url = std::env::var(config.releases_url_env())
            .ok()
            .or_else(|| settings.releases_url.clone())
            .unwrap_or_else(|| config.default_releases_url().to_string());
        if releases_url.trim().is_empty() {
            anyhow::bail!("Release index location is empty");
        }

        let fiddle_version = settings
            .fiddle_version
            .clone()
            .unwrap_or_else(|| config.default_fiddle_version().to_string());

        Ok(Self {
            paths: RunnerPaths::resolve(config, settings),
            releases_url,
            fiddle_version,
            include_prereleases: settings.include_prereleases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestProduct;

    #[test]
    fn test_settings_override_product_defaults() {
        let settings = Settings {
            cache_root: Some("/var/cache/fiddles".into()),
            releases_url: Some("https://mirror.example.com/releases.json".to_string()),
            fiddle_version: Some("33.2.1".to_string()),
            include_prereleases: true,
        };

        let resolved = ResolvedConfig::resolve(&TestProduct, &settings).unwrap();

        assert_eq!(
            resolved.releases_url,
            "https://mirror.example.com/releases.json"
        );
        assert_eq!(resolved.fiddle_version, "33.2.1");
        assert!(resolved.include_prereleases);
        assert_eq!(
            resolved.paths.fiddles,
            std::path::PathBuf::from("/var/cache/fiddles/fiddles")
        );
    }

    #[test]
    fn test_product_defaults_without_settings() {
        let resolved = ResolvedConfig::resolve(&TestProduct, &Settings::default()).unwrap();
        assert_eq!(resolved.fiddle_version, "35.0.0");
        assert!(!resolved.include_prereleases);
    }
}
