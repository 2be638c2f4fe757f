//! Product configuration trait for CLI binaries
//!
//! This trait defines the identity and defaults a binary hands to the library:
//! where releases are listed, which env vars override what, and which Electron
//! version fiddles run against when the user does not pick one.

use std::path::Path;

/// Configuration trait for the CLI product
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for cache/config directories)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Default URL of the Electron release index
    fn default_releases_url(&self) -> &'static str;

    /// Environment variable name for overriding the release index URL
    fn releases_url_env(&self) -> &'static str;

    /// Environment variable name for overriding the cache root
    fn home_env(&self) -> &'static str;

    /// Environment variable name pointing at a settings file
    fn settings_env(&self) -> &'static str;

    /// Folder name offered when scaffolding, and looked up when switching versions
    fn default_project_name(&self) -> &'static str {
        "electron-app"
    }

    /// Electron version fiddles run against unless overridden
    fn default_fiddle_version(&self) -> &'static str;

    /// Where to send users who have no Node.js/npm installed
    fn node_download_url(&self) -> &'static str {
        "https://nodejs.org/en/download"
    }

    /// Generate the "next steps" instructions after project creation
    fn next_steps(&self, dir: &Path, installed: bool) -> Vec<String>;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
