//! `package.json` types and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Package name of the Electron runtime
pub const ELECTRON_PACKAGE: &str = "electron";

/// Live-reload helper the starter entry point requires
pub const LIVE_RELOAD_PACKAGE: &str = "electron-reload";
const LIVE_RELOAD_CONSTRAINT: &str = "^1.5.0";

/// Constraint written for Electron in a new project
pub const DEFAULT_ELECTRON_CONSTRAINT: &str = "latest";

/// Project manifest (`package.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    /// Entry point script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, String>,

    /// Package name to version constraint
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Every other top-level field, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageManifest {
    /// Manifest for a freshly scaffolded Electron app
    pub fn electron_app(name: &str) -> Self {
        let mut scripts = BTreeMap::new();
        scripts.insert("start".to_string(), "electron .".to_string());

        let mut dependencies = BTreeMap::new();
        dependencies.insert(
            ELECTRON_PACKAGE.to_string(),
            DEFAULT_ELECTRON_CONSTRAINT.to_string(),
        );
        dependencies.insert(
            LIVE_RELOAD_PACKAGE.to_string(),
            LIVE_RELOAD_CONSTRAINT.to_string(),
        );

        Self {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            main: Some("main.js".to_string()),
            scripts,
            dependencies,
            extra: Map::new(),
        }
    }

    pub fn electron_version(&self) -> Option<&str> {
        self.dependencies.get(ELECTRON_PACKAGE).map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("Failed to serialize package.json")?;
        json.push('\n');
        Ok(json)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Rewrite one dependency constraint in the manifest at `path`, leaving every
/// other field and the key order untouched. Returns the previous constraint.
///
/// Not atomic: the file is read whole, edited in memory and written whole.
pub async fn set_dependency(
    path: &Path,
    package: &str,
    constraint: &str,
) -> Result<Option<String>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut root: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let object = root
        .as_object_mut()
        .with_context(|| format!("{} is not a JSON object", path.display()))?;
    let dependencies = object
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .with_context(|| format!("\"dependencies\" in {} is not an object", path.display()))?;

    let previous = dependencies
        .insert(package.to_string(), Value::String(constraint.to_string()))
        .and_then(|v| v.as_str().map(str::to_string));

    let mut json = serde_json::to_string_pretty(&root)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    json.push('\n');
    fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), package, constraint, ?previous, "updated dependency");
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_electron_app_manifest_shape() {
        let manifest = PackageManifest::electron_app("electron-app");
        let value: Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();

        assert_eq!(value["name"], "electron-app");
        assert_eq!(value["version"], "1.0.0");
        assert_eq!(value["main"], "main.js");
        assert_eq!(value["scripts"]["start"], "electron .");
        assert_eq!(value["dependencies"]["electron"], "latest");
        assert_eq!(value["dependencies"]["electron-reload"], "^1.5.0");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{
  "name": "demo",
  "version": "0.2.0",
  "license": "MIT",
  "dependencies": { "electron": "34.0.0" },
  "devDependencies": { "typescript": "^5.0.0" }
}"#;
        let manifest: PackageManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.electron_version(), Some("34.0.0"));
        assert_eq!(manifest.extra["license"], "MIT");
        assert_eq!(manifest.extra["devDependencies"]["typescript"], "^5.0.0");
    }

    #[tokio::test]
    async fn test_set_dependency_preserves_other_fields_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(
            &path,
            r#"{"name":"demo","devDependencies":{"b":"1"},"dependencies":{"zeta":"1.0.0","electron":"latest"},"author":"me"}"#,
        )
        .unwrap();

        let previous = set_dependency(&path, ELECTRON_PACKAGE, "35.0.0").await.unwrap();
        assert_eq!(previous.as_deref(), Some("latest"));

        let written = std::fs::read_to_string(&path).unwrap();
        let keys: Vec<String> = serde_json::from_str::<Map<String, Value>>(&written)
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["name", "devDependencies", "dependencies", "author"]);

        let value: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["dependencies"]["electron"], "35.0.0");
        assert_eq!(value["dependencies"]["zeta"], "1.0.0");
        assert_eq!(value["author"], "me");
    }

    #[tokio::test]
    async fn test_set_dependency_creates_missing_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"name":"demo","version":"1.0.0"}"#).unwrap();

        let previous = set_dependency(&path, ELECTRON_PACKAGE, "34.1.0").await.unwrap();
        assert!(previous.is_none());

        let manifest = PackageManifest::load(&path).await.unwrap();
        assert_eq!(manifest.electron_version(), Some("34.1.0"));
    }

    #[tokio::test]
    async fn test_set_dependency_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(set_dependency(&path, ELECTRON_PACKAGE, "34.1.0").await.is_err());
    }
}
