//! Switching the pinned Electron version of a scaffolded project

use crate::error::CommandError;
use crate::project::manifest::{set_dependency, ELECTRON_PACKAGE};
use crate::project::scaffold::{validate_folder_name, MANIFEST_FILE};
use crate::project::Workspace;
use crate::releases::is_valid_constraint;
use std::path::{Path, PathBuf};
use tracing::info;

/// Input for the switch-version command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchVersionInput {
    /// Project folder under the workspace root
    pub project: String,
    /// Version picked by the user; `None` when the picker was cancelled
    pub version: Option<String>,
}

impl SwitchVersionInput {
    pub fn new(project: impl Into<String>, version: Option<String>) -> Self {
        Self {
            project: project.into(),
            version,
        }
    }
}

/// Result of a successful switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSwitch {
    pub project_dir: PathBuf,
    pub previous: Option<String>,
    pub current: String,
}

/// Find the project directory without reading anything inside it
pub fn locate_project(workspace: &Workspace, project: &str) -> Result<PathBuf, CommandError> {
    let root = workspace.root()?;
    let name = validate_folder_name(project)?;
    let dir = root.join(name);
    if !dir.is_dir() {
        return Err(CommandError::ProjectMissing(dir));
    }
    Ok(dir)
}

/// Pin `dependencies.electron` in the project's manifest to `version`
pub async fn switch_version(
    project_dir: &Path,
    version: &str,
) -> Result<VersionSwitch, CommandError> {
    let version = version.trim();
    if !is_valid_constraint(version) {
        return Err(CommandError::InvalidVersion(version.to_string()));
    }

    let manifest_path = project_dir.join(MANIFEST_FILE);
    let previous = set_dependency(&manifest_path, ELECTRON_PACKAGE, version).await?;
    info!(
        project = %project_dir.display(),
        from = previous.as_deref().unwrap_or("-"),
        to = version,
        "switched electron version"
    );

    Ok(VersionSwitch {
        project_dir: project_dir.to_path_buf(),
        previous,
        current: version.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::manifest::PackageManifest;
    use crate::project::scaffold::{scaffold_project, CreateProjectInput};

    async fn scaffolded() -> (tempfile::TempDir, PathBuf) {
        let ws = tempfile::tempdir().unwrap();
        let input = CreateProjectInput::new("electron-app");
        let project = scaffold_project(&Workspace::open(ws.path()), &input)
            .await
            .unwrap();
        (ws, project.dir)
    }

    #[tokio::test]
    async fn test_switch_changes_only_electron() {
        let (_ws, dir) = scaffolded().await;
        let before = PackageManifest::load(&dir.join(MANIFEST_FILE)).await.unwrap();

        let switched = switch_version(&dir, "34.2.0").await.unwrap();
        assert_eq!(switched.previous.as_deref(), Some("latest"));
        assert_eq!(switched.current, "34.2.0");

        let after = PackageManifest::load(&dir.join(MANIFEST_FILE)).await.unwrap();
        assert_eq!(after.electron_version(), Some("34.2.0"));

        let mut expected = before.clone();
        expected
            .dependencies
            .insert(ELECTRON_PACKAGE.to_string(), "34.2.0".to_string());
        assert_eq!(after, expected);
    }

    #[tokio::test]
    async fn test_switching_back_restores_manifest() {
        let (_ws, dir) = scaffolded().await;
        let original = std::fs::read(dir.join(MANIFEST_FILE)).unwrap();

        switch_version(&dir, "35.0.0").await.unwrap();
        assert_ne!(std::fs::read(dir.join(MANIFEST_FILE)).unwrap(), original);

        switch_version(&dir, "latest").await.unwrap();
        assert_eq!(std::fs::read(dir.join(MANIFEST_FILE)).unwrap(), original);
    }

    #[tokio::test]
    async fn test_invalid_version_leaves_manifest_alone() {
        let (_ws, dir) = scaffolded().await;
        let original = std::fs::read(dir.join(MANIFEST_FILE)).unwrap();

        let err = switch_version(&dir, "the good one").await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidVersion(_)));
        assert_eq!(std::fs::read(dir.join(MANIFEST_FILE)).unwrap(), original);
    }

    #[test]
    fn test_locate_missing_project() {
        let ws = tempfile::tempdir().unwrap();
        let err = locate_project(&Workspace::open(ws.path()), "electron-app").unwrap_err();
        assert!(matches!(err, CommandError::ProjectMissing(ref p) if p.ends_with("electron-app")));

        let err = locate_project(&Workspace::none(), "electron-app").unwrap_err();
        assert!(matches!(err, CommandError::NoWorkspace));
    }
}
