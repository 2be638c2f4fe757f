//! Project creation from the embedded starter files

use crate::error::CommandError;
use crate::project::manifest::PackageManifest;
use crate::project::Workspace;
use anyhow::Context;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub const MANIFEST_FILE: &str = "package.json";
pub const ENTRY_POINT_FILE: &str = "main.js";
pub const PAGE_FILE: &str = "index.html";

const ENTRY_POINT: &str = include_str!("../../templates/electron-app/main.js");
const PAGE: &str = include_str!("../../templates/electron-app/index.html");

/// Input for the create-project command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectInput {
    /// Name of the folder to create under the workspace root
    pub folder_name: String,
}

impl CreateProjectInput {
    pub fn new(folder_name: impl Into<String>) -> Self {
        Self {
            folder_name: folder_name.into(),
        }
    }
}

/// A project written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldedProject {
    pub name: String,
    pub dir: PathBuf,
    /// Files written, relative to `dir`
    pub files: Vec<&'static str>,
}

/// Accept a single, non-empty directory name; surrounding whitespace is ignored
pub fn validate_folder_name(name: &str) -> Result<&str, CommandError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::EmptyName);
    }

    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || name.contains('/') || name.contains('\\') {
        return Err(CommandError::InvalidName(name.to_string()));
    }

    Ok(name)
}

/// Create `<workspace>/<folder_name>` with the manifest, entry point and page.
///
/// Nothing is written when the folder already exists. Dependency installation
/// is left to the caller.
pub async fn scaffold_project(
    workspace: &Workspace,
    input: &CreateProjectInput,
) -> Result<ScaffoldedProject, CommandError> {
    let root = workspace.root()?;
    let name = validate_folder_name(&input.folder_name)?;
    let dir = root.join(name);

    if dir.exists() {
        return Err(CommandError::AlreadyExists(name.to_string()));
    }
    match fs::create_dir(&dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(CommandError::AlreadyExists(name.to_string()));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to create directory: {}", dir.display()))
                .into());
        }
    }
    debug!(dir = %dir.display(), "created project directory");

    PackageManifest::electron_app(name)
        .save(&dir.join(MANIFEST_FILE))
        .await?;

    for (file, content) in [(ENTRY_POINT_FILE, ENTRY_POINT), (PAGE_FILE, PAGE)] {
        let path = dir.join(file);
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
    }

    Ok(ScaffoldedProject {
        name: name.to_string(),
        dir,
        files: vec![MANIFEST_FILE, ENTRY_POINT_FILE, PAGE_FILE],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::manifest::ELECTRON_PACKAGE;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_creates_exactly_three_files() {
        let ws = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(ws.path());

        let project = scaffold_project(&workspace, &CreateProjectInput::new("electron-app"))
            .await
            .unwrap();

        assert_eq!(project.dir, ws.path().join("electron-app"));
        assert_eq!(entries(&project.dir), vec!["index.html", "main.js", "package.json"]);

        let manifest = PackageManifest::load(&project.dir.join(MANIFEST_FILE))
            .await
            .unwrap();
        assert_eq!(manifest.name, "electron-app");
        assert_eq!(manifest.dependencies[ELECTRON_PACKAGE], "latest");
        assert!(manifest.dependencies.contains_key("electron-reload"));

        let main_js = std::fs::read_to_string(project.dir.join(ENTRY_POINT_FILE)).unwrap();
        assert!(main_js.contains("require('electron-reload')"));
        assert!(main_js.contains("width: 800, height: 600"));
    }

    #[tokio::test]
    async fn test_existing_folder_is_untouched() {
        let ws = tempfile::tempdir().unwrap();
        let existing = ws.path().join("electron-app");
        std::fs::create_dir(&existing).unwrap();
        std::fs::write(existing.join("notes.txt"), "keep me").unwrap();

        let input = CreateProjectInput::new("electron-app");
        let err = scaffold_project(&Workspace::open(ws.path()), &input)
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::AlreadyExists(ref name) if name == "electron-app"));
        assert_eq!(entries(&existing), vec!["notes.txt"]);
    }

    #[tokio::test]
    async fn test_no_workspace() {
        let err = scaffold_project(&Workspace::none(), &CreateProjectInput::new("electron-app"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NoWorkspace));
    }

    #[tokio::test]
    async fn test_empty_name_writes_nothing() {
        let ws = tempfile::tempdir().unwrap();
        let err = scaffold_project(&Workspace::open(ws.path()), &CreateProjectInput::new("   "))
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::EmptyName));
        assert!(entries(ws.path()).is_empty());
    }

    #[test]
    fn test_folder_name_validation() {
        assert_eq!(validate_folder_name(" my-app ").unwrap(), "my-app");
        assert!(matches!(validate_folder_name(""), Err(CommandError::EmptyName)));
        assert!(matches!(validate_folder_name(".."), Err(CommandError::InvalidName(_))));
        assert!(matches!(validate_folder_name("."), Err(CommandError::InvalidName(_))));
        assert!(matches!(validate_folder_name("a/b"), Err(CommandError::InvalidName(_))));
        assert!(matches!(validate_folder_name("a\\b"), Err(CommandError::InvalidName(_))));
    }
}
