//! Electron project scaffolding and version pinning
//!
//! This module provides:
//! - The `Workspace` the commands operate in
//! - `package.json` types and in-place dependency rewriting
//! - Project creation from the embedded starter files
//! - Switching the pinned Electron version of an existing project

pub mod manifest;
pub mod scaffold;
pub mod switch;

use crate::error::CommandError;
use std::path::{Path, PathBuf};

pub use manifest::{PackageManifest, ELECTRON_PACKAGE};
pub use scaffold::{scaffold_project, validate_folder_name, CreateProjectInput, ScaffoldedProject};
pub use switch::{locate_project, switch_version, SwitchVersionInput, VersionSwitch};

/// The folder the user has open. Commands that touch projects need one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    root: Option<PathBuf>,
}

impl Workspace {
    /// Open `root` as the workspace; a path that is not a directory leaves no workspace open
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if root.is_dir() {
            Self { root: Some(root) }
        } else {
            Self::none()
        }
    }

    pub fn none() -> Self {
        Self { root: None }
    }

    pub fn is_open(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Result<&Path, CommandError> {
        self.root.as_deref().ok_or(CommandError::NoWorkspace)
    }
}
