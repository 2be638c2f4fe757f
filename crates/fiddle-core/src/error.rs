//! Errors surfaced to the user by the command handlers

use crate::dispatch::NoticeLevel;
use std::path::PathBuf;
use thiserror::Error;

/// Why a command was aborted.
///
/// Every variant maps onto one of the user-visible notice levels; none of
/// them is retried automatically.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Please open a folder before running this command.")]
    NoWorkspace,

    #[error("Folder name cannot be empty.")]
    EmptyName,

    #[error("Folder name \"{0}\" must be a single directory name.")]
    InvalidName(String),

    #[error("Folder \"{0}\" already exists.")]
    AlreadyExists(String),

    #[error("Electron project folder does not exist: {}", .0.display())]
    ProjectMissing(PathBuf),

    #[error("No version selected.")]
    NoVersionSelected,

    #[error("\"{0}\" is not an Electron version or dist tag.")]
    InvalidVersion(String),

    #[error("Error installing dependencies: {0}")]
    DependencyInstall(String),

    #[error("Error installing Electron version: {0}")]
    ElectronInstall(String),

    #[error("Enter a fiddle folder, gist or repository to start.")]
    NoFiddleSource,

    #[error("A fiddle is already running (pid {0}). Stop it before starting another.")]
    FiddleAlreadyRunning(u32),

    #[error("Error starting the fiddle: {0:#}")]
    FiddleStart(anyhow::Error),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    /// Level at which this error is shown to the user
    pub fn level(&self) -> NoticeLevel {
        match self {
            CommandError::EmptyName | CommandError::NoFiddleSource => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}
