//! Running fiddles against a chosen Electron release
//!
//! This module provides:
//! - Fiddle sources (folder, gist, GitHub repository) and their materialisation
//! - The `Runner` that installs Electron versions and launches fiddles
//! - The `FiddleController` owning the single running fiddle

pub mod controller;
pub mod runner;
pub mod source;

pub use controller::{ExitReport, FiddleController, FiddleState, StopOutcome};
pub use runner::{electron_binary, FiddleLauncher, Runner};
pub use source::{Fiddle, FiddleFactory, FiddleSource};

/// Input for the start-fiddle command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartFiddleInput {
    /// Folder path, gist id/URL or repository URL
    pub source: String,
    /// Exact Electron version to run with
    pub electron_version: String,
}

impl StartFiddleInput {
    pub fn new(source: impl Into<String>, electron_version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            electron_version: electron_version.into(),
        }
    }
}
