//! Fiddle Core - Shared library for the electron-fiddle CLI
//!
//! This library provides everything behind the four editor-style commands:
//! scaffolding an Electron project, switching its pinned Electron version,
//! and starting/stopping a fiddle against a specific Electron release.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - project scaffolding, manifest rewriting,
//!   release index fetching, fiddle source resolution, npm installs
//! - **Layer 2: Command Dispatch** - `Extension` registers the commands, owns the
//!   `FiddleController` and turns every outcome into a user-facing `Notice`
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompts and command palette
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use fiddle_core::{CreateProjectInput, Extension, Invocation, Workspace};
//!
//! let mut extension = Extension::activate(Workspace::open("/ws"), installer, launcher);
//! extension
//!     .invoke(
//!         Invocation::CreateProject(CreateProjectInput::new("electron-app")),
//!         &notifier,
//!     )
//!     .await;
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod fiddle;
pub mod product;
pub mod project;
pub mod releases;
pub mod runtime;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use config::{ResolvedConfig, RunnerPaths, Settings};
pub use dispatch::{
    CommandId, CommandOutcome, Extension, Invocation, Notice, NoticeLevel, Notifier,
    StandardExtension,
};
pub use error::CommandError;
pub use fiddle::{
    FiddleController, FiddleLauncher, FiddleSource, FiddleState, Runner, StartFiddleInput,
    StopOutcome,
};
pub use product::ProductConfig;
pub use project::{CreateProjectInput, PackageManifest, SwitchVersionInput, Workspace};
pub use releases::{ElectronRelease, ReleaseFetcher, ReleaseIndex, ReleaseSource};
pub use runtime::{InstallOutcome, InstallRequest, NpmInstaller, PackageInstaller};

#[cfg(feature = "tui")]
pub use tui::{run_command, run_session, CommandArgs, TerminalNotifier};
