//! Toolchain detection and npm-backed installs
//!
//! This module provides:
//! - Node.js/npm detection
//! - The `PackageInstaller` seam and its npm implementation

pub mod check;
pub mod install;

pub use check::{check_node, check_npm, check_toolchain, npm_program, RuntimeInfo};
pub use install::{InstallOutcome, InstallRequest, NpmInstaller, PackageInstaller};
