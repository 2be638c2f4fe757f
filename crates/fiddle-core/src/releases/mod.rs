//! Electron release index
//!
//! This module provides:
//! - Release index types and the fetcher (remote, local file, cache fallback)
//! - Semver helpers for ordering and validating Electron versions

pub mod index;
pub mod version;

pub use index::{ElectronRelease, IndexOrigin, ReleaseFetcher, ReleaseIndex, ReleaseSource};
pub use version::{is_prerelease, is_valid_constraint, parse_version};
