//! Electron version parsing and ordering

use anyhow::Result;
use semver::{Version, VersionReq};
use std::cmp::Ordering;

/// npm dist tags the electron package publishes
const DIST_TAGS: &[&str] = &["latest", "beta", "alpha", "nightly"];

/// Parse version string, handling a leading `v`
pub fn parse_version(version_str: &str) -> Result<Version> {
    let cleaned = version_str.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).map_err(|e| anyhow::anyhow!("Invalid version '{}': {}", version_str, e))
}

/// Whether a version string names an alpha/beta/nightly build
pub fn is_prerelease(version_str: &str) -> bool {
    parse_version(version_str)
        .map(|v| !v.pre.is_empty())
        .unwrap_or(false)
}

/// Whether `constraint` can be written into `dependencies.electron`:
/// an exact version, a semver range or a dist tag
pub fn is_valid_constraint(constraint: &str) -> bool {
    let constraint = constraint.trim();
    if constraint.is_empty() {
        return false;
    }
    DIST_TAGS.contains(&constraint)
        || parse_version(constraint).is_ok()
        || VersionReq::parse(constraint).is_ok()
}

/// Newest first; strings that are not semver sort last in their original order
pub fn compare_newest_first(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => Ordering::Equal,
    }
}
