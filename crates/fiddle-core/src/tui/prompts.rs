//! Charm-style prompts using cliclack
//!
//! Each prompt returns `None` when the user cancels it (Esc or Ctrl+C), so
//! the command that asked can report "no selection" its own way.

use crate::releases::{is_prerelease, is_valid_constraint, parse_version, ReleaseIndex};
use anyhow::Result;
use std::io;

/// Versions shown before the list scrolls
const VISIBLE_VERSIONS: usize = 12;

const OTHER_VERSION: &str = "__other__";
const LATEST_TAG: &str = "latest";

/// Map a cancelled prompt to `None`; other I/O failures stay errors
fn cancellable<T>(result: io::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Folder to scaffold into; an empty answer takes `default`
pub fn folder_name(default: &str) -> Result<Option<String>> {
    cancellable(
        cliclack::input("Enter the folder name for the Electron project")
            .placeholder(default)
            .default_input(default)
            .interact(),
    )
}

/// Existing project folder; an empty answer takes `default`
pub fn project_name(default: &str) -> Result<Option<String>> {
    cancellable(
        cliclack::input("Project folder to switch")
            .placeholder(default)
            .default_input(default)
            .interact(),
    )
}

/// Where the fiddle comes from
pub fn fiddle_source() -> Result<Option<String>> {
    cancellable(
        cliclack::input("Fiddle to run (folder, gist or GitHub repository)")
            .placeholder("./my-fiddle")
            .interact(),
    )
}

/// Version to type in by hand, checked as a version or dist tag
pub fn typed_version(initial: &str) -> Result<Option<String>> {
    cancellable(
        cliclack::input("Electron version")
            .placeholder(initial)
            .default_input(initial)
            .validate(|input: &String| {
                if is_valid_constraint(input.trim()) {
                    Ok(())
                } else {
                    Err("Enter a version like 35.0.0 or a tag like latest")
                }
            })
            .interact(),
    )
    .map(|v| v.map(|s: String| s.trim().to_string()))
}

/// Warning for an exact version the index does not list. Tags and ranges are
/// left to npm.
fn unlisted_warning(index: &ReleaseIndex, version: &str) -> Option<String> {
    if parse_version(version).is_err() || index.contains(version) {
        return None;
    }
    Some(format!(
        "Electron {} is not in the release index; npm may not find it",
        version
    ))
}

/// Pick a release from the index, newest first, starting on the newest stable
/// one. The last item lets the user type a version the index does not list.
pub fn pick_version(index: &ReleaseIndex, include_prereleases: bool) -> Result<Option<String>> {
    if index.is_empty() {
        cliclack::log::warning("No releases available, enter a version instead")?;
        return typed_version(LATEST_TAG);
    }

    let mut select = cliclack::select("Select Electron version")
        .filter_mode()
        .max_rows(VISIBLE_VERSIONS)
        .item(LATEST_TAG.to_string(), LATEST_TAG, "dist tag");

    for release in index.releases() {
        let prerelease = is_prerelease(&release.version);
        if prerelease && !include_prereleases {
            continue;
        }
        let hint = match (&release.date, prerelease) {
            (Some(date), true) => format!("{} (prerelease)", date),
            (Some(date), false) => date.clone(),
            (None, true) => "prerelease".to_string(),
            (None, false) => String::new(),
        };
        select = select.item(release.version.clone(), &release.version, hint);
    }

    select = select.item(OTHER_VERSION.to_string(), "Other...", "type a version");
    if let Some(stable) = index.latest_stable() {
        select = select.initial_value(stable.version.clone());
    }

    match cancellable(select.interact())? {
        Some(choice) if choice == OTHER_VERSION => {
            let typed = typed_version(LATEST_TAG)?;
            if let Some(warning) = typed.as_deref().and_then(|v| unlisted_warning(index, v)) {
                cliclack::log::warning(warning)?;
            }
            Ok(typed)
        }
        other => Ok(other),
    }
}

/// Electron version a fiddle runs with
pub fn fiddle_version(default: &str) -> Result<Option<String>> {
    typed_version(default)
}

/// Yes/no with a default, cancel counting as no
pub fn confirm(prompt: &str, initial: bool) -> Result<bool> {
    Ok(cancellable(cliclack::confirm(prompt).initial_value(initial).interact())?.unwrap_or(false))
}
