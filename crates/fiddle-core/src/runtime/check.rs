//! Toolchain detection for Node.js and npm

use anyhow::Result;
use std::process::Command;

/// Toolchain detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

/// npm ships as a batch script on Windows
pub fn npm_program() -> &'static str {
    if cfg!(windows) {
        "npm.cmd"
    } else {
        "npm"
    }
}

fn detect(name: &'static str, program: &str) -> RuntimeInfo {
    let output = Command::new(program).arg("--version").output();

    match output {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            RuntimeInfo {
                name,
                version: Some(version),
                available: true,
            }
        }
        _ => RuntimeInfo {
            name,
            version: None,
            available: false,
        },
    }
}

/// Check if Node.js is available
pub fn check_node() -> RuntimeInfo {
    detect("Node.js", "node")
}

/// Check if npm is available
pub fn check_npm() -> RuntimeInfo {
    detect("npm", npm_program())
}

/// Check that everything needed to install dependencies and run Electron is present
pub fn check_toolchain() -> Result<Vec<RuntimeInfo>> {
    let results = vec![check_node(), check_npm()];

    let missing: Vec<&str> = results
        .iter()
        .filter(|r| !r.available)
        .map(|r| r.name)
        .collect();

    if !missing.is_empty() {
        anyhow::bail!(
            "Missing required tools: {} (install Node.js from https://nodejs.org)",
            missing.join(", ")
        );
    }

    Ok(results)
}
