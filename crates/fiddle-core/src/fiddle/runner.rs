//! Electron runtime installs and fiddle process launch

use crate::config::RunnerPaths;
use crate::fiddle::source::{Fiddle, FiddleFactory, FiddleSource};
use crate::fiddle::StartFiddleInput;
use crate::releases::parse_version;
use crate::runtime::{InstallRequest, NpmInstaller, PackageInstaller};
use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command as TokioCommand};
use tracing::{debug, info};

/// Environment variable the electron package reads its download cache from
const ELECTRON_CACHE_ENV: &str = "electron_config_cache";

/// Starts a fiddle process. The controller supervises whatever child this returns.
pub trait FiddleLauncher: Send + Sync {
    fn launch(&self, input: &StartFiddleInput) -> impl Future<Output = Result<Child>> + Send;
}

/// Launcher backed by per-version Electron installs under the runner paths
pub struct Runner<I = NpmInstaller> {
    paths: RunnerPaths,
    installer: I,
    factory: FiddleFactory,
    inherit_stdio: bool,
}

impl Runner<NpmInstaller> {
    pub fn new(paths: RunnerPaths, user_agent: &str) -> Self {
        Self::with_installer(paths, NpmInstaller::new().echo(true), user_agent)
    }
}

impl<I: PackageInstaller> Runner<I> {
    pub fn with_installer(paths: RunnerPaths, installer: I, user_agent: &str) -> Self {
        let factory = FiddleFactory::new(paths.fiddles.clone(), user_agent);
        Self {
            paths,
            installer,
            factory,
            inherit_stdio: false,
        }
    }

    /// Let the Electron process write to this terminal
    pub fn inherit_stdio(mut self, inherit: bool) -> Self {
        self.inherit_stdio = inherit;
        self
    }

    /// Install prefix for one exact Electron version
    pub fn install_dir(&self, version: &str) -> PathBuf {
        self.paths.electron_install.join(version)
    }

    /// Install Electron `version` unless it is already present; returns the executable
    pub async fn ensure_installed(&self, version: &str) -> Result<PathBuf> {
        let version = parse_version(version)
            .with_context(|| format!("'{}' is not an exact Electron version", version))?
            .to_string();
        let prefix = self.install_dir(&version);

        if let Some(binary) = electron_binary(&prefix) {
            debug!(%version, binary = %binary.display(), "electron already installed");
            return Ok(binary);
        }

        tokio::fs::create_dir_all(&prefix)
            .await
            .with_context(|| format!("Failed to create directory: {}", prefix.display()))?;
        tokio::fs::create_dir_all(&self.paths.electron_downloads)
            .await
            .with_context(|| {
                format!(
                    "Failed to create directory: {}",
                    self.paths.electron_downloads.display()
                )
            })?;

        info!(%version, prefix = %prefix.display(), "installing electron");
        let request = InstallRequest::package_into(&prefix, format!("electron@{}", version))
            .with_env(
                ELECTRON_CACHE_ENV,
                self.paths.electron_downloads.to_string_lossy(),
            );
        let outcome = self.installer.install(&request).await?;
        if !outcome.success {
            anyhow::bail!("Failed to install Electron {}: {}", version, outcome.stderr.trim());
        }

        electron_binary(&prefix)
            .with_context(|| format!("Electron {} installed but no executable was found", version))
    }

    /// Spawn `binary` with the fiddle directory as its app path
    pub fn spawn(&self, binary: &Path, fiddle: &Fiddle) -> Result<Child> {
        let (stdout, stderr) = if self.inherit_stdio {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };

        // A dropped handle takes the fiddle down with it
        let child = TokioCommand::new(binary)
            .arg(&fiddle.dir)
            .current_dir(&fiddle.dir)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .with_context(|| format!("Failed to launch {}", binary.display()))?;

        info!(pid = ?child.id(), fiddle = %fiddle.dir.display(), "fiddle launched");
        Ok(child)
    }

    async fn launch_fiddle(&self, input: &StartFiddleInput) -> Result<Child> {
        let source = FiddleSource::parse(&input.source)?;
        let binary = self.ensure_installed(&input.electron_version).await?;
        let fiddle = self.factory.resolve(&source).await?;
        self.spawn(&binary, &fiddle)
    }
}

impl<I: PackageInstaller> FiddleLauncher for Runner<I> {
    fn launch(&self, input: &StartFiddleInput) -> impl Future<Output = Result<Child>> + Send {
        self.launch_fiddle(input)
    }
}

/// Locate the executable of an Electron install: `path.txt` names it relative
/// to `dist/`, with the npm bin shim as a fallback
pub fn electron_binary(prefix: &Path) -> Option<PathBuf> {
    let package = prefix.join("node_modules").join("electron");

    if let Ok(relative) = std::fs::read_to_string(package.join("path.txt")) {
        let binary = package.join("dist").join(relative.trim());
        if binary.is_file() {
            return Some(binary);
        }
    }

    let shim = prefix.join("node_modules").join(".bin").join(if cfg!(windows) {
        "electron.cmd"
    } else {
        "electron"
    });
    shim.is_file().then_some(shim)
}
