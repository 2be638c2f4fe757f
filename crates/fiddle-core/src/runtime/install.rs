//! Dependency installation through npm
//!
//! Installs are awaited and produce an [`InstallOutcome`] carrying the exit
//! status and the captured stderr, so callers can report failures with the
//! text npm printed.

use crate::runtime::check::npm_program;
use anyhow::{Context, Result};
use colored::Colorize;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// What to install and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Working directory npm runs in
    pub cwd: PathBuf,
    /// Install into this prefix instead of the project in `cwd`
    pub prefix: Option<PathBuf>,
    /// Explicit package specs (`electron@35.0.0`); empty installs the manifest's dependencies
    pub packages: Vec<String>,
    /// Extra environment for the npm process
    pub env: Vec<(String, String)>,
}

impl InstallRequest {
    /// `npm install` for the project in `dir`
    pub fn project(dir: &Path) -> Self {
        Self {
            cwd: dir.to_path_buf(),
            prefix: None,
            packages: Vec::new(),
            env: Vec::new(),
        }
    }

    /// `npm install --prefix <prefix> <spec>`, used for per-version runtime installs
    pub fn package_into(prefix: &Path, spec: impl Into<String>) -> Self {
        Self {
            cwd: prefix.to_path_buf(),
            prefix: Some(prefix.to_path_buf()),
            packages: vec![spec.into()],
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Result of an install run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

impl InstallOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn failed(code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            stderr: stderr.into(),
        }
    }
}

/// Runs dependency installs. The npm implementation is used everywhere except tests.
pub trait PackageInstaller: Send + Sync {
    fn install(&self, request: &InstallRequest)
        -> impl Future<Output = Result<InstallOutcome>> + Send;
}

/// Installer that shells out to npm
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    program: OsString,
    /// Stream npm's output to the terminal while it runs
    echo: bool,
}

impl Default for NpmInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl NpmInstaller {
    pub fn new() -> Self {
        Self {
            program: npm_program().into(),
            echo: false,
        }
    }

    /// Use a different npm-compatible executable
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            echo: false,
        }
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn command_args(request: &InstallRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["install".into()];
        if let Some(prefix) = &request.prefix {
            args.push("--prefix".into());
            args.push(prefix.clone().into_os_string());
            args.push("--no-save".into());
        }
        args.push("--no-audit".into());
        args.push("--no-fund".into());
        args.extend(request.packages.iter().map(OsString::from));
        args
    }

    async fn run(&self, request: &InstallRequest) -> Result<InstallOutcome> {
        let args = Self::command_args(request);
        debug!(program = ?self.program, ?args, cwd = %request.cwd.display(), "running npm");

        if self.echo {
            println!();
            println!(
                "{} {} {}",
                "Running:".dimmed(),
                self.program.to_string_lossy().yellow(),
                args.iter()
                    .map(|a| a.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .yellow()
            );
            println!();
        }

        let mut child = TokioCommand::new(&self.program)
            .args(&args)
            .current_dir(&request.cwd)
            .envs(request.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to run {} in {}",
                    self.program.to_string_lossy(),
                    request.cwd.display()
                )
            })?;

        let stdout = child.stdout.take().context("Failed to capture npm stdout")?;
        let stderr = child.stderr.take().context("Failed to capture npm stderr")?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();
        let mut stdout_done = false;
        let mut stderr_done = false;
        let mut captured = Vec::new();

        while !(stdout_done && stderr_done) {
            tokio::select! {
                line = stdout_reader.next_line(), if !stdout_done => {
                    match line {
                        Ok(Some(line)) => {
                            if self.echo {
                                println!("  {}", line);
                            }
                        }
                        Ok(None) => stdout_done = true,
                        Err(e) => {
                            debug!(error = %e, "error reading npm stdout");
                            stdout_done = true;
                        }
                    }
                }
                line = stderr_reader.next_line(), if !stderr_done => {
                    match line {
                        Ok(Some(line)) => {
                            if self.echo {
                                eprintln!("  {}", line.yellow());
                            }
                            captured.push(line);
                        }
                        Ok(None) => stderr_done = true,
                        Err(e) => {
                            debug!(error = %e, "error reading npm stderr");
                            stderr_done = true;
                        }
                    }
                }
            }
        }

        let status = child.wait().await.context("Failed to wait for npm")?;
        if self.echo {
            println!();
        }
        debug!(?status, "npm finished");

        let stderr = captured.join("\n");
        if status.success() {
            Ok(InstallOutcome {
                success: true,
                code: status.code(),
                stderr,
            })
        } else {
            Ok(InstallOutcome::failed(status.code(), stderr))
        }
    }
}

impl PackageInstaller for NpmInstaller {
    fn install(
        &self,
        request: &InstallRequest,
    ) -> impl Future<Output = Result<InstallOutcome>> + Send {
        self.run(request)
    }
}

impl<T: PackageInstaller> PackageInstaller for std::sync::Arc<T> {
    fn install(
        &self,
        request: &InstallRequest,
    ) -> impl Future<Output = Result<InstallOutcome>> + Send {
        T::install(self, request)
    }
}
