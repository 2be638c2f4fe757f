//! Test doubles shared by the unit tests

use crate::dispatch::{Notice, NoticeLevel, Notifier};
use crate::fiddle::{FiddleLauncher, StartFiddleInput};
use crate::product::ProductConfig;
use crate::runtime::{InstallOutcome, InstallRequest, PackageInstaller};
use anyhow::Result;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::process::{Child, Command as TokioCommand};

#[derive(Clone)]
pub struct TestProduct;

impl ProductConfig for TestProduct {
    fn name(&self) -> &'static str {
        "fiddle-core-test"
    }

    fn display_name(&self) -> &'static str {
        "Fiddle Core Test"
    }

    fn default_releases_url(&self) -> &'static str {
        "https://releases.example.com/releases.json"
    }

    fn releases_url_env(&self) -> &'static str {
        "FIDDLE_CORE_TEST_RELEASES_URL"
    }

    fn home_env(&self) -> &'static str {
        "FIDDLE_CORE_TEST_HOME"
    }

    fn settings_env(&self) -> &'static str {
        "FIDDLE_CORE_TEST_CONFIG"
    }

    fn default_fiddle_version(&self) -> &'static str {
        "35.0.0"
    }

    fn next_steps(&self, dir: &Path, _installed: bool) -> Vec<String> {
        vec![format!("cd {}", dir.display())]
    }
}

/// Collects every notice shown
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.text).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().last().cloned()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices().iter().filter(|n| n.level == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Lay out `node_modules/electron` with an executable that runs until interrupted
fn write_fake_electron(prefix: &Path) -> std::io::Result<()> {
    let package = prefix.join("node_modules").join("electron");
    let binary = package.join("dist").join("electron");
    std::fs::create_dir_all(package.join("dist"))?;
    std::fs::write(package.join("path.txt"), "electron")?;
    std::fs::write(&binary, "#!/bin/sh\nexec sleep 30\n")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Installer that records requests instead of running npm
pub struct FakeInstaller {
    outcome: InstallOutcome,
    materialize_electron: bool,
    requests: Mutex<Vec<InstallRequest>>,
}

impl FakeInstaller {
    pub fn with_outcome(outcome: InstallOutcome) -> Self {
        Self {
            outcome,
            materialize_electron: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_outcome(InstallOutcome::succeeded())
    }

    /// Succeeds and lays out an Electron package in prefixed installs
    pub fn materializing_electron() -> Self {
        Self {
            materialize_electron: true,
            ..Self::succeeding()
        }
    }

    pub fn requests(&self) -> Vec<InstallRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PackageInstaller for FakeInstaller {
    fn install(
        &self,
        request: &InstallRequest,
    ) -> impl Future<Output = Result<InstallOutcome>> + Send {
        self.requests.lock().unwrap().push(request.clone());
        let result = match (&request.prefix, self.materialize_electron && self.outcome.success) {
            (Some(prefix), true) => write_fake_electron(prefix)
                .map(|_| self.outcome.clone())
                .map_err(anyhow::Error::from),
            _ => Ok(self.outcome.clone()),
        };
        async move { result }
    }
}

/// Launches a real short command in place of Electron
pub struct CommandLauncher {
    program: &'static str,
    args: Vec<&'static str>,
    launches: AtomicUsize,
}

impl CommandLauncher {
    /// Runs until stopped
    pub fn sleeping() -> Self {
        Self {
            program: "sleep",
            args: vec!["30"],
            launches: AtomicUsize::new(0),
        }
    }

    /// Exits immediately with status 0
    pub fn exiting() -> Self {
        Self {
            program: "true",
            args: Vec::new(),
            launches: AtomicUsize::new(0),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl FiddleLauncher for CommandLauncher {
    fn launch(&self, _input: &StartFiddleInput) -> impl Future<Output = Result<Child>> + Send {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let child = TokioCommand::new(self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(anyhow::Error::from);
        async move { child }
    }
}

/// Launcher whose every launch fails
pub struct FailingLauncher;

impl FiddleLauncher for FailingLauncher {
    fn launch(&self, _input: &StartFiddleInput) -> impl Future<Output = Result<Child>> + Send {
        async { Err(anyhow::anyhow!("electron@99.0.0 is not available")) }
    }
}

/// `/proc/<pid>/stat` state; `None` once the process is reaped
#[cfg(target_os = "linux")]
pub fn process_state(pid: u32) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.trim_start().chars().next())
}
