//! Lifecycle of the one fiddle process a session may run
//!
//! The controller owns the running fiddle, if any. A watcher task waits on
//! the child and publishes its exit, so a fiddle the user closes by hand is
//! seen as gone without anyone calling `stop`.

use crate::error::CommandError;
use crate::fiddle::runner::FiddleLauncher;
use crate::fiddle::StartFiddleInput;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long an interrupted fiddle gets to exit before it is killed
const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiddleState {
    Idle,
    Running { pid: u32 },
}

/// How a fiddle process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub code: Option<i32>,
    /// Terminating signal, Unix only
    pub signal: Option<i32>,
    /// Ended because the controller stopped it
    pub stopped: bool,
}

impl ExitReport {
    fn from_status(status: Option<ExitStatus>, stopped: bool) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.and_then(|s| s.signal())
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.and_then(|s| s.code()),
            signal,
            stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NothingToStop,
    Stopped { pid: u32, report: Option<ExitReport> },
}

struct RunningFiddle {
    pid: u32,
    input: StartFiddleInput,
    stop_tx: Option<oneshot::Sender<()>>,
    exit_rx: watch::Receiver<Option<ExitReport>>,
    task: JoinHandle<()>,
}

impl RunningFiddle {
    fn exited(&self) -> Option<ExitReport> {
        *self.exit_rx.borrow()
    }
}

pub struct FiddleController<L> {
    launcher: L,
    running: Option<RunningFiddle>,
}

impl<L: FiddleLauncher> FiddleController<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            running: None,
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn state(&self) -> FiddleState {
        match &self.running {
            Some(running) if running.exited().is_none() => {
                FiddleState::Running { pid: running.pid }
            }
            _ => FiddleState::Idle,
        }
    }

    /// Input the current fiddle was started with
    pub fn current(&self) -> Option<&StartFiddleInput> {
        self.running
            .as_ref()
            .filter(|r| r.exited().is_none())
            .map(|r| &r.input)
    }

    /// Drop a fiddle whose process has already exited
    fn reconcile(&mut self) -> Option<ExitReport> {
        let report = self.running.as_ref().and_then(RunningFiddle::exited)?;
        if let Some(running) = self.running.take() {
            debug!(pid = running.pid, ?report, "fiddle exited on its own");
        }
        Some(report)
    }

    /// Launch a fiddle. Refused while another one is running.
    pub async fn start(&mut self, input: StartFiddleInput) -> Result<u32, CommandError> {
        self.reconcile();
        if let Some(running) = &self.running {
            return Err(CommandError::FiddleAlreadyRunning(running.pid));
        }

        let child = self
            .launcher
            .launch(&input)
            .await
            .map_err(CommandError::FiddleStart)?;
        let pid = child.id().ok_or_else(|| {
            CommandError::FiddleStart(anyhow::anyhow!("Fiddle exited during launch"))
        })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = watch::channel(None);
        let task = tokio::spawn(supervise(child, stop_rx, exit_tx));

        info!(pid, source = %input.source, version = %input.electron_version, "fiddle started");
        self.running = Some(RunningFiddle {
            pid,
            input,
            stop_tx: Some(stop_tx),
            exit_rx,
            task,
        });
        Ok(pid)
    }

    /// Interrupt the running fiddle and wait for it to go away
    pub async fn stop(&mut self) -> Result<StopOutcome, CommandError> {
        self.reconcile();
        let Some(mut running) = self.running.take() else {
            return Ok(StopOutcome::NothingToStop);
        };

        if let Some(stop_tx) = running.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        let report = running
            .exit_rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|r| *r);
        if let Err(e) = (&mut running.task).await {
            warn!(error = %e, "fiddle watcher ended abnormally");
        }

        info!(pid = running.pid, ?report, "fiddle stopped");
        Ok(StopOutcome::Stopped {
            pid: running.pid,
            report,
        })
    }

    /// Wait until the running fiddle exits by itself
    pub async fn wait(&mut self) -> Option<ExitReport> {
        let mut exit_rx = self.running.as_ref()?.exit_rx.clone();
        let report = exit_rx.wait_for(Option::is_some).await.ok().and_then(|r| *r);
        self.reconcile();
        report
    }
}

/// Watch the child until it exits or a stop is requested. A dropped stop
/// sender counts as a request, so the fiddle never outlives its controller.
async fn supervise(
    mut child: Child,
    stop_rx: oneshot::Receiver<()>,
    exit_tx: watch::Sender<Option<ExitReport>>,
) {
    let report = tokio::select! {
        status = child.wait() => ExitReport::from_status(status.ok(), false),
        _ = stop_rx => terminate(&mut child).await,
    };
    let _ = exit_tx.send(Some(report));
}

async fn terminate(child: &mut Child) -> ExitReport {
    if let Err(e) = interrupt(child).await {
        debug!(error = %e, "interrupt failed, killing");
    }

    match timeout(STOP_GRACE, child.wait()).await {
        Ok(status) => ExitReport::from_status(status.ok(), true),
        Err(_) => {
            warn!("fiddle ignored interrupt for {:?}, killing", STOP_GRACE);
            let _ = child.kill().await;
            ExitReport::from_status(child.wait().await.ok(), true)
        }
    }
}

/// Ask the fiddle to quit the way Ctrl+C would
#[cfg(unix)]
async fn interrupt(child: &mut Child) -> anyhow::Result<()> {
    use anyhow::Context;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    let status = tokio::process::Command::new("kill")
        .arg("-INT")
        .arg(pid.to_string())
        .status()
        .await
        .context("Failed to run kill")?;
    if !status.success() {
        anyhow::bail!("kill -INT {} exited with {}", pid, status);
    }
    Ok(())
}

#[cfg(not(unix))]
async fn interrupt(child: &mut Child) -> anyhow::Result<()> {
    child.start_kill()?;
    Ok(())
}
