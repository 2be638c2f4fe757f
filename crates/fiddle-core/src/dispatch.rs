//! Command dispatch
//!
//! `Extension` is the single entry point for the four commands. It is
//! activated with a workspace and the two process seams, registers the
//! commands under their fixed identifiers, runs one command at a time to
//! completion and reports every outcome as a [`Notice`].

use crate::config::ResolvedConfig;
use crate::error::CommandError;
use crate::fiddle::{
    ExitReport, FiddleController, FiddleLauncher, FiddleState, Runner, StartFiddleInput,
    StopOutcome,
};
use crate::product::ProductConfig;
use crate::project::{
    locate_project, scaffold_project, switch_version, CreateProjectInput, ScaffoldedProject,
    SwitchVersionInput, VersionSwitch, Workspace,
};
use crate::runtime::{InstallRequest, NpmInstaller, PackageInstaller};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// The commands the extension registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    CreateProject,
    ChangeVersion,
    StartFiddle,
    StopFiddle,
}

impl CommandId {
    pub const ALL: [CommandId; 4] = [
        CommandId::CreateProject,
        CommandId::ChangeVersion,
        CommandId::StartFiddle,
        CommandId::StopFiddle,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            CommandId::CreateProject => "extension.createElectronTemplate",
            CommandId::ChangeVersion => "extension.changeElectronVersion",
            CommandId::StartFiddle => "extension.startFiddle",
            CommandId::StopFiddle => "extension.stopFiddle",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            CommandId::CreateProject => "Create Electron Template",
            CommandId::ChangeVersion => "Change Electron Version",
            CommandId::StartFiddle => "Start Fiddle",
            CommandId::StopFiddle => "Stop Fiddle",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.identifier() == identifier)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A command together with the input its prompts produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    CreateProject(CreateProjectInput),
    ChangeVersion(SwitchVersionInput),
    StartFiddle(StartFiddleInput),
    StopFiddle,
}

impl Invocation {
    pub fn command(&self) -> CommandId {
        match self {
            Invocation::CreateProject(_) => CommandId::CreateProject,
            Invocation::ChangeVersion(_) => CommandId::ChangeVersion,
            Invocation::StartFiddle(_) => CommandId::StartFiddle,
            Invocation::StopFiddle => CommandId::StopFiddle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl From<&CommandError> for Notice {
    fn from(err: &CommandError) -> Self {
        Self {
            level: err.level(),
            text: err.to_string(),
        }
    }
}

/// Where notices go: the terminal in the binary, a recorder in tests
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// A registered command; released on deactivation
#[derive(Debug)]
pub struct Registration {
    command: CommandId,
}

impl Registration {
    pub fn command(&self) -> CommandId {
        self.command
    }
}

/// What a successful command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Created {
        project: ScaffoldedProject,
        installed: bool,
    },
    Switched {
        switch: VersionSwitch,
        installed: bool,
    },
    Started {
        pid: u32,
    },
    Stopped(StopOutcome),
}

pub struct Extension<I, L> {
    workspace: Workspace,
    installer: I,
    fiddles: FiddleController<L>,
    registrations: Vec<Registration>,
    skip_install: bool,
}

/// The extension wired to npm and real Electron installs
pub type StandardExtension = Extension<NpmInstaller, Runner<NpmInstaller>>;

impl StandardExtension {
    pub fn standard<C: ProductConfig>(
        config: &C,
        resolved: &ResolvedConfig,
        workspace: Workspace,
    ) -> Self {
        let runner = Runner::new(resolved.paths.clone(), config.user_agent()).inherit_stdio(true);
        Extension::activate(workspace, NpmInstaller::new().echo(true), runner)
    }
}

impl<I: PackageInstaller, L: FiddleLauncher> Extension<I, L> {
    /// Register every command; the extension is ready once this returns
    pub fn activate(workspace: Workspace, installer: I, launcher: L) -> Self {
        let registrations: Vec<Registration> = CommandId::ALL
            .into_iter()
            .map(|command| Registration { command })
            .collect();
        debug!(
            workspace = ?workspace,
            commands = ?registrations.iter().map(|r| r.command.identifier()).collect::<Vec<_>>(),
            "extension activated"
        );

        Self {
            workspace,
            installer,
            fiddles: FiddleController::new(launcher),
            registrations,
            skip_install: false,
        }
    }

    /// Leave dependency installation to the user
    pub fn skip_install(mut self, skip: bool) -> Self {
        self.skip_install = skip;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn registered(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.registrations.iter().map(Registration::command)
    }

    /// Look up a registered command by identifier
    pub fn resolve(&self, identifier: &str) -> Result<CommandId, CommandError> {
        CommandId::from_identifier(identifier)
            .filter(|id| self.registered().any(|r| r == *id))
            .ok_or_else(|| CommandError::UnknownCommand(identifier.to_string()))
    }

    pub fn fiddle_state(&self) -> FiddleState {
        self.fiddles.state()
    }

    pub fn current_fiddle(&self) -> Option<&StartFiddleInput> {
        self.fiddles.current()
    }

    /// Block until the running fiddle exits on its own
    pub async fn wait_fiddle(&mut self) -> Option<ExitReport> {
        self.fiddles.wait().await
    }

    /// Run one command to completion. Progress and success go to `notifier`;
    /// the failure, if any, is returned for the caller to report.
    pub async fn execute<N: Notifier + ?Sized>(
        &mut self,
        invocation: Invocation,
        notifier: &N,
    ) -> Result<CommandOutcome, CommandError> {
        let command = invocation.command();
        if !self.registered().any(|r| r == command) {
            return Err(CommandError::UnknownCommand(command.identifier().to_string()));
        }
        debug!(%command, "executing");

        match invocation {
            Invocation::CreateProject(input) => self.create_project(input, notifier).await,
            Invocation::ChangeVersion(input) => self.change_version(input, notifier).await,
            Invocation::StartFiddle(input) => self.start_fiddle(input, notifier).await,
            Invocation::StopFiddle => self.stop_fiddle(notifier).await,
        }
    }

    /// Like [`execute`](Self::execute), with the failure reported as a notice
    pub async fn invoke<N: Notifier + ?Sized>(
        &mut self,
        invocation: Invocation,
        notifier: &N,
    ) -> Option<CommandOutcome> {
        let command = invocation.command();
        match self.execute(invocation, notifier).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(%command, error = %err, "command failed");
                notifier.notify(Notice::from(&err));
                None
            }
        }
    }

    /// Stop any running fiddle and release the registrations
    pub async fn deactivate(mut self) -> Result<StopOutcome, CommandError> {
        let outcome = self.fiddles.stop().await?;
        self.registrations.clear();
        debug!(?outcome, "extension deactivated");
        Ok(outcome)
    }

    async fn install_project(&self, dir: &Path) -> Result<(), String> {
        match self.installer.install(&InstallRequest::project(dir)).await {
            Ok(outcome) if outcome.success => Ok(()),
            Ok(outcome) => Err(outcome.stderr.trim().to_string()),
            Err(e) => Err(format!("{:#}", e)),
        }
    }

    async fn create_project<N: Notifier + ?Sized>(
        &mut self,
        input: CreateProjectInput,
        notifier: &N,
    ) -> Result<CommandOutcome, CommandError> {
        let project = scaffold_project(&self.workspace, &input).await?;
        info!(dir = %project.dir.display(), files = ?project.files, "project scaffolded");

        if self.skip_install {
            notifier.notify(Notice::info(format!(
                "Electron template created in \"{}\". Run \"npm install\" and then \"npm start\" to launch.",
                project.name
            )));
            return Ok(CommandOutcome::Created {
                project,
                installed: false,
            });
        }

        notifier.notify(Notice::info(format!(
            "Initializing Electron project in \"{}\"... Installing dependencies...",
            project.name
        )));
        self.install_project(&project.dir)
            .await
            .map_err(CommandError::DependencyInstall)?;

        notifier.notify(Notice::info(format!(
            "Electron template created successfully in \"{}\"! Run \"npm start\" to launch.",
            project.name
        )));
        Ok(CommandOutcome::Created {
            project,
            installed: true,
        })
    }

    async fn change_version<N: Notifier + ?Sized>(
        &mut self,
        input: SwitchVersionInput,
        notifier: &N,
    ) -> Result<CommandOutcome, CommandError> {
        let dir = locate_project(&self.workspace, &input.project)?;
        let version = input.version.ok_or(CommandError::NoVersionSelected)?;

        let switch = switch_version(&dir, &version).await?;
        if self.skip_install {
            notifier.notify(Notice::info(format!(
                "Electron version set to {} in package.json. Run \"npm install\" to apply it.",
                switch.current
            )));
            return Ok(CommandOutcome::Switched {
                switch,
                installed: false,
            });
        }

        notifier.notify(Notice::info(format!("Installing Electron {}...", switch.current)));
        self.install_project(&dir)
            .await
            .map_err(CommandError::ElectronInstall)?;

        notifier.notify(Notice::info(format!(
            "Electron version {} installed successfully!",
            switch.current
        )));
        Ok(CommandOutcome::Switched {
            switch,
            installed: true,
        })
    }

    async fn start_fiddle<N: Notifier + ?Sized>(
        &mut self,
        input: StartFiddleInput,
        notifier: &N,
    ) -> Result<CommandOutcome, CommandError> {
        if input.source.trim().is_empty() {
            return Err(CommandError::NoFiddleSource);
        }

        let pid = self.fiddles.start(input).await?;
        notifier.notify(Notice::info("Fiddle started successfully."));
        Ok(CommandOutcome::Started { pid })
    }

    async fn stop_fiddle<N: Notifier + ?Sized>(
        &mut self,
        notifier: &N,
    ) -> Result<CommandOutcome, CommandError> {
        let outcome = self.fiddles.stop().await?;
        let text = match outcome {
            StopOutcome::NothingToStop => "No running fiddle to stop.",
            StopOutcome::Stopped { .. } => "Fiddle stopped successfully.",
        };
        notifier.notify(Notice::info(text));
        Ok(CommandOutcome::Stopped(outcome))
    }
}
