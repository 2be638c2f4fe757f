//! Command flows and the interactive command palette

use crate::config::ResolvedConfig;
use crate::dispatch::{CommandId, CommandOutcome, Extension, Invocation, Notice, Notifier};
use crate::fiddle::{FiddleLauncher, FiddleState, StartFiddleInput, StopOutcome};
use crate::product::ProductConfig;
use crate::project::{locate_project, CreateProjectInput, SwitchVersionInput};
use crate::releases::ReleaseFetcher;
use crate::runtime::{check_toolchain, PackageInstaller};
use crate::tui::notifier::TerminalNotifier;
use crate::tui::prompts;
use anyhow::Result;
use tracing::debug;

const QUIT: &str = "quit";

/// Values given on the command line; anything missing is prompted for
#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
    /// Folder to create
    pub name: Option<String>,
    /// Project whose Electron version is switched
    pub project: Option<String>,
    pub version: Option<String>,
    /// Fiddle folder, gist or repository
    pub source: Option<String>,
}

/// Check for Node.js and npm. Returns false when the user would rather install
/// them first.
pub fn handle_toolchain_check<C: ProductConfig>(config: &C) -> Result<bool> {
    let spinner = cliclack::spinner();
    spinner.start("Checking for Node.js and npm...");

    match check_toolchain() {
        Ok(tools) => {
            let found: Vec<String> = tools
                .iter()
                .map(|t| format!("{} ({})", t.name, t.version.as_deref().unwrap_or("unknown")))
                .collect();
            spinner.stop(format!("Detected {}", found.join(", ")));
            Ok(true)
        }
        Err(e) => {
            spinner.stop("Missing tools");
            cliclack::log::warning(format!("{:#}", e))?;

            let action: &str = cliclack::select("What would you like to do?")
                .item(
                    "download",
                    format!("Open the Node.js download page ({})", config.node_download_url()),
                    "",
                )
                .item("skip", "Continue anyway", "installs and fiddles will fail")
                .interact()?;

            if action == "download" {
                if let Err(e) = open::that(config.node_download_url()) {
                    cliclack::log::error(format!("Failed to open browser: {}", e))?;
                }
                return Ok(false);
            }
            Ok(true)
        }
    }
}

/// Build the invocation for `command`, prompting for whatever `args` lacks
async fn build_invocation<C, I, L>(
    config: &C,
    resolved: &ResolvedConfig,
    extension: &Extension<I, L>,
    command: CommandId,
    args: &CommandArgs,
) -> Result<Invocation>
where
    C: ProductConfig,
    I: PackageInstaller,
    L: FiddleLauncher,
{
    let invocation = match command {
        CommandId::CreateProject => {
            let name = match &args.name {
                Some(name) => name.clone(),
                None => prompts::folder_name(config.default_project_name())?.unwrap_or_default(),
            };
            Invocation::CreateProject(CreateProjectInput::new(name))
        }
        CommandId::ChangeVersion => {
            let project = match &args.project {
                Some(project) => project.clone(),
                None => prompts::project_name(config.default_project_name())?.unwrap_or_default(),
            };

            // A missing project is reported by the command itself, before any picker
            let version = match &args.version {
                Some(version) => Some(version.clone()),
                None if locate_project(extension.workspace(), &project).is_err() => None,
                None => {
                    let spinner = cliclack::spinner();
                    spinner.start("Fetching Electron releases...");
                    match ReleaseFetcher::from_config(config, resolved).fetch().await {
                        Ok(index) => {
                            spinner.stop(format!("{} releases available", index.len()));
                            prompts::pick_version(&index, resolved.include_prereleases)?
                        }
                        Err(e) => {
                            spinner.stop("Could not load releases");
                            cliclack::log::warning(format!("{:#}", e))?;
                            prompts::typed_version("latest")?
                        }
                    }
                }
            };
            Invocation::ChangeVersion(SwitchVersionInput::new(project, version))
        }
        CommandId::StartFiddle => {
            let source = match &args.source {
                Some(source) => source.clone(),
                None => prompts::fiddle_source()?.unwrap_or_default(),
            };
            let version = match &args.version {
                Some(version) => version.clone(),
                None if source.trim().is_empty() => resolved.fiddle_version.clone(),
                None => prompts::fiddle_version(&resolved.fiddle_version)?
                    .unwrap_or_else(|| resolved.fiddle_version.clone()),
            };
            Invocation::StartFiddle(StartFiddleInput::new(source, version))
        }
        CommandId::StopFiddle => Invocation::StopFiddle,
    };
    Ok(invocation)
}

/// Run one command the way the palette would: prompt, invoke, report
pub async fn run_command<C, I, L>(
    config: &C,
    resolved: &ResolvedConfig,
    extension: &mut Extension<I, L>,
    command: CommandId,
    args: &CommandArgs,
) -> Result<Option<CommandOutcome>>
where
    C: ProductConfig,
    I: PackageInstaller,
    L: FiddleLauncher,
{
    let invocation = build_invocation(config, resolved, extension, command, args).await?;
    let outcome = extension.invoke(invocation, &TerminalNotifier).await;

    if let Some(CommandOutcome::Created { project, installed }) = &outcome {
        print_next_steps(config, &project.dir, *installed);
    }
    Ok(outcome)
}

fn print_next_steps<C: ProductConfig>(config: &C, dir: &std::path::Path, installed: bool) {
    let steps = config.next_steps(dir, installed);
    if steps.is_empty() {
        return;
    }

    println!();
    println!("  Next steps");
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }
    println!();
}

fn palette_hint(
    command: CommandId,
    state: FiddleState,
    current: Option<&StartFiddleInput>,
) -> String {
    match (command, state, current) {
        (CommandId::StartFiddle, FiddleState::Running { .. }, _) => {
            "a fiddle is running".to_string()
        }
        (CommandId::StopFiddle, FiddleState::Running { pid }, Some(input)) => {
            format!("pid {}, {} on Electron {}", pid, input.source, input.electron_version)
        }
        (CommandId::StopFiddle, FiddleState::Running { pid }, None) => format!("pid {}", pid),
        _ => command.identifier().to_string(),
    }
}

/// Deactivate the extension whatever `result` holds, so no fiddle outlives
/// the command that started it
pub async fn close_session<I, L, T>(extension: Extension<I, L>, result: Result<T>) -> Result<T>
where
    I: PackageInstaller,
    L: FiddleLauncher,
{
    match extension.deactivate().await {
        Ok(StopOutcome::Stopped { pid, .. }) => {
            if let Err(e) = cliclack::log::info(format!("Stopped fiddle (pid {})", pid)) {
                debug!(error = %e, pid, "failed to report stopped fiddle");
            }
        }
        Ok(StopOutcome::NothingToStop) => {}
        Err(e) => TerminalNotifier.notify(Notice::from(&e)),
    }
    result
}

async fn palette_loop<C, I, L>(
    config: &C,
    resolved: &ResolvedConfig,
    extension: &mut Extension<I, L>,
) -> Result<()>
where
    C: ProductConfig,
    I: PackageInstaller,
    L: FiddleLauncher,
{
    loop {
        let state = extension.fiddle_state();
        let commands: Vec<CommandId> = extension.registered().collect();

        let mut palette = cliclack::select("Run a command");
        for command in &commands {
            palette = palette.item(
                command.identifier(),
                command.title(),
                palette_hint(*command, state, extension.current_fiddle()),
            );
        }
        palette = palette.item(QUIT, "Quit", "");

        let choice = match palette.interact() {
            Ok(choice) => choice,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => QUIT,
            Err(e) => return Err(e.into()),
        };

        if choice == QUIT {
            if let FiddleState::Running { pid } = extension.fiddle_state() {
                let prompt = format!("Fiddle (pid {}) is still running. Stop it and quit?", pid);
                if !prompts::confirm(&prompt, true)? {
                    continue;
                }
            }
            return Ok(());
        }

        match extension.resolve(choice) {
            Ok(command) => {
                let args = CommandArgs::default();
                run_command(config, resolved, extension, command, &args).await?;
            }
            Err(e) => TerminalNotifier.notify(Notice::from(&e)),
        }
    }
}

/// The command palette: pick a command, run it, repeat until quit.
/// Leaving the session, even on an error, deactivates the extension and so
/// stops any running fiddle.
pub async fn run_session<C, I, L>(
    config: &C,
    resolved: &ResolvedConfig,
    mut extension: Extension<I, L>,
) -> Result<()>
where
    C: ProductConfig,
    I: PackageInstaller,
    L: FiddleLauncher,
{
    cliclack::intro(config.display_name())?;

    if !extension.workspace().is_open() {
        cliclack::log::warning("No folder is open; project commands will ask you to open one.")?;
    }

    if !handle_toolchain_check(config)? {
        cliclack::outro(format!(
            "After installing Node.js, run {} again.",
            config.name()
        ))?;
        return Ok(());
    }

    let result = palette_loop(config, resolved, &mut extension).await;
    close_session(extension, result).await?;

    cliclack::outro("Happy hacking!")?;
    Ok(())
}
