//! Electron Fiddle CLI - Electron project scaffolding and fiddle runner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fiddle_core::releases::IndexOrigin;
use fiddle_core::tui::{close_session, handle_toolchain_check};
use fiddle_core::{
    run_command, run_session, CommandArgs, CommandId, CommandOutcome, ProductConfig, ReleaseFetcher,
    ResolvedConfig, Settings, StandardExtension, Workspace,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Electron Fiddle product configuration
#[derive(Clone)]
pub struct ElectronConfig;

impl ProductConfig for ElectronConfig {
    fn name(&self) -> &'static str {
        "electron-fiddle"
    }

    fn display_name(&self) -> &'static str {
        "Electron Fiddle"
    }

    fn default_releases_url(&self) -> &'static str {
        "https://releases.electronjs.org/releases.json"
    }

    fn releases_url_env(&self) -> &'static str {
        "ELECTRON_FIDDLE_RELEASES_URL"
    }

    fn home_env(&self) -> &'static str {
        "ELECTRON_FIDDLE_HOME"
    }

    fn settings_env(&self) -> &'static str {
        "ELECTRON_FIDDLE_CONFIG"
    }

    fn default_fiddle_version(&self) -> &'static str {
        "35.0.0"
    }

    fn next_steps(&self, dir: &Path, installed: bool) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        if current.as_deref() != Some(dir) {
            steps.push(format!("cd {}", dir.display()));
        }

        if !installed {
            steps.push("npm install".to_string());
        }

        steps.push("npm start".to_string());
        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "electron-fiddle")]
#[command(about = "Scaffold Electron projects, switch their Electron version and run fiddles")]
#[command(version)]
pub struct Args {
    /// Folder to work in (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Release index URL or file (overrides ELECTRON_FIDDLE_RELEASES_URL and the settings file)
    #[arg(long = "releases-url", global = true)]
    pub releases_url: Option<String>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Electron project in the workspace
    Create(CreateArgs),
    /// Switch the Electron version a project is pinned to
    Switch(SwitchArgs),
    /// List Electron releases, newest first
    Versions(VersionsArgs),
    /// Run a fiddle in the foreground until it exits
    Start(StartArgs),
    /// Interactive command palette (default)
    Session,
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Folder name for the project
    pub name: Option<String>,

    /// Write the files without running npm install
    #[arg(long = "skip-install")]
    pub skip_install: bool,
}

#[derive(Parser, Debug)]
pub struct SwitchArgs {
    /// Version or dist tag to pin (prompted for when omitted)
    pub version: Option<String>,

    /// Project folder under the workspace
    #[arg(short, long)]
    pub project: Option<String>,

    /// Offer prereleases in the picker
    #[arg(long)]
    pub prereleases: bool,

    /// Rewrite package.json without running npm install
    #[arg(long = "skip-install")]
    pub skip_install: bool,
}

#[derive(Parser, Debug)]
pub struct VersionsArgs {
    /// Include alpha, beta and nightly releases
    #[arg(long)]
    pub prereleases: bool,

    /// How many versions to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Parser, Debug)]
pub struct StartArgs {
    /// Fiddle folder, gist id/URL or GitHub repository URL (`#branch` selects a branch)
    pub source: Option<String>,

    /// Electron version to run the fiddle with
    #[arg(short, long = "electron")]
    pub electron: Option<String>,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Settings file and env, with command-line flags on top
fn resolve_config(config: &ElectronConfig, args: &Args) -> Result<ResolvedConfig> {
    let settings = Settings::load(config)?;
    let mut resolved = ResolvedConfig::resolve(config, &settings)?;

    if let Some(url) = &args.releases_url {
        resolved.releases_url = url.clone();
    }
    if let Some(Command::Switch(switch)) = &args.command {
        resolved.include_prereleases |= switch.prereleases;
    }

    tracing::debug!(?resolved, "configuration resolved");
    Ok(resolved)
}

fn open_workspace(args: &Args) -> Result<Workspace> {
    let root = match &args.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    Ok(Workspace::open(root))
}

fn exit_code(outcome: &Option<CommandOutcome>) -> ExitCode {
    if outcome.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn list_versions(
    config: &ElectronConfig,
    resolved: &ResolvedConfig,
    args: &VersionsArgs,
) -> Result<ExitCode> {
    let index = ReleaseFetcher::from_config(config, resolved).fetch().await?;
    if index.origin() == IndexOrigin::Cache {
        eprintln!("warning: release index unreachable, showing cached releases");
    }

    let include_prereleases = args.prereleases || resolved.include_prereleases;
    for version in index.versions(include_prereleases).into_iter().take(args.limit) {
        println!("{}", version);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = ElectronConfig;
    let resolved = resolve_config(&config, &args)?;
    let workspace = open_workspace(&args)?;
    resolved.paths.ensure_dirs().await?;

    match args.command {
        Some(Command::Create(create)) => {
            let mut extension = StandardExtension::standard(&config, &resolved, workspace)
                .skip_install(create.skip_install);
            cliclack::intro(config.display_name())?;
            if !create.skip_install && !handle_toolchain_check(&config)? {
                cliclack::outro("Install Node.js and run this command again.")?;
                return Ok(ExitCode::FAILURE);
            }

            let command_args = CommandArgs {
                name: create.name,
                ..CommandArgs::default()
            };
            let outcome = run_command(
                &config,
                &resolved,
                &mut extension,
                CommandId::CreateProject,
                &command_args,
            )
            .await?;
            cliclack::outro("Happy hacking!")?;
            Ok(exit_code(&outcome))
        }
        Some(Command::Switch(switch)) => {
            let mut extension = StandardExtension::standard(&config, &resolved, workspace)
                .skip_install(switch.skip_install);
            cliclack::intro(config.display_name())?;

            let command_args = CommandArgs {
                project: switch.project,
                version: switch.version,
                ..CommandArgs::default()
            };
            let outcome = run_command(
                &config,
                &resolved,
                &mut extension,
                CommandId::ChangeVersion,
                &command_args,
            )
            .await?;
            cliclack::outro("Done")?;
            Ok(exit_code(&outcome))
        }
        Some(Command::Versions(versions)) => list_versions(&config, &resolved, &versions).await,
        Some(Command::Start(start)) => {
            let mut extension = StandardExtension::standard(&config, &resolved, workspace);
            cliclack::intro(config.display_name())?;

            let command_args = CommandArgs {
                source: start.source,
                version: start.electron,
                ..CommandArgs::default()
            };
            let outcome = run_command(
                &config,
                &resolved,
                &mut extension,
                CommandId::StartFiddle,
                &command_args,
            )
            .await;
            let pid = match outcome {
                Ok(Some(CommandOutcome::Started { pid })) => pid,
                Ok(_) => return close_session(extension, Ok(ExitCode::FAILURE)).await,
                Err(e) => return close_session(extension, Err(e)).await,
            };

            let waited = match cliclack::log::info(format!(
                "Fiddle running (pid {}). Press Ctrl+C to stop.",
                pid
            )) {
                Ok(()) => Ok(extension.wait_fiddle().await),
                Err(e) => Err(e.into()),
            };
            let report = close_session(extension, waited).await?;

            match report.and_then(|r| r.code) {
                Some(code) => cliclack::outro(format!("Fiddle exited with code {}", code))?,
                None => cliclack::outro("Fiddle exited")?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Session) | None => {
            let extension = StandardExtension::standard(&config, &resolved, workspace);
            run_session(&config, &resolved, extension).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully; a foreground fiddle gets the same SIGINT from the terminal
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    init_tracing(args.verbose);
    tracing::debug!(version = CLI_VERSION, "starting");

    let result = run(args).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}
