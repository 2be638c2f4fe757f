//! CLI prompts and the interactive session using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

mod notifier;
pub mod prompts;
mod session;

pub use notifier::TerminalNotifier;
pub use session::{
    close_session, handle_toolchain_check, run_command, run_session, CommandArgs,
};
