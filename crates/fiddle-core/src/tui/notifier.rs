//! Notices rendered through cliclack's log API

use crate::dispatch::{Notice, NoticeLevel, Notifier};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let shown = match notice.level {
            NoticeLevel::Info => cliclack::log::info(&notice.text),
            NoticeLevel::Warning => cliclack::log::warning(&notice.text),
            NoticeLevel::Error => cliclack::log::error(&notice.text),
        };
        if let Err(e) = shown {
            debug!(error = %e, text = %notice.text, "failed to render notice");
        }
    }
}
