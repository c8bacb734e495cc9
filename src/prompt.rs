use std::env;
use tracing::warn;

/// Environment variable that switches dialogs to log lines for unattended installs.
pub const SILENT_ENV: &str = "TRAYPORT_SILENT";

pub trait Prompt {
    /// Show a warning the user has to acknowledge.
    fn warn(&self, title: &str, message: &str);
}

pub struct ConsolePrompt {
    silent: bool,
}

impl ConsolePrompt {
    pub fn new(silent: bool) -> Self {
        Self { silent }
    }

    pub fn from_env() -> Self {
        let silent = env::var_os(SILENT_ENV).is_some_and(|v| !v.is_empty());
        Self::new(silent)
    }
}

impl Prompt for ConsolePrompt {
    fn warn(&self, title: &str, message: &str) {
        if self.silent {
            warn!("{}", message);
            return;
        }

        let rule = "=".repeat(title.len().max(20));
        eprintln!("\n{rule}\n{title}\n{rule}\n{message}\n");
    }
}
