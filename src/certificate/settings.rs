use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{report, StepOutcome};
use crate::error::Result;
use crate::utils::secret::Secrets;

/// Address the websocket server binds to.
pub const BIND_ADDRESS: &str = "0.0.0.0";

/// `wss.*` properties the tray service reads on startup.
#[derive(Debug)]
pub struct OperationalSettings<'a> {
    pub alias: &'a str,
    pub keystore: PathBuf,
    pub secrets: &'a Secrets,
}

// Java properties treat backslash as an escape
fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

impl OperationalSettings<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("wss.alias={}\n", self.alias));
        out.push_str(&format!("wss.keystore={}\n", escape_path(&self.keystore)));
        out.push_str(&format!("wss.keypass={}\n", self.secrets.key_password));
        out.push_str(&format!("wss.storepass={}\n", self.secrets.store_password));
        out.push_str(&format!("wss.host={}\n", BIND_ADDRESS));
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        info!("Writing {}...", path.display());
        if let Err(e) = fs::write(path, self.render()) {
            report(StepOutcome::Failed, format!("Error writing: {}", path.display()));
            return Err(e.into());
        }

        // Holds the keystore passwords in plain text
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        report(
            StepOutcome::Success,
            format!("Writing SSL properties file: {}", path.display()),
        );
        Ok(())
    }
}
