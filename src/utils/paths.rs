use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{KeygenError, Result};

pub const LEAF_ALIAS: &str = "trayport";
pub const CA_ALIAS: &str = "root-ca";

// Function to get the config directory path
pub fn get_config_dir() -> Result<PathBuf> {
    // Try to get XDG_CONFIG_HOME first (Linux/macOS)
    if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(config_home).join("trayport"));
    }

    // Fall back to platform-specific directories
    if let Some(proj_dirs) = ProjectDirs::from("dev", "trayport", "trayport") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    Err(KeygenError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "Could not determine config directory",
    )))
}

/// Installation record left behind by the installer on platforms without a registry.
#[derive(Debug, Serialize, Deserialize)]
pub struct InstallRecord {
    pub install_path: PathBuf,
}

impl InstallRecord {
    /// A record that cannot be parsed is logged and treated as absent.
    pub fn load(config_dir: &Path) -> Result<Option<Self>> {
        let path = config_dir.join("install.json");
        if !path.exists() {
            return Ok(None);
        }
        match serde_json::from_str(&fs::read_to_string(&path)?) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Ignoring unreadable install record {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }
}

/// Every file the keygen reads or writes below the installation directory.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn auth(&self, file: &str) -> PathBuf {
        self.root.join("auth").join(file)
    }

    pub fn ca_keystore(&self) -> PathBuf {
        self.auth("root-ca.jks")
    }

    pub fn ca_certificate(&self) -> PathBuf {
        self.auth("root-ca.crt")
    }

    pub fn keystore(&self) -> PathBuf {
        self.auth("trayport.jks")
    }

    pub fn csr(&self) -> PathBuf {
        self.auth("trayport.csr")
    }

    pub fn certificate(&self) -> PathBuf {
        self.auth("trayport.crt")
    }

    pub fn pkcs12(&self) -> PathBuf {
        self.auth("trayport.p12")
    }

    pub fn firefox_config_template(&self) -> PathBuf {
        self.auth("firefox").join("firefox-config.cfg")
    }

    pub fn firefox_prefs_template(&self) -> PathBuf {
        self.auth("firefox").join("firefox-prefs.js")
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join("trayport.properties")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = InstallLayout::new("/opt/trayport");
        assert_eq!(
            layout.ca_certificate(),
            Path::new("/opt/trayport/auth/root-ca.crt")
        );
        assert_eq!(layout.keystore(), Path::new("/opt/trayport/auth/trayport.jks"));
        assert_eq!(layout.settings(), Path::new("/opt/trayport/trayport.properties"));
        assert_eq!(
            layout.firefox_prefs_template(),
            Path::new("/opt/trayport/auth/firefox/firefox-prefs.js")
        );
    }

    #[test]
    fn test_install_record_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InstallRecord::load(dir.path()).unwrap().is_none());

        fs::write(
            dir.path().join("install.json"),
            r#"{"install_path": "/opt/trayport"}"#,
        )
        .unwrap();
        let record = InstallRecord::load(dir.path()).unwrap().unwrap();
        assert_eq!(record.install_path, PathBuf::from("/opt/trayport"));
    }

    #[test]
    fn test_corrupt_install_record_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("install.json"), "{\"install_path\": ").unwrap();
        assert!(InstallRecord::load(dir.path()).unwrap().is_none());
    }
}
