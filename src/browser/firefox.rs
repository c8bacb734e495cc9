//! Firefox keeps its own certificate database, so the CA is pushed in through
//! an AutoConfig script that Firefox runs on startup.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::command::{report, StepOutcome};
use crate::error::Result;
use crate::utils::registry::Registry;

const FIREFOX_REG_KEY: &str = "HKLM\\Software\\Mozilla\\Mozilla Firefox";
const CONFIG_FILE: &str = "firefox-config.cfg";
const PREFS_FILE: &str = "firefox-prefs.js";

/// Preference keys that mean someone else already owns AutoConfig.
pub const CONFLICT_KEYS: &[&str] = &["general.config.filename"];
/// Preference files we deploy ourselves and so never count as a conflict.
pub const WHITELIST: &[&str] = &[PREFS_FILE];

pub const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../../assets/firefox/firefox-config.cfg");
pub const DEFAULT_PREFS: &str = include_str!("../../assets/firefox/firefox-prefs.js");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirefoxProfile {
    pub executable: PathBuf,
    pub config_file: PathBuf,
    pub preference_file: PathBuf,
    pub version: Option<String>,
}

impl FirefoxProfile {
    pub fn from_executable(executable: PathBuf, version: Option<String>) -> Self {
        let dir = executable
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            config_file: dir.join(CONFIG_FILE),
            preference_file: dir.join("defaults").join("pref").join(PREFS_FILE),
            executable,
            version,
        }
    }

    pub fn preference_dir(&self) -> &Path {
        self.preference_file.parent().unwrap_or(Path::new(""))
    }
}

/// Find Firefox: portable override first, then release, then ESR from the registry.
pub fn locate(registry: &dyn Registry, portable: Option<&Path>) -> Option<FirefoxProfile> {
    info!("Searching for Firefox...");

    if let Some(portable) = portable {
        let exe = portable.join("App").join("Firefox").join("firefox.exe");
        report(StepOutcome::Success, format!("Using portable Firefox {}", exe.display()));
        return Some(FirefoxProfile::from_executable(exe, None));
    }

    let version = registry.value(FIREFOX_REG_KEY, None).or_else(|| {
        registry
            .value(&format!("{FIREFOX_REG_KEY} ESR"), None)
            .map(|v| format!("{v} ESR"))
    });
    let Some(version) = version else {
        report(StepOutcome::Skipped, "Firefox was not detected");
        return None;
    };
    report(StepOutcome::Success, format!("Found Firefox {}", version));

    // e.g. "C:\Program Files\Mozilla Firefox\firefox.exe"
    let Some(exe) = registry.value(&format!("{FIREFOX_REG_KEY} {version}\\bin"), Some("PathToExe"))
    else {
        report(StepOutcome::Skipped, format!("No executable registered for Firefox {}", version));
        return None;
    };

    Some(FirefoxProfile::from_executable(PathBuf::from(exe), Some(version)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefConflict {
    pub file: PathBuf,
    pub line_number: usize,
    pub line: String,
}

fn find_conflict_in_file(path: &Path) -> Option<PrefConflict> {
    let contents = match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Unable to read {}: {}", path.display(), e);
            return None;
        }
    };

    contents.lines().enumerate().find_map(|(i, line)| {
        let hit = CONFLICT_KEYS.iter().any(|key| {
            line.contains(&format!("'{key}'")) || line.contains(&format!("\"{key}\""))
        });
        hit.then(|| PrefConflict {
            file: path.to_path_buf(),
            line_number: i + 1,
            line: line.to_string(),
        })
    })
}

/// Look through default preference files for an AutoConfig rule that isn't ours.
pub fn find_conflict(pref_dir: &Path) -> Option<PrefConflict> {
    info!("Searching for Firefox AutoConfig conflicts...");

    let entries = match fs::read_dir(pref_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Unable to list {}: {}", pref_dir.display(), e);
            report(StepOutcome::Success, "No conflicts found");
            return None;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if WHITELIST.contains(&name.as_str()) {
            report(StepOutcome::Skipped, format!("Trayport preference file: {}", name));
            continue;
        }
        if let Some(conflict) = find_conflict_in_file(&path) {
            report(
                StepOutcome::Failed,
                format!(
                    "Conflict found in {} on line {}: \"{}\"",
                    name, conflict.line_number, conflict.line
                ),
            );
            return Some(conflict);
        }
    }

    report(StepOutcome::Success, "No conflicts found");
    None
}

/// Named values substituted into the AutoConfig template.
#[derive(Debug, Clone)]
pub struct TemplateValues {
    pub cert_data: String,
    pub uninstall: bool,
    pub timestamp: i64,
    pub common_name: String,
}

impl TemplateValues {
    pub fn install(cert_data: String, common_name: &str) -> Self {
        let now = time::OffsetDateTime::now_utc();
        Self {
            cert_data,
            uninstall: false,
            timestamp: (now.unix_timestamp_nanos() / 1_000_000) as i64,
            common_name: common_name.to_string(),
        }
    }

    pub fn uninstall(common_name: &str) -> Self {
        Self {
            cert_data: String::new(),
            uninstall: true,
            timestamp: -1,
            common_name: common_name.to_string(),
        }
    }

    fn pairs(&self) -> [(&'static str, String); 4] {
        [
            ("${certData}", self.cert_data.clone()),
            ("${uninstall}", self.uninstall.to_string()),
            ("${timestamp}", self.timestamp.to_string()),
            ("${commonName}", self.common_name.clone()),
        ]
    }
}

pub fn render(template: &str, values: &TemplateValues) -> String {
    let pairs = values.pairs();
    let mut out = String::with_capacity(template.len() + values.cert_data.len());
    for line in template.lines() {
        let rendered = pairs
            .iter()
            .fold(line.to_string(), |acc, (key, value)| acc.replace(key, value));
        out.push_str(&rendered);
        out.push('\n');
    }
    out
}

/// Base64 body of a PEM certificate, without armor lines or line breaks.
pub fn plain_certificate(pem: &str) -> String {
    pem.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .collect()
}

pub fn write_config(template: &str, values: &TemplateValues, profile: &FirefoxProfile) -> Result<()> {
    if let Some(dir) = profile.config_file.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&profile.config_file, render(template, values))?;
    let exists = profile.config_file.exists();
    report(
        if exists { StepOutcome::Success } else { StepOutcome::Failed },
        "Checking Firefox config exists",
    );
    Ok(())
}

pub fn write_preferences(prefs: &str, profile: &FirefoxProfile) -> Result<()> {
    fs::create_dir_all(profile.preference_dir())?;
    fs::write(&profile.preference_file, prefs)?;
    report(
        StepOutcome::Success,
        format!("Writing Firefox preference file: {}", profile.preference_file.display()),
    );
    Ok(())
}
