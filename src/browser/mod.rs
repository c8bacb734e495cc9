pub mod firefox;

use std::fs;
use std::path::Path;
use tracing::info;

use crate::context::RunContext;
use crate::error::{KeygenError, Result};
use crate::utils::paths::InstallLayout;
use firefox::{FirefoxProfile, PrefConflict, TemplateValues};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserStatus {
    NotFound,
    Found(FirefoxProfile),
    /// An enterprise AutoConfig already exists; we leave Firefox alone
    Conflict(FirefoxProfile, PrefConflict),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserOutcome {
    NotFound,
    Conflict(PrefConflict),
    Installed,
    Removed,
}

fn template_or(path: Option<&Path>, builtin: &str) -> Result<String> {
    match path {
        Some(path) if path.exists() => Ok(fs::read_to_string(path)?),
        Some(path) => {
            info!("{} not found, using built-in template", path.display());
            Ok(builtin.to_string())
        }
        None => Ok(builtin.to_string()),
    }
}

pub struct BrowserIntegration<'c, 'a> {
    ctx: &'c RunContext<'a>,
    layout: Option<&'c InstallLayout>,
}

impl<'c, 'a> BrowserIntegration<'c, 'a> {
    pub fn new(ctx: &'c RunContext<'a>, layout: Option<&'c InstallLayout>) -> Self {
        Self { ctx, layout }
    }

    fn locate(&self) -> Option<FirefoxProfile> {
        firefox::locate(self.ctx.registry, self.ctx.firefox_override.as_deref())
    }

    /// Locate Firefox and check its default preferences for a competing AutoConfig.
    pub fn detect(&self) -> BrowserStatus {
        let Some(profile) = self.locate() else {
            return BrowserStatus::NotFound;
        };
        match firefox::find_conflict(profile.preference_dir()) {
            Some(conflict) => BrowserStatus::Conflict(profile, conflict),
            None => BrowserStatus::Found(profile),
        }
    }

    pub fn install(&self) -> Result<BrowserOutcome> {
        let profile = match self.detect() {
            BrowserStatus::NotFound => return Ok(BrowserOutcome::NotFound),
            BrowserStatus::Conflict(_, conflict) => {
                self.ctx.prompt.warn(
                    "Firefox AutoConfig Warning",
                    "WARNING: Trayport installation would conflict with an existing Firefox AutoConfig rule.\n\n\
                     Please notify your administrator of this warning.\n\n\
                     The installer will continue, but Trayport will not function with Firefox until this conflict is resolved.",
                );
                return Ok(BrowserOutcome::Conflict(conflict));
            }
            BrowserStatus::Found(profile) => profile,
        };

        info!("Registering with Firefox...");
        let layout = self.layout.ok_or(KeygenError::MissingInstallPath)?;
        let pem = fs::read_to_string(layout.ca_certificate())?;
        // Parse first so a truncated file never ends up in the browser config
        openssl::x509::X509::from_pem(pem.as_bytes())?;

        let values = TemplateValues::install(
            firefox::plain_certificate(&pem),
            &self.ctx.identity.common_name,
        );
        let template = template_or(
            Some(&layout.firefox_config_template()),
            firefox::DEFAULT_CONFIG_TEMPLATE,
        )?;
        firefox::write_config(&template, &values, &profile)?;

        let prefs = template_or(Some(&layout.firefox_prefs_template()), firefox::DEFAULT_PREFS)?;
        firefox::write_preferences(&prefs, &profile)?;

        Ok(BrowserOutcome::Installed)
    }

    /// Rewrite the config as a removal script. The preference file stays so a
    /// later install registers again without touching it.
    pub fn uninstall(&self) -> Result<BrowserOutcome> {
        let Some(profile) = self.locate() else {
            return Ok(BrowserOutcome::NotFound);
        };

        info!("Removing from Firefox...");
        let template = template_or(
            self.layout.map(|l| l.firefox_config_template()).as_deref(),
            firefox::DEFAULT_CONFIG_TEMPLATE,
        )?;
        let values = TemplateValues::uninstall(&self.ctx.identity.common_name);
        firefox::write_config(&template, &values, &profile)?;

        Ok(BrowserOutcome::Removed)
    }
}
