//! Sequences a whole install or uninstall run.

use tracing::{info, warn};

use crate::browser::{BrowserIntegration, BrowserOutcome};
use crate::certificate::{
    locate_keytool, InstallOutcome, ProvisionMode, Provisioner, TrustStore, TrustStrategy,
    UninstallOutcome,
};
use crate::command::{report, StepOutcome};
use crate::context::RunContext;
use crate::error::Result;
use crate::identity::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub provision: ProvisionMode,
    /// `None` when a trusted keypair made local trust unnecessary
    pub trust: Option<InstallOutcome>,
    pub browser: Option<BrowserOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub trust: UninstallOutcome,
    pub browser: Option<BrowserOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Installed(InstallReport),
    Uninstalled(UninstallReport),
}

pub fn run(ctx: &RunContext<'_>, mode: Mode) -> Result<RunReport> {
    match mode {
        Mode::Install => install(ctx).map(RunReport::Installed),
        Mode::Uninstall => uninstall(ctx).map(RunReport::Uninstalled),
    }
}

fn install(ctx: &RunContext<'_>) -> Result<InstallReport> {
    let keytool = locate_keytool(ctx.registry)?;
    let layout = ctx.layout()?;

    let provision = Provisioner::new(ctx, layout.clone(), keytool).provision()?;
    if provision == ProvisionMode::Imported {
        info!("Trusted keypair installed; skipping OS and browser certificate trust");
        return Ok(InstallReport {
            provision,
            trust: None,
            browser: None,
        });
    }

    let ca_cert = layout.ca_certificate();
    let store = TrustStore::new(ctx);
    let trust = match TrustStrategy::probe(ctx) {
        TrustStrategy::Certutil => store.install(&ca_cert).unwrap_or_else(|e| {
            warn!("{}", e);
            store.manual_install(&ca_cert)
        }),
        TrustStrategy::Manual => store.manual_install(&ca_cert),
    };

    let browser = match BrowserIntegration::new(ctx, Some(&layout)).install() {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            report(StepOutcome::Failed, format!("Registering with Firefox: {}", e));
            None
        }
    };

    Ok(InstallReport {
        provision,
        trust: Some(trust),
        browser,
    })
}

fn uninstall(ctx: &RunContext<'_>) -> Result<UninstallReport> {
    let store = TrustStore::new(ctx);
    let trust = match TrustStrategy::probe(ctx) {
        TrustStrategy::Certutil => store.uninstall().unwrap_or_else(|e| {
            warn!("{}", e);
            store.manual_uninstall()
        }),
        TrustStrategy::Manual => store.manual_uninstall(),
    };

    // Without an install path the built-in template still neutralises Firefox
    let layout = ctx.layout().ok();
    let browser = match BrowserIntegration::new(ctx, layout.as_ref()).uninstall() {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            report(StepOutcome::Failed, format!("Removing from Firefox: {}", e));
            None
        }
    };

    Ok(UninstallReport { trust, browser })
}
