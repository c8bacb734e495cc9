pub mod matcher;
pub mod windows;

use openssl::x509::X509;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::command::{exec_step, report, StepOutcome};
use crate::context::RunContext;
use crate::error::{KeygenError, Result};
use matcher::{CertificateEntry, OwnershipMatcher};
use windows::CertutilCommand;

/// How the OS trust store is reached, decided once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustStrategy {
    Certutil,
    /// No certutil: hand the user instructions and the Windows wizard
    Manual,
}

impl TrustStrategy {
    pub fn probe(ctx: &RunContext<'_>) -> Self {
        if windows::certutil_available(ctx.runner) {
            TrustStrategy::Certutil
        } else {
            info!("certutil is not available, falling back to manual certificate management");
            TrustStrategy::Manual
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { thumbprint: Option<String> },
    ManualFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed(usize),
    NothingToRemove,
    /// Deletion ran but a re-scan still finds our certificates
    Partial { remaining: usize },
    ManualFallback,
}

// SHA-256 fingerprint of the DER encoding
pub fn thumbprint(ca_cert: &Path) -> Result<String> {
    let cert = X509::from_pem(&fs::read(ca_cert)?)?;
    let digest = Sha256::digest(cert.to_der()?);
    Ok(digest.iter().map(|b| format!("{:02X}", b)).collect())
}

pub struct TrustStore<'c, 'a> {
    ctx: &'c RunContext<'a>,
    matcher: OwnershipMatcher,
}

impl<'c, 'a> TrustStore<'c, 'a> {
    pub fn new(ctx: &'c RunContext<'a>) -> Self {
        Self {
            ctx,
            matcher: OwnershipMatcher::new(&ctx.identity.common_name),
        }
    }

    /// Our certificates currently in the root store, in listing order.
    pub fn scan(&self) -> Result<Vec<CertificateEntry>> {
        let invocation = CertutilCommand::ListStore.invocation();
        let output = self
            .ctx
            .runner
            .run(&invocation)
            .map_err(|e| KeygenError::tool_failed("Listing root certificates", e.to_string()))?;
        if !output.success {
            return Err(KeygenError::tool_failed(
                "Listing root certificates",
                "non-zero exit status",
            ));
        }
        Ok(self.matcher.matches(&output.stdout))
    }

    pub fn install(&self, ca_cert: &Path) -> Result<InstallOutcome> {
        info!("Installing native certificate for secure websockets...");
        exec_step(
            self.ctx.runner,
            &CertutilCommand::AddStore(ca_cert).invocation(),
            "Installing native certificate",
        )?;

        if self.scan()?.is_empty() {
            report(StepOutcome::Failed, "Checking certificate installed");
            return Err(KeygenError::trust_store(
                "certificate not found in the root store after install",
            ));
        }
        report(StepOutcome::Success, "Checking certificate installed");

        let thumbprint = match thumbprint(ca_cert) {
            Ok(t) => {
                info!("Installed CA certificate with SHA-256 fingerprint {}", t);
                Some(t)
            }
            Err(e) => {
                warn!("Could not fingerprint {}: {}", ca_cert.display(), e);
                None
            }
        };
        Ok(InstallOutcome::Installed { thumbprint })
    }

    pub fn uninstall(&self) -> Result<UninstallOutcome> {
        info!("Deleting old certificates...");
        let matches = self.scan()?;
        if matches.is_empty() {
            report(StepOutcome::Skipped, "No matches found");
            return Ok(UninstallOutcome::NothingToRemove);
        }

        for entry in &matches {
            exec_step(
                self.ctx.runner,
                &CertutilCommand::DeleteSerial(&entry.serial).invocation(),
                &format!(
                    "Remove \"{}\" {} certificate",
                    super::keytool::ORGANIZATION,
                    entry.serial
                ),
            )?;
        }

        // Verify removal; a second pass is left to the next uninstall
        let remaining = self.scan()?;
        if !remaining.is_empty() {
            report(StepOutcome::Failed, "Some certificates not deleted");
            warn!(
                "{} certificate(s) still present: {:?}",
                remaining.len(),
                remaining.iter().map(|e| &e.serial).collect::<Vec<_>>()
            );
            return Ok(UninstallOutcome::Partial {
                remaining: remaining.len(),
            });
        }

        report(StepOutcome::Success, "Certificate(s) removed");
        Ok(UninstallOutcome::Removed(matches.len()))
    }

    pub fn manual_install(&self, ca_cert: &Path) -> InstallOutcome {
        windows::manual_install(self.ctx.runner, self.ctx.prompt, ca_cert);
        InstallOutcome::ManualFallback
    }

    pub fn manual_uninstall(&self) -> UninstallOutcome {
        windows::manual_uninstall(self.ctx.runner, self.ctx.prompt, &self.ctx.identity.common_name);
        UninstallOutcome::ManualFallback
    }
}
