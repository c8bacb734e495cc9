use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::keytool::{DistinguishedName, Extension, KeytoolCommand};
use super::settings::OperationalSettings;
use super::trusted::create_pkcs12;
use crate::command::exec_step;
use crate::context::RunContext;
use crate::error::{KeygenError, Result};
use crate::utils::paths::{InstallLayout, CA_ALIAS, LEAF_ALIAS};
use crate::utils::registry::Registry;

const JAVA_REG_KEY: &str = "HKLM\\Software\\JavaSoft\\Java Runtime Environment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionMode {
    /// Fresh CA plus a leaf signed by it
    Generated,
    /// Operator supplied keypair converted into the keystore
    Imported,
}

// Function to find keytool from the registered JRE, falling back to JAVA_HOME
pub fn locate_keytool(registry: &dyn Registry) -> Result<PathBuf> {
    keytool_from(registry, env::var("JAVA_HOME").ok())
}

fn keytool_from(registry: &dyn Registry, java_home_env: Option<String>) -> Result<PathBuf> {
    let java_home = registry
        .value(JAVA_REG_KEY, Some("CurrentVersion"))
        .and_then(|version| registry.value(&format!("{JAVA_REG_KEY}\\{version}"), Some("JavaHome")))
        .or(java_home_env.filter(|h| !h.is_empty()))
        .ok_or_else(|| KeygenError::MissingRuntime("JavaHome".to_string()))?;

    let binary = if cfg!(windows) { "keytool.exe" } else { "keytool" };
    Ok(PathBuf::from(java_home).join("bin").join(binary))
}

// Function to delete a file left over from a previous run
fn delete_file(path: &Path) -> Result<()> {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            error!("Unable to delete {}", path.display());
            return Err(e.into());
        }
    }
    Ok(())
}

// Like delete_file, but a failure is only logged
fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Unable to delete {}: {}", path.display(), e);
        }
    }
}

pub struct Provisioner<'c, 'a> {
    ctx: &'c RunContext<'a>,
    layout: InstallLayout,
    keytool: PathBuf,
}

impl<'c, 'a> Provisioner<'c, 'a> {
    pub fn new(ctx: &'c RunContext<'a>, layout: InstallLayout, keytool: PathBuf) -> Self {
        Self {
            ctx,
            layout,
            keytool,
        }
    }

    pub fn provision(&self) -> Result<ProvisionMode> {
        fs::create_dir_all(self.layout.keystore().parent().unwrap_or(self.layout.root()))?;
        delete_file(&self.layout.keystore())?;
        delete_file(&self.layout.certificate())?;

        info!(
            "Creating keystore for wss://{} (this could take a minute)...",
            self.ctx.identity.common_name
        );

        let mode = match &self.ctx.trusted {
            Some(material) => {
                create_pkcs12(
                    material,
                    LEAF_ALIAS,
                    &self.ctx.secrets.store_password,
                    &self.layout.pkcs12(),
                )?;
                let result = self.run(
                    "Converting trusted keypair to Java format",
                    &KeytoolCommand::ImportPkcs12 {
                        alias: LEAF_ALIAS.to_string(),
                        source: self.layout.pkcs12(),
                        destination: self.layout.keystore(),
                    },
                );
                // The container holds the private key in a second place
                discard(&self.layout.pkcs12());
                result?;
                ProvisionMode::Imported
            }
            None => {
                self.generate()?;
                ProvisionMode::Generated
            }
        };

        OperationalSettings {
            alias: LEAF_ALIAS,
            keystore: self.layout.keystore(),
            secrets: &self.ctx.secrets,
        }
        .write(&self.layout.settings())?;

        Ok(mode)
    }

    fn run(&self, step: &str, command: &KeytoolCommand) -> Result<()> {
        let invocation = command.to_invocation(&self.keytool, &self.ctx.secrets)?;
        exec_step(self.ctx.runner, &invocation, step)
    }

    // Ordered chain; the first failing step aborts the rest
    fn generation_plan(&self) -> Vec<(String, KeytoolCommand)> {
        let identity = &self.ctx.identity;
        let dname = DistinguishedName::for_identity(identity);
        let layout = &self.layout;

        vec![
            (
                format!("Creating a CA keypair: {}", layout.ca_keystore().display()),
                KeytoolCommand::GenerateKeyPair {
                    alias: CA_ALIAS.to_string(),
                    dname: dname.clone(),
                    keystore: layout.ca_keystore(),
                    extensions: Extension::ca(),
                },
            ),
            (
                format!("Exporting CA certificate: {}", layout.ca_certificate().display()),
                KeytoolCommand::ExportCertificate {
                    alias: CA_ALIAS.to_string(),
                    keystore: layout.ca_keystore(),
                    file: layout.ca_certificate(),
                },
            ),
            (
                format!("Creating an SSL keypair: {}", layout.keystore().display()),
                KeytoolCommand::GenerateKeyPair {
                    alias: LEAF_ALIAS.to_string(),
                    dname,
                    keystore: layout.keystore(),
                    extensions: Extension::leaf(identity),
                },
            ),
            (
                format!("Creating an SSL CSR: {}", layout.csr().display()),
                KeytoolCommand::CertificateRequest {
                    alias: LEAF_ALIAS.to_string(),
                    keystore: layout.keystore(),
                    file: layout.csr(),
                },
            ),
            (
                format!("Issuing SSL certificate from CA: {}", layout.certificate().display()),
                KeytoolCommand::IssueCertificate {
                    issuer_alias: CA_ALIAS.to_string(),
                    issuer_keystore: layout.ca_keystore(),
                    request: layout.csr(),
                    outfile: layout.certificate(),
                    extensions: Extension::leaf(identity),
                },
            ),
            (
                format!(
                    "Importing CA certificate into SSL keypair: {}",
                    layout.keystore().display()
                ),
                KeytoolCommand::ImportCertificate {
                    alias: CA_ALIAS.to_string(),
                    keystore: layout.keystore(),
                    file: layout.ca_certificate(),
                },
            ),
            (
                format!(
                    "Importing chained SSL certificate into SSL keypair: {}",
                    layout.keystore().display()
                ),
                KeytoolCommand::ImportCertificate {
                    alias: LEAF_ALIAS.to_string(),
                    keystore: layout.keystore(),
                    file: layout.certificate(),
                },
            ),
        ]
    }

    fn generate(&self) -> Result<()> {
        // A stale file keytool cannot overwrite fails its own step below
        discard(&self.layout.ca_keystore());
        discard(&self.layout.ca_certificate());
        discard(&self.layout.csr());

        let result = self
            .generation_plan()
            .iter()
            .try_for_each(|(step, command)| self.run(step, command));

        // Only the leaf keystore and the CA's public certificate outlive the run
        discard(&self.layout.ca_keystore());
        discard(&self.layout.csr());
        discard(&self.layout.certificate());

        result
    }
}
