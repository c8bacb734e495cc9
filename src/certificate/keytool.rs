//! Typed builders for the Java `keytool` invocations used to create keystores.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::command::Invocation;
use crate::error::{KeygenError, Result};
use crate::identity::Identity;
use crate::utils::secret::Secrets;

pub const ORGANIZATION: &str = "Trayport Industries, LLC";
pub const SUPPORT_EMAIL: &str = "support@trayport.dev";
pub const VALIDITY_DAYS: u32 = 7305;
const KEY_SIZE: u32 = 2048;

/// Subject/issuer name used for both the CA and the leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub email: String,
    pub organizational_unit: String,
    pub organization: String,
    pub locality: String,
    pub state: String,
    pub country: String,
}

impl DistinguishedName {
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            common_name: identity.common_name.clone(),
            email: SUPPORT_EMAIL.to_string(),
            organizational_unit: ORGANIZATION.to_string(),
            organization: ORGANIZATION.to_string(),
            locality: "Albany".to_string(),
            state: "NY".to_string(),
            country: "US".to_string(),
        }
    }
}

// keytool splits -dname on unescaped commas
fn escape(value: &str) -> String {
    value.replace(',', "\\,")
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CN={}, EMAILADDRESS={}, OU={}, O={}, L={}, S={}, C={}",
            escape(&self.common_name),
            escape(&self.email),
            escape(&self.organizational_unit),
            escape(&self.organization),
            escape(&self.locality),
            escape(&self.state),
            escape(&self.country)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneralName {
    Dns(String),
    Ip(String),
}

impl fmt::Display for GeneralName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(name) => write!(f, "dns:{}", name),
            Self::Ip(addr) => write!(f, "ip:{}", addr),
        }
    }
}

/// Subject alternative names for the leaf certificate.
pub fn subject_alt_names(identity: &Identity) -> Vec<GeneralName> {
    let primary = if identity.is_ip_address {
        GeneralName::Ip(identity.common_name.clone())
    } else {
        GeneralName::Dns(identity.common_name.clone())
    };
    let mut names = vec![primary];
    if let Some(alias) = identity.secondary_alias() {
        names.push(GeneralName::Dns(alias.to_string()));
    }
    names
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// Certificate and CRL signing only.
    CaKeyUsage,
    /// `pathlen` bounds how many intermediates may follow.
    CaConstraints { path_len: u8 },
    ServerKeyUsage,
    ServerExtendedKeyUsage,
    SubjectAltName(Vec<GeneralName>),
    EndEntity,
}

impl Extension {
    pub fn ca() -> Vec<Extension> {
        vec![Extension::CaKeyUsage, Extension::CaConstraints { path_len: 1 }]
    }

    pub fn leaf(identity: &Identity) -> Vec<Extension> {
        vec![
            Extension::ServerKeyUsage,
            Extension::ServerExtendedKeyUsage,
            Extension::SubjectAltName(subject_alt_names(identity)),
            Extension::EndEntity,
        ]
    }

    fn validate(&self) -> Result<()> {
        if let Extension::SubjectAltName(names) = self {
            if names.is_empty() {
                return Err(KeygenError::invalid_command(
                    "subject alternative name list is empty",
                ));
            }
            for name in names {
                let value = match name {
                    GeneralName::Dns(v) | GeneralName::Ip(v) => v,
                };
                if value.is_empty() || value.contains(',') || value.contains(char::is_whitespace) {
                    return Err(KeygenError::invalid_command(format!(
                        "invalid subject alternative name {:?}",
                        value
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaKeyUsage => f.write_str("ku:critical=cRLSign,keyCertSign"),
            Self::CaConstraints { path_len } => {
                write!(f, "bc:critical=ca:true,pathlen:{}", path_len)
            }
            Self::ServerKeyUsage => f.write_str("ku:critical=digitalSignature,keyEncipherment"),
            Self::ServerExtendedKeyUsage => f.write_str("eku=serverAuth,clientAuth"),
            Self::SubjectAltName(names) => {
                let joined: Vec<String> = names.iter().map(ToString::to_string).collect();
                write!(f, "san={}", joined.join(","))
            }
            Self::EndEntity => f.write_str("bc:critical=ca:false"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum KeytoolCommand {
    GenerateKeyPair {
        alias: String,
        dname: DistinguishedName,
        keystore: PathBuf,
        extensions: Vec<Extension>,
    },
    ExportCertificate {
        alias: String,
        keystore: PathBuf,
        file: PathBuf,
    },
    CertificateRequest {
        alias: String,
        keystore: PathBuf,
        file: PathBuf,
    },
    IssueCertificate {
        issuer_alias: String,
        issuer_keystore: PathBuf,
        request: PathBuf,
        outfile: PathBuf,
        extensions: Vec<Extension>,
    },
    ImportCertificate {
        alias: String,
        keystore: PathBuf,
        file: PathBuf,
    },
    /// Pull a PKCS#12 container into the keystore under `alias`.
    ImportPkcs12 {
        alias: String,
        source: PathBuf,
        destination: PathBuf,
    },
}

fn require_alias(alias: &str) -> Result<()> {
    if alias.is_empty() || alias.contains(char::is_whitespace) {
        return Err(KeygenError::invalid_command(format!(
            "invalid keystore alias {:?}",
            alias
        )));
    }
    Ok(())
}

fn require_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(KeygenError::invalid_command("empty file path"));
    }
    Ok(())
}

impl KeytoolCommand {
    pub fn validate(&self, secrets: &Secrets) -> Result<()> {
        // keytool refuses passwords shorter than six characters
        if secrets.store_password.len() < 6 || secrets.key_password.len() < 6 {
            return Err(KeygenError::invalid_command(
                "keystore passwords must be at least 6 characters",
            ));
        }

        match self {
            Self::GenerateKeyPair {
                alias,
                keystore,
                extensions,
                dname,
            } => {
                require_alias(alias)?;
                require_path(keystore)?;
                if dname.common_name.is_empty() {
                    return Err(KeygenError::invalid_command("empty common name"));
                }
                extensions.iter().try_for_each(Extension::validate)
            }
            Self::ExportCertificate {
                alias,
                keystore,
                file,
            }
            | Self::CertificateRequest {
                alias,
                keystore,
                file,
            }
            | Self::ImportCertificate {
                alias,
                keystore,
                file,
            } => {
                require_alias(alias)?;
                require_path(keystore)?;
                require_path(file)
            }
            Self::IssueCertificate {
                issuer_alias,
                issuer_keystore,
                request,
                outfile,
                extensions,
            } => {
                require_alias(issuer_alias)?;
                require_path(issuer_keystore)?;
                require_path(request)?;
                require_path(outfile)?;
                extensions.iter().try_for_each(Extension::validate)
            }
            Self::ImportPkcs12 {
                alias,
                source,
                destination,
            } => {
                require_alias(alias)?;
                require_path(source)?;
                require_path(destination)
            }
        }
    }

    /// Validate, then lay the command out as keytool arguments.
    pub fn to_invocation(&self, keytool: &Path, secrets: &Secrets) -> Result<Invocation> {
        self.validate(secrets)?;

        let inv = Invocation::new(keytool);
        let inv = match self {
            Self::GenerateKeyPair {
                alias,
                dname,
                keystore,
                extensions,
            } => with_extensions(
                inv.arg("-genkeypair")
                    .arg("-noprompt")
                    .arg("-alias")
                    .arg(alias)
                    .arg("-keyalg")
                    .arg("RSA")
                    .arg("-keysize")
                    .arg(KEY_SIZE.to_string())
                    .arg("-dname")
                    .arg(dname.to_string())
                    .arg("-validity")
                    .arg(VALIDITY_DAYS.to_string())
                    .arg("-keystore")
                    .path_arg(keystore)
                    .arg("-keypass")
                    .arg(&secrets.key_password)
                    .arg("-storepass")
                    .arg(&secrets.store_password),
                extensions,
            ),
            Self::ExportCertificate {
                alias,
                keystore,
                file,
            } => inv
                .arg("-exportcert")
                .arg("-alias")
                .arg(alias)
                .arg("-keystore")
                .path_arg(keystore)
                .arg("-keypass")
                .arg(&secrets.key_password)
                .arg("-storepass")
                .arg(&secrets.store_password)
                .arg("-file")
                .path_arg(file)
                .arg("-rfc"),
            Self::CertificateRequest {
                alias,
                keystore,
                file,
            } => inv
                .arg("-certreq")
                .arg("-keyalg")
                .arg("RSA")
                .arg("-alias")
                .arg(alias)
                .arg("-file")
                .path_arg(file)
                .arg("-keystore")
                .path_arg(keystore)
                .arg("-keypass")
                .arg(&secrets.key_password)
                .arg("-storepass")
                .arg(&secrets.store_password),
            Self::IssueCertificate {
                issuer_alias,
                issuer_keystore,
                request,
                outfile,
                extensions,
            } => with_extensions(
                inv.arg("-gencert")
                    .arg("-keypass")
                    .arg(&secrets.key_password)
                    .arg("-storepass")
                    .arg(&secrets.store_password)
                    .arg("-validity")
                    .arg(VALIDITY_DAYS.to_string())
                    .arg("-keystore")
                    .path_arg(issuer_keystore)
                    .arg("-alias")
                    .arg(issuer_alias)
                    .arg("-infile")
                    .path_arg(request),
                extensions,
            )
            .arg("-rfc")
            .arg("-outfile")
            .path_arg(outfile),
            Self::ImportCertificate {
                alias,
                keystore,
                file,
            } => inv
                .arg("-noprompt")
                .arg("-import")
                .arg("-trustcacerts")
                .arg("-alias")
                .arg(alias)
                .arg("-file")
                .path_arg(file)
                .arg("-keystore")
                .path_arg(keystore)
                .arg("-keypass")
                .arg(&secrets.key_password)
                .arg("-storepass")
                .arg(&secrets.store_password),
            Self::ImportPkcs12 {
                alias,
                source,
                destination,
            } => inv
                .arg("-importkeystore")
                .arg("-deststorepass")
                .arg(&secrets.store_password)
                .arg("-destkeypass")
                .arg(&secrets.key_password)
                .arg("-destkeystore")
                .path_arg(destination)
                .arg("-srckeystore")
                .path_arg(source)
                .arg("-srcstoretype")
                .arg("PKCS12")
                .arg("-srcstorepass")
                .arg(&secrets.store_password)
                .arg("-alias")
                .arg(alias),
        };
        Ok(inv)
    }
}

fn with_extensions(inv: Invocation, extensions: &[Extension]) -> Invocation {
    extensions
        .iter()
        .fold(inv, |inv, ext| inv.arg("-ext").arg(ext.to_string()))
}
