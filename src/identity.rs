//! Resolves who we are for this run: installation directory, hostname and
//! the optional operator-supplied keypair.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{KeygenError, Result};
use crate::utils::paths::InstallRecord;
use crate::utils::registry::Registry;

pub const DEFAULT_COMMON_NAME: &str = "localhost";
/// Extra SAN entry carried only by certificates for the default host.
pub const SECONDARY_DNS_ALIAS: &str = "localhost.trayport.dev";
pub const INSTALL_REG_KEY: &str = "HKLM\\Software\\Trayport";

/// Positional arguments, in the order the installer passes them.
#[derive(Parser, Debug, Default)]
#[command(name = "trayport-keygen")]
#[command(about = "Provision or remove the locally-trusted certificate for wss://localhost")]
pub struct Args {
    /// Trayport installation directory
    pub install_path: Option<String>,

    /// "install" or anything else for uninstall
    pub mode: Option<String>,

    /// Hostname or IPv4 address to issue the certificate for
    pub hostname: Option<String>,

    /// Portable Firefox directory
    pub portable_firefox: Option<String>,

    /// Externally trusted certificate (PEM)
    pub ssl_cert: Option<String>,

    /// Private key for the trusted certificate (PEM)
    pub ssl_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Install,
    Uninstall,
}

impl Mode {
    fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("install") => Mode::Install,
            Some(_) => Mode::Uninstall,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub install_path: Option<PathBuf>,
    pub common_name: String,
    /// True when the hostname came from the command line rather than the default.
    pub overridden: bool,
    pub is_ip_address: bool,
}

impl Identity {
    pub fn new(install_path: Option<PathBuf>, common_name: Option<&str>) -> Self {
        let (common_name, overridden) = match common_name {
            Some(cn) => (cn.to_string(), true),
            None => (DEFAULT_COMMON_NAME.to_string(), false),
        };
        let is_ip_address = is_ipv4(&common_name);
        Self {
            install_path,
            common_name,
            overridden,
            is_ip_address,
        }
    }

    pub fn require_install_path(&self) -> Result<&Path> {
        self.install_path
            .as_deref()
            .ok_or(KeygenError::MissingInstallPath)
    }

    /// Secondary DNS name for the SAN list, only meaningful for the default host.
    pub fn secondary_alias(&self) -> Option<&'static str> {
        (!self.overridden).then_some(SECONDARY_DNS_ALIAS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedKeyMaterial {
    pub certificate_path: PathBuf,
    pub key_path: PathBuf,
}

impl TrustedKeyMaterial {
    /// Both halves or neither; one alone is an operator mistake.
    pub fn from_parts(cert: Option<&str>, key: Option<&str>) -> Result<Option<Self>> {
        match (cert, key) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                certificate_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(KeygenError::IncompleteTrustedPair { missing: "key" }),
            (None, Some(_)) => Err(KeygenError::IncompleteTrustedPair {
                missing: "certificate",
            }),
        }
    }
}

#[derive(Debug)]
pub struct Resolved {
    pub mode: Mode,
    pub identity: Identity,
    pub trusted: Option<TrustedKeyMaterial>,
    pub firefox_override: Option<PathBuf>,
}

/// Four dot-separated decimal octets.
pub fn is_ipv4(host: &str) -> bool {
    let parts: Vec<&str> = host.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|p| {
            !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) && p.parse::<u8>().is_ok()
        })
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Installation path: argument, then registry, then the per-user install record.
fn resolve_install_path(
    arg: Option<&str>,
    registry: &dyn Registry,
    config_dir: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = arg {
        return Ok(Some(PathBuf::from(path)));
    }
    if let Some(path) = registry.value(INSTALL_REG_KEY, None) {
        debug!("Installation path from registry: {}", path);
        return Ok(Some(PathBuf::from(path)));
    }
    match config_dir {
        Some(dir) => Ok(InstallRecord::load(dir)?.map(|r| r.install_path)),
        None => Ok(None),
    }
}

pub fn resolve(args: &Args, registry: &dyn Registry, config_dir: Option<&Path>) -> Result<Resolved> {
    let install_path = resolve_install_path(non_blank(&args.install_path), registry, config_dir)?;
    let identity = Identity::new(install_path, non_blank(&args.hostname));
    let trusted = TrustedKeyMaterial::from_parts(non_blank(&args.ssl_cert), non_blank(&args.ssl_key))?;

    Ok(Resolved {
        mode: Mode::parse(non_blank(&args.mode)),
        identity,
        trusted,
        firefox_override: non_blank(&args.portable_firefox).map(PathBuf::from),
    })
}
