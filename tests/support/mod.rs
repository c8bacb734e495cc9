//! Scripted stand-ins for keytool, certutil, the registry and dialogs.

#![allow(dead_code)]

use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use trayport_keygen::command::{CommandOutput, CommandRunner, Invocation};
use trayport_keygen::prompt::Prompt;
use trayport_keygen::utils::registry::Registry;

pub const JAVA_KEY: &str = "HKLM\\Software\\JavaSoft\\Java Runtime Environment";

pub fn issuer_for(common_name: &str) -> String {
    format!(
        "CN={common_name}, E=support@trayport.dev, OU=Trayport Industries, LLC, \
         O=Trayport Industries, LLC, L=Albany, S=NY, C=US"
    )
}

pub fn ca_pem() -> String {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Constrained(1));
    params.self_signed(&key).unwrap().pem()
}

/// Writes a matching self-signed certificate and key, returns their paths.
pub fn trusted_pair(dir: &Path) -> (String, String) {
    let key = KeyPair::generate().unwrap();
    let cert = CertificateParams::new(vec!["print.example.com".to_string()])
        .unwrap()
        .self_signed(&key)
        .unwrap();
    let cert_path = dir.join("trusted.crt");
    let key_path = dir.join("trusted.key");
    fs::write(&cert_path, cert.pem()).unwrap();
    fs::write(&key_path, key.serialize_pem()).unwrap();
    (
        cert_path.to_string_lossy().into_owned(),
        key_path.to_string_lossy().into_owned(),
    )
}

pub struct FakeSystem {
    pub calls: RefCell<Vec<Invocation>>,
    /// (serial, issuer) pairs in the simulated root store
    pub root_store: RefCell<Vec<(String, String)>>,
    /// Any invocation whose display form contains one of these exits non-zero
    pub failing: RefCell<Vec<String>>,
    /// Serials `-delstore` claims to delete but leaves in place
    pub sticky: RefCell<Vec<String>>,
    pub certutil_present: bool,
    pub issuer_cn: String,
    ca_pem: String,
    next_serial: Cell<u32>,
}

impl FakeSystem {
    pub fn new(issuer_cn: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            root_store: RefCell::new(Vec::new()),
            failing: RefCell::new(Vec::new()),
            sticky: RefCell::new(Vec::new()),
            certutil_present: true,
            issuer_cn: issuer_cn.to_string(),
            ca_pem: ca_pem(),
            next_serial: Cell::new(0x5f3a_9c01),
        }
    }

    pub fn without_certutil(mut self) -> Self {
        self.certutil_present = false;
        self
    }

    pub fn fail_on(&self, needle: &str) {
        self.failing.borrow_mut().push(needle.to_string());
    }

    pub fn add_root(&self, serial: &str, issuer: &str) {
        self.root_store
            .borrow_mut()
            .push((serial.to_string(), issuer.to_string()));
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|inv| inv.program_name() == program)
            .cloned()
            .collect()
    }

    pub fn called_with(&self, program: &str, verb: &str) -> usize {
        self.calls_to(program)
            .iter()
            .filter(|inv| inv.args.iter().any(|a| a == verb))
            .count()
    }

    pub fn listing(&self) -> String {
        let mut out = String::from("Root \"Trusted Root Certification Authorities\"\r\n");
        for (i, (serial, issuer)) in self.root_store.borrow().iter().enumerate() {
            out.push_str(&format!("================ Certificate {i} ================\r\n"));
            out.push_str(&format!("Serial Number: {serial}\r\n"));
            out.push_str(&format!("Issuer: {issuer}\r\n"));
            out.push_str(" NotBefore: 1/1/2026 9:00 AM\r\n");
        }
        out.push_str("CertUtil: -store command completed successfully.\r\n");
        out
    }

    fn ok(stdout: String) -> io::Result<CommandOutput> {
        Ok(CommandOutput {
            success: true,
            stdout,
        })
    }

    fn failed() -> io::Result<CommandOutput> {
        Ok(CommandOutput::default())
    }

    fn keytool(&self, inv: &Invocation) -> io::Result<CommandOutput> {
        let has = |verb: &str| inv.args.iter().any(|a| a == verb);
        let exists = |flag: &str| inv.flag_value(flag).is_some_and(|p| Path::new(p).exists());
        let write = |flag: &str, contents: &str| match inv.flag_value(flag) {
            Some(p) => fs::write(p, contents).map(|_| true),
            None => Ok(false),
        };

        let done = if has("-genkeypair") {
            write("-keystore", "keystore")?
        } else if has("-exportcert") {
            exists("-keystore") && write("-file", &self.ca_pem)?
        } else if has("-certreq") {
            exists("-keystore") && write("-file", "csr")?
        } else if has("-gencert") {
            exists("-keystore") && exists("-infile") && write("-outfile", "leaf")?
        } else if has("-importkeystore") {
            exists("-srckeystore") && write("-destkeystore", "keystore")?
        } else if has("-import") {
            exists("-file") && exists("-keystore")
        } else {
            false
        };

        if done {
            Self::ok(String::new())
        } else {
            Self::failed()
        }
    }

    fn certutil(&self, inv: &Invocation) -> io::Result<CommandOutput> {
        if !self.certutil_present {
            return Err(io::Error::new(io::ErrorKind::NotFound, "certutil.exe"));
        }
        match inv.args.first().map(String::as_str) {
            Some("-?") => Self::ok(String::new()),
            Some("-store") => Self::ok(self.listing()),
            Some("-addstore") => {
                let serial = format!("{:x}", self.next_serial.get());
                self.next_serial.set(self.next_serial.get() + 1);
                self.add_root(&serial, &issuer_for(&self.issuer_cn));
                Self::ok(String::new())
            }
            Some("-delstore") => {
                let serial = inv.args.get(2).cloned().unwrap_or_default();
                if !self.sticky.borrow().contains(&serial) {
                    self.root_store.borrow_mut().retain(|(s, _)| *s != serial);
                }
                Self::ok(String::new())
            }
            _ => Self::failed(),
        }
    }
}

impl CommandRunner for FakeSystem {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.calls.borrow_mut().push(invocation.clone());

        let display = invocation.to_string();
        if self.failing.borrow().iter().any(|needle| display.contains(needle)) {
            return Self::failed();
        }

        match invocation.program_name().as_str() {
            "keytool" => self.keytool(invocation),
            "certutil" => self.certutil(invocation),
            "rundll32" | "mmc" => Self::ok(String::new()),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, "no such program")),
        }
    }
}

#[derive(Default)]
pub struct FakeRegistry(HashMap<(String, Option<String>), String>);

impl FakeRegistry {
    pub fn with_java(java_home: &str) -> Self {
        Self::default()
            .with(JAVA_KEY, Some("CurrentVersion"), "1.8")
            .with(&format!("{JAVA_KEY}\\1.8"), Some("JavaHome"), java_home)
    }

    pub fn with(mut self, key: &str, name: Option<&str>, value: &str) -> Self {
        self.0
            .insert((key.to_string(), name.map(String::from)), value.to_string());
        self
    }
}

impl Registry for FakeRegistry {
    fn value(&self, key: &str, name: Option<&str>) -> Option<String> {
        self.0.get(&(key.to_string(), name.map(String::from))).cloned()
    }
}

#[derive(Default)]
pub struct RecordingPrompt {
    pub shown: RefCell<Vec<(String, String)>>,
}

impl RecordingPrompt {
    pub fn titles(&self) -> Vec<String> {
        self.shown.borrow().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl Prompt for RecordingPrompt {
    fn warn(&self, title: &str, message: &str) {
        self.shown
            .borrow_mut()
            .push((title.to_string(), message.to_string()));
    }
}
