//! Parses a `certutil -store` listing and picks out the certificates this
//! application installed.
//!
//! A listing looks like:
//!
//! ```text
//! Root "Trusted Root Certification Authorities"
//! ================ Certificate 0 ================
//! Serial Number: 1a2b3c4d
//! Issuer: CN=localhost, E=support@trayport.dev, OU=Trayport Industries, LLC, ...
//! ...
//! CertUtil: -store command completed successfully.
//! ```

use crate::certificate::keytool::ORGANIZATION;

pub const BLOCK_SEPARATOR: &str = "================";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    pub serial: String,
    pub issuer: String,
}

fn value_after_colon(line: &str) -> Option<&str> {
    let (_, value) = line.split_once(':')?;
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

impl CertificateEntry {
    /// First line carries the serial, second the issuer. Anything shorter or
    /// without a `label: value` shape is not a certificate block.
    pub fn parse_block(lines: &[&str]) -> Option<Self> {
        let serial = value_after_colon(lines.first()?)?;
        let issuer = value_after_colon(lines.get(1)?)?;
        Some(Self {
            serial: serial.to_string(),
            issuer: issuer.to_string(),
        })
    }
}

/// Split a listing on separator lines and parse each block.
pub fn parse_listing(listing: &str) -> Vec<CertificateEntry> {
    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in listing.lines() {
        if line.contains(BLOCK_SEPARATOR) {
            entries.extend(CertificateEntry::parse_block(&block));
            block.clear();
        } else {
            block.push(line);
        }
    }
    // Last certificate is followed by a status line, not a separator
    entries.extend(CertificateEntry::parse_block(&block));
    entries
}

/// Ownership test: the fixed OU marker plus our common name, both in the issuer.
#[derive(Debug, Clone)]
pub struct OwnershipMatcher {
    marker: String,
    common_name: String,
}

impl OwnershipMatcher {
    pub fn new(common_name: &str) -> Self {
        Self {
            marker: format!("OU={}", ORGANIZATION),
            common_name: format!("CN={}", common_name),
        }
    }

    fn has_common_name(&self, issuer: &str) -> bool {
        issuer.match_indices(&self.common_name).any(|(idx, m)| {
            matches!(issuer[idx + m.len()..].chars().next(), None | Some(','))
        })
    }

    pub fn is_match(&self, entry: &CertificateEntry) -> bool {
        entry.issuer.contains(&self.marker) && self.has_common_name(&entry.issuer)
    }

    pub fn matches(&self, listing: &str) -> Vec<CertificateEntry> {
        parse_listing(listing)
            .into_iter()
            .filter(|entry| self.is_match(entry))
            .collect()
    }
}
