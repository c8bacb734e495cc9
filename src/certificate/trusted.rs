use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::x509::X509;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{KeygenError, Result};
use crate::identity::TrustedKeyMaterial;

// Bundle an operator supplied certificate and key into a PKCS#12 container
// keytool can import
pub fn create_pkcs12(
    material: &TrustedKeyMaterial,
    alias: &str,
    password: &str,
    output: &Path,
) -> Result<()> {
    info!("Creating PKCS12 keypair...");

    let cert_pem = fs::read(&material.certificate_path)?;
    let key_pem = fs::read(&material.key_path)?;

    let cert = X509::from_pem(&cert_pem)?;
    let key = PKey::private_key_from_pem(&key_pem)?;

    if !cert.public_key()?.public_eq(&key) {
        return Err(KeygenError::tool_failed(
            "Creating PKCS12 keypair",
            format!(
                "{} does not match {}",
                material.key_path.display(),
                material.certificate_path.display()
            ),
        ));
    }

    let pkcs12 = Pkcs12::builder()
        .name(alias)
        .pkey(&key)
        .cert(&cert)
        .build2(password)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, pkcs12.to_der()?)?;

    // Keystore material; owner only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(output, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
