use std::fmt;

use crate::error::Result;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const PASSWORD_LEN: usize = 10;

/// Keystore passwords for one run. Generated once and reused for every
/// keystore operation so all files open with the same secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub store_password: String,
    pub key_password: String,
}

impl Secrets {
    pub fn generate() -> Result<Self> {
        let password = random_password()?;
        Ok(Self {
            store_password: password.clone(),
            key_password: password,
        })
    }
}

// Keep passwords out of debug logs
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("store_password", &"***")
            .field("key_password", &"***")
            .finish()
    }
}

fn random_password() -> Result<String> {
    let mut password = String::with_capacity(PASSWORD_LEN);
    let mut buf = [0u8; 32];
    while password.len() < PASSWORD_LEN {
        getrandom::getrandom(&mut buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        // 252 is the largest multiple of 36 below 256; rejecting above it keeps the draw uniform
        for b in buf.iter().filter(|b| **b < 252) {
            if password.len() == PASSWORD_LEN {
                break;
            }
            password.push(ALPHABET[(*b as usize) % ALPHABET.len()] as char);
        }
    }
    Ok(password)
}
