//! Error type shared by every stage of the keygen run.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeygenError {
    /// No installation path was given and none could be looked up
    #[error("Can't find the Trayport installation path. Secure websockets will not work.")]
    MissingInstallPath,

    /// A required runtime (the Java keytool) is not installed
    #[error("Can't find {0}. Secure websockets will not work.")]
    MissingRuntime(String),

    /// Only one half of the trusted certificate/key pair was supplied
    #[error("Trusted keypair requires both a certificate and a key (missing {missing})")]
    IncompleteTrustedPair { missing: &'static str },

    /// An external tool exited non-zero or could not be launched
    #[error("{step} failed: {reason}")]
    ToolFailed { step: String, reason: String },

    /// A command builder was given parameters the tool would reject
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Trust store error: {0}")]
    TrustStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),
}

pub type Result<T> = std::result::Result<T, KeygenError>;

impl KeygenError {
    pub fn tool_failed(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolFailed {
            step: step.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }

    pub fn trust_store(msg: impl Into<String>) -> Self {
        Self::TrustStore(msg.into())
    }

    /// Process exit status for this error.
    ///
    /// Configuration problems carry their own codes so an installer can tell
    /// them apart; everything else is a generic failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingRuntime(_) => 2,
            Self::MissingInstallPath => 4,
            Self::IncompleteTrustedPair { .. } => 5,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(KeygenError::MissingRuntime("JavaHome".into()).exit_code(), 2);
        assert_eq!(KeygenError::MissingInstallPath.exit_code(), 4);
        assert_eq!(
            KeygenError::IncompleteTrustedPair { missing: "key" }.exit_code(),
            5
        );
        assert_eq!(KeygenError::tool_failed("step", "boom").exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = KeygenError::tool_failed("Creating a CA keypair", "exit status 1");
        assert_eq!(err.to_string(), "Creating a CA keypair failed: exit status 1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: KeygenError = io_err.into();
        assert!(matches!(err, KeygenError::Io(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
