mod authority;
pub mod keytool;
pub mod platform;
pub mod settings;
mod trusted;

pub use authority::{locate_keytool, ProvisionMode, Provisioner};
pub use platform::{InstallOutcome, TrustStore, TrustStrategy, UninstallOutcome};
