use std::path::PathBuf;

use crate::command::CommandRunner;
use crate::error::Result;
use crate::identity::{Identity, Resolved, TrustedKeyMaterial};
use crate::prompt::Prompt;
use crate::utils::paths::InstallLayout;
use crate::utils::registry::Registry;
use crate::utils::secret::Secrets;

/// Everything a run needs, built once and handed down by reference.
pub struct RunContext<'a> {
    pub identity: Identity,
    pub trusted: Option<TrustedKeyMaterial>,
    pub firefox_override: Option<PathBuf>,
    pub secrets: Secrets,
    pub runner: &'a dyn CommandRunner,
    pub registry: &'a dyn Registry,
    pub prompt: &'a dyn Prompt,
}

impl<'a> RunContext<'a> {
    pub fn new(
        resolved: Resolved,
        runner: &'a dyn CommandRunner,
        registry: &'a dyn Registry,
        prompt: &'a dyn Prompt,
    ) -> Result<Self> {
        Ok(Self {
            identity: resolved.identity,
            trusted: resolved.trusted,
            firefox_override: resolved.firefox_override,
            secrets: Secrets::generate()?,
            runner,
            registry,
            prompt,
        })
    }

    pub fn layout(&self) -> Result<InstallLayout> {
        Ok(InstallLayout::new(self.identity.require_install_path()?))
    }
}
