//! Per-invocation state shared by the commands: target, settings and the
//! concrete clients built from them.

use crate::git::GitCli;
use crate::http::{ApiClient, ApiError};
use crate::output::Spinner;
use crate::prompt::TerminalPrompter;
use anyhow::{Context as _, Result};
use nebe_core::contract::AccountsApi;
use nebe_core::environment::{ServiceUrls, Target};
use nebe_core::model::User;
use nebe_core::settings::Settings;
use std::path::PathBuf;

pub struct Context {
    pub target: Target,
    pub urls: ServiceUrls,
    pub settings: Settings,
    pub debug: bool,
}

impl Context {
    /// Opens the settings file at its default location.
    pub fn load(target: Target, debug: bool) -> Result<Self> {
        let path = Settings::default_path()?;
        let settings = Settings::open(&path, target.tenant)
            .with_context(|| format!("failed to load settings from {}", path.display()))?;
        Ok(Self::new(target, settings, debug))
    }

    pub fn new(target: Target, settings: Settings, debug: bool) -> Self {
        Self {
            urls: target.urls(),
            target,
            settings,
            debug,
        }
    }

    pub fn root(&self) -> Result<PathBuf> {
        Ok(self.settings.root()?)
    }

    /// Client carrying the cached token and git credentials.
    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.urls.clone(), self.target.command("login"))
            .with_token(self.settings.access_token())
            .with_credentials(self.settings.username(), self.settings.password())
    }

    pub fn git(&self) -> GitCli {
        GitCli::new()
    }

    pub fn prompter(&self) -> TerminalPrompter {
        TerminalPrompter::new()
    }

    pub fn spinner(&self, label: impl Into<String>) -> Spinner {
        Spinner::start(label, self.debug)
    }

    /// Refreshes the stored user from the accounts service. Commands that
    /// need a logged-in user call this first.
    pub async fn authenticate(&mut self, accounts: &dyn AccountsApi) -> Result<User> {
        if self.settings.access_token().is_none() {
            return Err(ApiError::NotLoggedIn(self.target.command("login")).into());
        }
        let user = accounts
            .user()
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to load the logged in user")?;
        tracing::debug!(user_id = user.id, "Authenticated");
        self.settings.set_user(&user);
        self.save()?;
        Ok(user)
    }

    pub fn save(&self) -> Result<()> {
        Ok(self.settings.save()?)
    }
}
