//! Account connections for the source and destination side of a copy

use crate::error::Result as CliResult;
use anyhow::Context;
use rdsxfer_core::config::{Config, ProfileRole};
use rdsxfer_core::{Account, AccountCredentials};
use tracing::{debug, info};

/// Resolves credentials for each side of a copy and builds AWS-backed accounts
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Re-read the config file without expanding `${VAR}` references
    ///
    /// Commands that modify and save the config start from this copy, so
    /// references are written back untouched.
    pub fn load_for_edit(&self) -> CliResult<Config> {
        let config = match &self.config_path {
            Some(path) => Config::load_raw_from_path(path),
            None => Config::load_raw(),
        }
        .context("Failed to load configuration")?;
        Ok(config)
    }

    /// Save a configuration to the path this manager was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// The config file path shown to the user
    pub fn display_path(&self) -> Option<String> {
        self.config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| Config::config_path().ok().map(|p| p.display().to_string()))
    }

    /// Pick the credentials for one side of a copy
    ///
    /// An explicit `--*-profile` wins, then a `--*-credentials` triple (flag
    /// or environment), then the configured default profile.
    pub fn resolve_credentials(
        &self,
        role: ProfileRole,
        explicit_profile: Option<&str>,
        credentials: Option<&AccountCredentials>,
    ) -> CliResult<AccountCredentials> {
        if explicit_profile.is_none()
            && let Some(creds) = credentials
        {
            info!(%role, region = %creds.region, "Using credentials from command line or environment");
            return Ok(creds.clone());
        }

        let name = self.config.resolve_profile(role, explicit_profile)?;
        let profile = self.config.profile(&name)?;
        info!(%role, profile = %name, region = %profile.region, "Using profile");
        debug!(keyring = profile.uses_keyring(), "Resolving profile credentials");

        Ok(profile.resolve_credentials()?)
    }

    /// Build an account handle for one side of a copy
    pub async fn connect(
        &self,
        role: ProfileRole,
        explicit_profile: Option<&str>,
        credentials: Option<&AccountCredentials>,
    ) -> CliResult<Account> {
        let creds = self.resolve_credentials(role, explicit_profile, credentials)?;
        Ok(rdsxfer_core::aws::connect(&creds).await)
    }
}
