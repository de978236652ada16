//! Configuration management for rdsxfer
//!
//! Configuration is stored in TOML format with one named profile per AWS
//! account, plus defaults for the `copy` command.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use crate::account::AccountCredentials;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used for the account that owns the cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_source: Option<String>,
    /// Profile used for the account that receives the copy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_destination: Option<String>,
    /// Fallback values for `copy` flags
    #[serde(default)]
    pub copy: CopyDefaults,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// One AWS account
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    pub access_key_id: String,
    /// Plaintext or a `keyring:` reference
    pub secret_access_key: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Values used when the matching `copy` flag is not given
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct CopyDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
}

/// Which side of a copy a profile is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRole {
    Source,
    Destination,
}

impl fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileRole::Source => write!(f, "source"),
            ProfileRole::Destination => write!(f, "destination"),
        }
    }
}

impl Profile {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            description: None,
        }
    }

    /// Get resolved credentials (with keyring support)
    pub fn resolve_credentials(&self) -> Result<AccountCredentials> {
        let store = CredentialStore::default();

        let access_key_id = store.get_credential(&self.access_key_id).map_err(|e| {
            ConfigError::CredentialError(format!("Failed to resolve access key id: {}", e))
        })?;
        let secret_access_key = store.get_credential(&self.secret_access_key).map_err(|e| {
            ConfigError::CredentialError(format!("Failed to resolve secret access key: {}", e))
        })?;

        let credentials = AccountCredentials::new(access_key_id, secret_access_key, &self.region);
        credentials
            .validate()
            .map_err(|e| ConfigError::CredentialError(e.to_string()))?;
        Ok(credentials)
    }

    /// Check if the secret lives in the OS keyring
    pub fn uses_keyring(&self) -> bool {
        CredentialStore::is_keyring_reference(&self.secret_access_key)
    }
}

impl Config {
    /// The configured default profile for a role
    pub fn default_for(&self, role: ProfileRole) -> Option<&str> {
        match role {
            ProfileRole::Source => self.default_source.as_deref(),
            ProfileRole::Destination => self.default_destination.as_deref(),
        }
    }

    /// Set the default profile for a role
    ///
    /// Fails if no profile with that name exists.
    pub fn set_default(&mut self, role: ProfileRole, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            return Err(ConfigError::ProfileNotFound {
                name: name.to_string(),
            });
        }
        let slot = match role {
            ProfileRole::Source => &mut self.default_source,
            ProfileRole::Destination => &mut self.default_destination,
        };
        *slot = Some(name.to_string());
        Ok(())
    }

    /// Resolve the profile name to use for a role
    ///
    /// An explicit name wins, then the role default. There is no implicit
    /// fallback to "the first profile": picking the wrong account silently
    /// would copy into or out of the wrong place.
    pub fn resolve_profile(&self, role: ProfileRole, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            return Ok(profile_name.to_string());
        }

        if let Some(default) = self.default_for(role) {
            return Ok(default.to_string());
        }

        let flag = match role {
            ProfileRole::Source => "--source",
            ProfileRole::Destination => "--dest",
        };
        let names: Vec<&str> = self.list_profiles().into_iter().map(|(n, _)| n.as_str()).collect();
        let suggestion = if names.is_empty() {
            format!(
                "Use 'rdsxfer profile set' to create a profile, or pass {}-credentials KEY:SECRET:REGION.",
                flag
            )
        } else {
            format!(
                "Available profiles: {}. Pass {}-profile <name> or run 'rdsxfer profile default-{} <name>'.",
                names.join(", "),
                flag,
                match role {
                    ProfileRole::Source => "source",
                    ProfileRole::Destination => "dest",
                }
            )
        };
        Err(ConfigError::NoProfileForRole {
            role: role.to_string(),
            suggestion,
        })
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        Self::read_from_path(config_path, true)
    }

    /// Load configuration without expanding `${VAR}` references
    ///
    /// Use this for anything that saves the config back: the references
    /// must be written out as they were, never their values.
    pub fn load_raw_from_path(config_path: &Path) -> Result<Self> {
        Self::read_from_path(config_path, false)
    }

    /// Load unexpanded configuration from the standard location
    pub fn load_raw() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_raw_from_path(&config_path)
    }

    fn read_from_path(config_path: &Path, expand: bool) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Config::default());
        }

        let config: Config = if expand {
            toml::from_str(&Self::expand_env_vars(&content))?
        } else {
            toml::from_str(&content)?
        };

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_source.as_deref() == Some(name) {
            self.default_source = None;
        }
        if self.default_destination.as_deref() == Some(name) {
            self.default_destination = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS `~/.config/rdsxfer/config.toml` is preferred when that
    /// directory exists, otherwise the platform location is used:
    ///
    /// - Linux: `~/.config/rdsxfer/config.toml`
    /// - macOS: `~/Library/Application Support/com.rdsxfer.rdsxfer/config.toml`
    /// - Windows: `%APPDATA%\rdsxfer\rdsxfer\config.toml`
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("rdsxfer")
                    .join("config.toml");

                if linux_style_path
                    .parent()
                    .is_some_and(|p| p.exists())
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "rdsxfer", "rdsxfer").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as-is so profiles that
    /// are not used never fail to load.
    ///
    /// ```toml
    /// [profiles.prod]
    /// access_key_id = "${PROD_AWS_ACCESS_KEY_ID}"
    /// secret_access_key = "${PROD_AWS_SECRET_ACCESS_KEY}"
    /// region = "${PROD_AWS_REGION:-us-east-1}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(key: &str, region: &str) -> Profile {
        Profile::new(key, "secret", region)
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_profile("prod".to_string(), profile("AKIAPROD", "us-east-1"));
        config.default_source = Some("prod".to_string());
        config.copy.engine = Some("aurora-postgresql".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.default_source, deserialized.default_source);
        assert_eq!(config.copy, deserialized.copy);
        assert_eq!(deserialized.profiles["prod"].access_key_id, "AKIAPROD");
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
default_source = "prod"
default_destination = "staging"

[copy]
engine = "aurora-mysql"
engine_version = "8.0.mysql_aurora.3.05.2"
instance_class = "db.r6g.large"
poll_interval_secs = 15

[profiles.prod]
access_key_id = "AKIAPROD"
secret_access_key = "prod-secret"
region = "us-east-1"
description = "Production"

[profiles.staging]
access_key_id = "AKIASTAGE"
secret_access_key = "stage-secret"
region = "eu-west-1"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.copy.poll_interval_secs, Some(15));
        assert_eq!(config.copy.subnet_group, None);
        assert_eq!(
            config.profiles["prod"].description.as_deref(),
            Some("Production")
        );
    }

    #[test]
    fn test_resolve_profile_order() {
        let mut config = Config::default();
        config.set_profile("a".to_string(), profile("AKIAA", "us-east-1"));
        config.set_profile("b".to_string(), profile("AKIAB", "us-west-2"));
        config.default_source = Some("a".to_string());

        assert_eq!(
            config.resolve_profile(ProfileRole::Source, Some("b")).unwrap(),
            "b"
        );
        assert_eq!(config.resolve_profile(ProfileRole::Source, None).unwrap(), "a");
    }

    #[test]
    fn test_no_default_is_an_error() {
        let mut config = Config::default();
        config.set_profile("a".to_string(), profile("AKIAA", "us-east-1"));

        let err = config
            .resolve_profile(ProfileRole::Destination, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoProfileForRole { .. }));
        let msg = err.to_string();
        assert!(msg.contains("destination"));
        assert!(msg.contains("Available profiles: a"));
    }

    #[test]
    fn test_no_profiles_suggests_profile_set() {
        let err = Config::default()
            .resolve_profile(ProfileRole::Source, None)
            .unwrap_err();
        assert!(err.to_string().contains("rdsxfer profile set"));
    }

    #[test]
    fn test_set_default_requires_profile() {
        let mut config = Config::default();
        assert!(matches!(
            config.set_default(ProfileRole::Source, "missing"),
            Err(ConfigError::ProfileNotFound { .. })
        ));

        config.set_profile("prod".to_string(), profile("AKIAPROD", "us-east-1"));
        config.set_default(ProfileRole::Destination, "prod").unwrap();
        assert_eq!(config.default_for(ProfileRole::Destination), Some("prod"));
        assert_eq!(config.default_for(ProfileRole::Source), None);
    }

    #[test]
    fn test_remove_profile_clears_defaults() {
        let mut config = Config::default();
        config.set_profile("prod".to_string(), profile("AKIAPROD", "us-east-1"));
        config.default_source = Some("prod".to_string());
        config.default_destination = Some("prod".to_string());

        assert!(config.remove_profile("prod").is_some());
        assert!(config.default_source.is_none());
        assert!(config.default_destination.is_none());
        assert!(config.remove_profile("prod").is_none());
    }

    #[test]
    fn test_list_profiles_sorted() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), profile("AKIAZ", "us-east-1"));
        config.set_profile("alpha".to_string(), profile("AKIAA", "us-east-1"));

        let names: Vec<_> = config.list_profiles().into_iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_resolve_credentials_plaintext() {
        let creds = Profile::new("AKIAPROD", "s3cret", "us-east-1")
            .resolve_credentials()
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIAPROD");
        assert_eq!(creds.secret_access_key, "s3cret");
        assert_eq!(creds.region, "us-east-1");
    }

    #[test]
    fn test_resolve_credentials_rejects_placeholder() {
        let err = Profile::new("<access_key_id>", "s3cret", "us-east-1")
            .resolve_credentials()
            .unwrap_err();
        assert!(matches!(err, ConfigError::CredentialError(_)));
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("RDSXFER_TEST_KEY", "AKIAEXPANDED");
            std::env::remove_var("RDSXFER_TEST_REGION");
        }

        let content = r#"
[profiles.prod]
access_key_id = "${RDSXFER_TEST_KEY}"
secret_access_key = "${RDSXFER_TEST_UNSET_SECRET}"
region = "${RDSXFER_TEST_REGION:-ap-south-1}"
"#;

        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("AKIAEXPANDED"));
        assert!(expanded.contains("ap-south-1"));
        assert!(expanded.contains("${RDSXFER_TEST_UNSET_SECRET}"));

        unsafe {
            std::env::remove_var("RDSXFER_TEST_KEY");
        }
    }

    #[test]
    fn test_profile_role_display() {
        assert_eq!(ProfileRole::Source.to_string(), "source");
        assert_eq!(ProfileRole::Destination.to_string(), "destination");
    }
}
