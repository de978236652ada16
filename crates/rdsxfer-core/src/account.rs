//! AWS account credentials, identities and handles

use crate::api::{IdentityApi, RdsApi};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Static access-key credentials bound to a region
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl AccountCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Check that no field is empty or an unfilled `<...>` template
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("access key id", &self.access_key_id),
            ("secret access key", &self.secret_access_key),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{} must not be empty", field)));
            }
            if crate::params::is_placeholder(value) {
                return Err(CoreError::Validation(format!(
                    "{} still contains the placeholder '{}'",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

// Never print the secret
impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

/// Parses `ACCESS_KEY:SECRET_KEY:REGION`
impl FromStr for AccountCredentials {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        let [access_key_id, secret_access_key, region] = parts.as_slice() else {
            return Err(CoreError::Validation(format!(
                "expected ACCESS_KEY:SECRET_KEY:REGION, got {} field(s)",
                parts.len()
            )));
        };
        let creds = Self::new(*access_key_id, *secret_access_key, *region);
        creds.validate()?;
        Ok(creds)
    }
}

/// A 12-digit AWS account id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::Validation(format!(
                "'{}' is not a 12-digit AWS account id",
                s
            )))
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the workflow needs to act inside one account
pub struct Account {
    pub region: String,
    pub rds: Box<dyn RdsApi>,
    pub identity: Box<dyn IdentityApi>,
}

impl Account {
    pub fn new(
        region: impl Into<String>,
        rds: Box<dyn RdsApi>,
        identity: Box<dyn IdentityApi>,
    ) -> Self {
        Self {
            region: region.into(),
            rds,
            identity,
        }
    }

    /// Resolve the account id of the caller
    pub async fn resolve_account_id(&self) -> Result<AccountId> {
        let raw = self.identity.caller_account_id().await?;
        raw.parse()
    }
}
