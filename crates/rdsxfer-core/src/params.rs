//! Parameters for the cluster copy workflow
//!
//! Everything here is checked before the first remote call so that a typo or
//! an unfilled template never leaves an orphaned snapshot behind.

use crate::error::{CoreError, Result};
use crate::names::instance_name;
use std::time::Duration;

/// Longest identifier RDS accepts for clusters and instances
const MAX_IDENTIFIER_LEN: usize = 63;

/// Default DB subnet group for the new instance
pub const DEFAULT_SUBNET_GROUP: &str = "default";

/// How long to wait on each blocking step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Maximum time for the source snapshot to become available
    pub snapshot_timeout: Duration,
    /// Maximum time for the restored cluster to become available
    pub cluster_timeout: Duration,
    /// Maximum time for the new instance, when `wait_for_instance` is set
    pub instance_timeout: Duration,
    /// Time between status checks
    pub interval: Duration,
    /// Also wait for the new instance to become available
    pub wait_for_instance: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            snapshot_timeout: Duration::from_secs(3600),
            cluster_timeout: Duration::from_secs(3600),
            instance_timeout: Duration::from_secs(3600),
            interval: Duration::from_secs(30),
            wait_for_instance: false,
        }
    }
}

/// Parameters for copying one cluster
///
/// # Example
///
/// ```rust
/// use rdsxfer_core::CopyClusterParams;
///
/// let params = CopyClusterParams::new("orders-db", "aurora-postgresql", "15.4", "db.r6g.large")
///     .with_subnet_group("private")
///     .with_public_access(false);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyClusterParams {
    /// Cluster identifier, the same in both accounts
    pub cluster_id: String,
    /// Engine of the restored cluster (e.g. `aurora-mysql`)
    pub engine: String,
    pub engine_version: String,
    /// Instance class of the new instance (e.g. `db.r6g.large`)
    pub instance_class: String,
    /// DB subnet group chosen by the caller
    ///
    /// When set it is used for both the restored cluster and the instance.
    /// Otherwise the restore leaves the choice to RDS and the instance goes
    /// into [`DEFAULT_SUBNET_GROUP`].
    pub subnet_group: Option<String>,
    pub publicly_accessible: bool,
    pub wait: WaitOptions,
}

impl CopyClusterParams {
    /// Create params with required fields
    #[must_use]
    pub fn new(
        cluster_id: impl Into<String>,
        engine: impl Into<String>,
        engine_version: impl Into<String>,
        instance_class: impl Into<String>,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            engine: engine.into(),
            engine_version: engine_version.into(),
            instance_class: instance_class.into(),
            subnet_group: None,
            publicly_accessible: true,
            wait: WaitOptions::default(),
        }
    }

    #[must_use]
    pub fn with_subnet_group(mut self, subnet_group: impl Into<String>) -> Self {
        self.subnet_group = Some(subnet_group.into());
        self
    }

    /// Subnet group the new instance is created in
    pub fn instance_subnet_group(&self) -> &str {
        self.subnet_group.as_deref().unwrap_or(DEFAULT_SUBNET_GROUP)
    }

    #[must_use]
    pub fn with_public_access(mut self, publicly_accessible: bool) -> Self {
        self.publicly_accessible = publicly_accessible;
        self
    }

    #[must_use]
    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Check every input before anything is sent to AWS
    pub fn validate(&self) -> Result<()> {
        validate_identifier("cluster identifier", &self.cluster_id)?;
        validate_identifier("instance identifier", &instance_name(&self.cluster_id))?;

        for (field, value) in [
            ("engine", &self.engine),
            ("engine version", &self.engine_version),
            ("instance class", &self.instance_class),
        ] {
            require_value(field, value)?;
        }
        if let Some(subnet_group) = &self.subnet_group {
            require_value("subnet group", subnet_group)?;
        }

        let mut durations = vec![
            ("poll interval", self.wait.interval),
            ("snapshot timeout", self.wait.snapshot_timeout),
            ("cluster timeout", self.wait.cluster_timeout),
        ];
        if self.wait.wait_for_instance {
            durations.push(("instance timeout", self.wait.instance_timeout));
        }
        for (field, value) in durations {
            if value.is_zero() {
                return Err(CoreError::Validation(format!(
                    "{} must be greater than zero",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// True for unfilled `<...>` template values
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.contains('<') && v.contains('>')
}

fn require_value(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{} is required", field)));
    }
    if is_placeholder(value) {
        return Err(CoreError::Validation(format!(
            "{} still contains the placeholder '{}'",
            field, value
        )));
    }
    Ok(())
}

/// RDS identifier rules: 1-63 letters, digits or hyphens; starts with a
/// letter; no trailing hyphen and no two consecutive hyphens
pub fn validate_identifier(kind: &str, id: &str) -> Result<()> {
    let fail = |reason: &str| {
        Err(CoreError::Validation(format!(
            "invalid {} '{}': {}",
            kind, id, reason
        )))
    };

    if id.is_empty() {
        return fail("must not be empty");
    }
    if id.len() > MAX_IDENTIFIER_LEN {
        return fail(&format!("longer than {} characters", MAX_IDENTIFIER_LEN));
    }
    if !id.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return fail("must start with a letter");
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return fail("only letters, digits and hyphens are allowed");
    }
    if id.ends_with('-') {
        return fail("must not end with a hyphen");
    }
    if id.contains("--") {
        return fail("must not contain two consecutive hyphens");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CopyClusterParams {
        CopyClusterParams::new("orders-db", "aurora-postgresql", "15.4", "db.r6g.large")
    }

    #[test]
    fn test_default_instance_settings() {
        let p = params();
        assert_eq!(p.subnet_group, None);
        assert_eq!(p.instance_subnet_group(), "default");
        assert_eq!(
            params().with_subnet_group("private").instance_subnet_group(),
            "private"
        );
        assert!(p.publicly_accessible);
        assert!(!p.wait.wait_for_instance);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_placeholders_rejected() {
        let p = CopyClusterParams::new("orders-db", "<db-engine>", "15.4", "db.r6g.large");
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("engine"));

        let p = CopyClusterParams::new("orders-db", "aurora", "<database-engine>", "db.r6g.large");
        assert!(p.validate().is_err());

        let p = CopyClusterParams::new("orders-db", "aurora", "5.7", "<db instance type>");
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_missing_values_rejected() {
        let p = CopyClusterParams::new("orders-db", "", "15.4", "db.r6g.large");
        assert!(p.validate().unwrap_err().to_string().contains("required"));
    }

    #[test]
    fn test_zero_waits_rejected() {
        let mut wait = WaitOptions::default();
        wait.snapshot_timeout = Duration::ZERO;
        let err = params().with_wait(wait).validate().unwrap_err();
        assert!(err.to_string().contains("snapshot timeout"));

        let mut wait = WaitOptions::default();
        wait.cluster_timeout = Duration::ZERO;
        let err = params().with_wait(wait).validate().unwrap_err();
        assert!(err.to_string().contains("cluster timeout"));

        // Only checked when the instance is waited for
        let mut wait = WaitOptions::default();
        wait.instance_timeout = Duration::ZERO;
        assert!(params().with_wait(wait).validate().is_ok());
        wait.wait_for_instance = true;
        let err = params().with_wait(wait).validate().unwrap_err();
        assert!(err.to_string().contains("instance timeout"));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("cluster", "orders-db").is_ok());
        assert!(validate_identifier("cluster", "a").is_ok());
        assert!(validate_identifier("cluster", "").is_err());
        assert!(validate_identifier("cluster", "1orders").is_err());
        assert!(validate_identifier("cluster", "orders_db").is_err());
        assert!(validate_identifier("cluster", "orders-").is_err());
        assert!(validate_identifier("cluster", "orders--db").is_err());
        assert!(validate_identifier("cluster", &"a".repeat(64)).is_err());
    }

    #[test]
    fn test_instance_name_must_fit() {
        // 60 + "-rds" = 64 characters
        let p = CopyClusterParams::new("a".repeat(60), "aurora", "5.7", "db.r5.large");
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("instance identifier"));

        let p = CopyClusterParams::new("a".repeat(59), "aurora", "5.7", "db.r5.large");
        assert!(p.validate().is_ok());
    }
}
