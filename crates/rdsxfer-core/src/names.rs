//! Resource naming for the copy workflow

use crate::account::AccountId;
use crate::error::{CoreError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const SNAPSHOT_SUFFIX: &str = "-snapshot";
const INSTANCE_SUFFIX: &str = "-rds";

/// Name of the snapshot taken of `cluster_id`
pub fn snapshot_name(cluster_id: &str) -> String {
    format!("{}{}", cluster_id, SNAPSHOT_SUFFIX)
}

/// Name of the instance attached to the restored `cluster_id`
pub fn instance_name(cluster_id: &str) -> String {
    format!("{}{}", cluster_id, INSTANCE_SUFFIX)
}

/// AWS partition a region belongs to
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else {
        "aws"
    }
}

/// Fully-qualified ARN of a cluster snapshot
///
/// Cross-account restores must reference the snapshot by ARN; the bare
/// identifier only resolves inside the owning account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArn {
    pub partition: String,
    pub region: String,
    pub account_id: String,
    pub snapshot: String,
}

impl SnapshotArn {
    pub fn new(region: &str, account_id: &AccountId, snapshot: &str) -> Self {
        Self {
            partition: partition_for_region(region).to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            snapshot: snapshot.to_string(),
        }
    }
}

impl fmt::Display for SnapshotArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:rds:{}:{}:cluster-snapshot:{}",
            self.partition, self.region, self.account_id, self.snapshot
        )
    }
}

// Serialized in its string form
impl Serialize for SnapshotArn {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for SnapshotArn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::Validation(format!("'{}' is not a cluster snapshot ARN", s));

        let parts: Vec<&str> = s.splitn(7, ':').collect();
        match parts.as_slice() {
            ["arn", partition, "rds", region, account, "cluster-snapshot", snapshot]
                if !region.is_empty() && !snapshot.is_empty() =>
            {
                let account_id: AccountId = account.parse().map_err(|_| invalid())?;
                Ok(Self {
                    partition: partition.to_string(),
                    region: region.to_string(),
                    account_id: account_id.to_string(),
                    snapshot: snapshot.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}
