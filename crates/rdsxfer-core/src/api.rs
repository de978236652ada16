//! Service seams used by the copy workflow
//!
//! The workflow only talks to these traits. [`crate::aws`] implements them on
//! top of the AWS SDK; tests implement them with in-memory fakes.

use crate::account::AccountId;
use crate::error::Result;
use async_trait::async_trait;

/// Parameters for `RestoreDBClusterFromSnapshot`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreClusterRequest {
    pub cluster_id: String,
    /// Fully-qualified snapshot ARN (required for cross-account restores)
    pub snapshot_identifier: String,
    pub engine: String,
    pub engine_version: String,
    /// Only sent when the caller picked one
    pub subnet_group: Option<String>,
}

/// Parameters for `CreateDBInstance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInstanceRequest {
    pub instance_id: String,
    pub cluster_id: String,
    pub instance_class: String,
    pub engine: String,
    pub engine_version: String,
    pub subnet_group: String,
    pub publicly_accessible: bool,
}

/// RDS control-plane operations
///
/// The `*_status` methods return `Ok(None)` when the resource does not exist.
#[async_trait]
pub trait RdsApi: Send + Sync {
    async fn create_cluster_snapshot(&self, cluster_id: &str, snapshot_id: &str) -> Result<()>;

    async fn cluster_snapshot_status(&self, snapshot_id: &str) -> Result<Option<String>>;

    /// Grant `restore` on a manual cluster snapshot to another account
    async fn share_cluster_snapshot(&self, snapshot_id: &str, account_id: &AccountId)
    -> Result<()>;

    async fn restore_cluster_from_snapshot(&self, request: &RestoreClusterRequest) -> Result<()>;

    async fn cluster_status(&self, cluster_id: &str) -> Result<Option<String>>;

    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<()>;

    async fn instance_status(&self, instance_id: &str) -> Result<Option<String>>;
}

/// Caller identity lookup
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// The account id of the credentials in use
    async fn caller_account_id(&self) -> Result<String>;
}
