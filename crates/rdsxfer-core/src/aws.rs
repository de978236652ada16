//! AWS SDK implementations of [`RdsApi`] and [`IdentityApi`]

use crate::account::{Account, AccountCredentials, AccountId};
use crate::api::{CreateInstanceRequest, IdentityApi, RdsApi, RestoreClusterRequest};
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_rds::error::ProvideErrorMetadata;
use tracing::{debug, trace};

/// Provider name attached to the static credentials
const PROVIDER_NAME: &str = "rdsxfer";

/// Attribute that controls who may restore a manual snapshot
const RESTORE_ATTRIBUTE: &str = "restore";

/// Build an [`Account`] whose clients use the given static credentials
pub async fn connect(credentials: &AccountCredentials) -> Account {
    debug!(region = %credentials.region, "Creating AWS session");
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(credentials.region.clone()))
        .credentials_provider(Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            PROVIDER_NAME,
        ))
        .load()
        .await;

    Account::new(
        credentials.region.clone(),
        Box::new(SdkRds::new(aws_sdk_rds::Client::new(&sdk_config))),
        Box::new(SdkIdentity::new(aws_sdk_sts::Client::new(&sdk_config))),
    )
}

/// RDS client wrapper
#[derive(Clone)]
pub struct SdkRds {
    client: aws_sdk_rds::Client,
}

impl SdkRds {
    pub fn new(client: aws_sdk_rds::Client) -> Self {
        Self { client }
    }
}

/// Treat the given "not found" fault codes as an absent resource
fn absent_on<T, E>(result: std::result::Result<T, E>, codes: &[&str]) -> std::result::Result<Option<T>, E>
where
    E: ProvideErrorMetadata,
{
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.code().is_some_and(|c| codes.contains(&c)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl RdsApi for SdkRds {
    async fn create_cluster_snapshot(&self, cluster_id: &str, snapshot_id: &str) -> Result<()> {
        trace!(cluster_id, snapshot_id, "CreateDBClusterSnapshot");
        self.client
            .create_db_cluster_snapshot()
            .db_cluster_identifier(cluster_id)
            .db_cluster_snapshot_identifier(snapshot_id)
            .send()
            .await
            .map_err(|e| CoreError::from_sdk("rds", "CreateDBClusterSnapshot", e))?;
        Ok(())
    }

    async fn cluster_snapshot_status(&self, snapshot_id: &str) -> Result<Option<String>> {
        let output = absent_on(
            self.client
                .describe_db_cluster_snapshots()
                .db_cluster_snapshot_identifier(snapshot_id)
                .send()
                .await,
            &["DBClusterSnapshotNotFoundFault"],
        )
        .map_err(|e| CoreError::from_sdk("rds", "DescribeDBClusterSnapshots", e))?;

        Ok(output.and_then(|o| {
            o.db_cluster_snapshots()
                .first()
                .and_then(|s| s.status())
                .map(str::to_string)
        }))
    }

    async fn share_cluster_snapshot(
        &self,
        snapshot_id: &str,
        account_id: &AccountId,
    ) -> Result<()> {
        trace!(snapshot_id, %account_id, "ModifyDBClusterSnapshotAttribute");
        self.client
            .modify_db_cluster_snapshot_attribute()
            .db_cluster_snapshot_identifier(snapshot_id)
            .attribute_name(RESTORE_ATTRIBUTE)
            .values_to_add(account_id.as_str())
            .send()
            .await
            .map_err(|e| CoreError::from_sdk("rds", "ModifyDBClusterSnapshotAttribute", e))?;
        Ok(())
    }

    async fn restore_cluster_from_snapshot(&self, request: &RestoreClusterRequest) -> Result<()> {
        trace!(?request, "RestoreDBClusterFromSnapshot");
        self.client
            .restore_db_cluster_from_snapshot()
            .db_cluster_identifier(&request.cluster_id)
            .snapshot_identifier(&request.snapshot_identifier)
            .engine(&request.engine)
            .engine_version(&request.engine_version)
            .set_db_subnet_group_name(request.subnet_group.clone())
            .send()
            .await
            .map_err(|e| CoreError::from_sdk("rds", "RestoreDBClusterFromSnapshot", e))?;
        Ok(())
    }

    async fn cluster_status(&self, cluster_id: &str) -> Result<Option<String>> {
        let output = absent_on(
            self.client
                .describe_db_clusters()
                .db_cluster_identifier(cluster_id)
                .send()
                .await,
            &["DBClusterNotFoundFault"],
        )
        .map_err(|e| CoreError::from_sdk("rds", "DescribeDBClusters", e))?;

        Ok(output.and_then(|o| {
            o.db_clusters()
                .first()
                .and_then(|c| c.status())
                .map(str::to_string)
        }))
    }

    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<()> {
        trace!(?request, "CreateDBInstance");
        self.client
            .create_db_instance()
            .db_instance_identifier(&request.instance_id)
            .db_cluster_identifier(&request.cluster_id)
            .db_instance_class(&request.instance_class)
            .engine(&request.engine)
            .engine_version(&request.engine_version)
            .db_subnet_group_name(&request.subnet_group)
            .publicly_accessible(request.publicly_accessible)
            .send()
            .await
            .map_err(|e| CoreError::from_sdk("rds", "CreateDBInstance", e))?;
        Ok(())
    }

    async fn instance_status(&self, instance_id: &str) -> Result<Option<String>> {
        let output = absent_on(
            self.client
                .describe_db_instances()
                .db_instance_identifier(instance_id)
                .send()
                .await,
            &["DBInstanceNotFound", "DBInstanceNotFoundFault"],
        )
        .map_err(|e| CoreError::from_sdk("rds", "DescribeDBInstances", e))?;

        Ok(output.and_then(|o| {
            o.db_instances()
                .first()
                .and_then(|i| i.db_instance_status())
                .map(str::to_string)
        }))
    }
}

/// STS client wrapper
#[derive(Clone)]
pub struct SdkIdentity {
    client: aws_sdk_sts::Client,
}

impl SdkIdentity {
    pub fn new(client: aws_sdk_sts::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityApi for SdkIdentity {
    async fn caller_account_id(&self) -> Result<String> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| CoreError::from_sdk("sts", "GetCallerIdentity", e))?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| CoreError::NotFound("account id in GetCallerIdentity response".to_string()))
    }
}
