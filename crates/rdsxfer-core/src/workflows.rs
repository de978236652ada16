//! Cross-account cluster copy workflow
//!
//! Composes the [`RdsApi`](crate::api::RdsApi) calls of two accounts into one
//! linear run:
//!
//! ```text
//! Init -> SnapshotCreating -> SnapshotAvailable -> SnapshotShared
//!      -> ClusterRestoring -> ClusterAvailable -> InstanceCreating -> Done
//! ```
//!
//! No step is retried and nothing is rolled back. A failure returns
//! [`CoreError::StepFailed`] carrying the stage that was reached, so the
//! caller can tell the operator what may need cleaning up.

use crate::account::{Account, AccountId};
use crate::api::{CreateInstanceRequest, RestoreClusterRequest};
use crate::error::{CoreError, Result};
use crate::names::{SnapshotArn, instance_name, snapshot_name};
use crate::params::{CopyClusterParams, DEFAULT_SUBNET_GROUP, WaitOptions};
use crate::progress::{ProgressCallback, ProgressEvent, emit, poll_until_available};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

/// Stages of a copy run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStage {
    Init,
    SnapshotCreating,
    SnapshotAvailable,
    SnapshotShared,
    ClusterRestoring,
    ClusterAvailable,
    InstanceCreating,
    Done,
}

impl CopyStage {
    /// Resources that exist once this stage has been entered and are not
    /// removed when the run fails
    pub fn leftovers(&self, plan: &CopyPlan) -> Vec<String> {
        let mut left = Vec::new();
        if *self >= CopyStage::SnapshotCreating {
            left.push(format!(
                "cluster snapshot {} in account {} ({})",
                plan.snapshot_name, plan.source_account_id, plan.source_region
            ));
        }
        if *self >= CopyStage::ClusterRestoring {
            left.push(format!(
                "cluster {} in account {} ({})",
                plan.cluster_id, plan.destination_account_id, plan.destination_region
            ));
        }
        if *self >= CopyStage::InstanceCreating {
            left.push(format!(
                "instance {} in account {} ({})",
                plan.instance_name, plan.destination_account_id, plan.destination_region
            ));
        }
        left
    }
}

impl fmt::Display for CopyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CopyStage::Init => "initialization",
            CopyStage::SnapshotCreating => "snapshot creation",
            CopyStage::SnapshotAvailable => "snapshot sharing",
            CopyStage::SnapshotShared => "snapshot shared",
            CopyStage::ClusterRestoring => "cluster restore",
            CopyStage::ClusterAvailable => "cluster available",
            CopyStage::InstanceCreating => "instance creation",
            CopyStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Everything a copy run will do, resolved before the first mutation
#[derive(Debug, Clone, Serialize)]
pub struct CopyPlan {
    pub cluster_id: String,
    pub source_account_id: AccountId,
    pub source_region: String,
    pub destination_account_id: AccountId,
    pub destination_region: String,
    pub snapshot_name: String,
    pub snapshot_arn: SnapshotArn,
    pub instance_name: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    /// Subnet group given by the caller, if any
    pub subnet_group: Option<String>,
    pub publicly_accessible: bool,
}

impl CopyPlan {
    pub fn restore_request(&self) -> RestoreClusterRequest {
        RestoreClusterRequest {
            cluster_id: self.cluster_id.clone(),
            snapshot_identifier: self.snapshot_arn.to_string(),
            engine: self.engine.clone(),
            engine_version: self.engine_version.clone(),
            subnet_group: self.subnet_group.clone(),
        }
    }

    pub fn instance_request(&self) -> CreateInstanceRequest {
        CreateInstanceRequest {
            instance_id: self.instance_name.clone(),
            cluster_id: self.cluster_id.clone(),
            instance_class: self.instance_class.clone(),
            engine: self.engine.clone(),
            engine_version: self.engine_version.clone(),
            subnet_group: self
                .subnet_group
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBNET_GROUP.to_string()),
            publicly_accessible: self.publicly_accessible,
        }
    }
}

/// Outcome of a successful copy run
#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    #[serde(flatten)]
    pub plan: CopyPlan,
    pub stage: CopyStage,
    pub cluster_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_status: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: u64,
}

/// Resolve both account identities and derive all names
///
/// Only identity lookups are made; nothing is created.
pub async fn plan_copy(
    source: &Account,
    destination: &Account,
    params: &CopyClusterParams,
) -> Result<CopyPlan> {
    params.validate()?;

    let source_account_id = source.resolve_account_id().await?;
    let destination_account_id = destination.resolve_account_id().await?;
    info!(source = %source_account_id, destination = %destination_account_id, "Resolved account ids");

    if source_account_id == destination_account_id {
        warn!(
            "Source and destination resolve to the same account {}",
            source_account_id
        );
    }

    let snapshot = snapshot_name(&params.cluster_id);
    let snapshot_arn = SnapshotArn::new(&source.region, &source_account_id, &snapshot);

    Ok(CopyPlan {
        cluster_id: params.cluster_id.clone(),
        source_account_id,
        source_region: source.region.clone(),
        destination_account_id,
        destination_region: destination.region.clone(),
        snapshot_name: snapshot,
        snapshot_arn,
        instance_name: instance_name(&params.cluster_id),
        engine: params.engine.clone(),
        engine_version: params.engine_version.clone(),
        instance_class: params.instance_class.clone(),
        subnet_group: params.subnet_group.clone(),
        publicly_accessible: params.publicly_accessible,
    })
}

/// Copy a cluster from `source` into `destination`
///
/// This workflow:
/// 1. Resolves both account ids
/// 2. Snapshots the source cluster and waits for the snapshot
/// 3. Shares the snapshot with the destination account
/// 4. Restores the cluster in the destination account and waits for it
/// 5. Creates the instance (and optionally waits for it)
///
/// # Example
///
/// ```rust,ignore
/// let params = CopyClusterParams::new("orders-db", "aurora-postgresql", "15.4", "db.r6g.large");
/// let report = copy_cluster(&source, &destination, &params, None).await?;
/// println!("Snapshot ARN: {}", report.plan.snapshot_arn);
/// ```
pub async fn copy_cluster(
    source: &Account,
    destination: &Account,
    params: &CopyClusterParams,
    on_progress: Option<ProgressCallback>,
) -> Result<CopyReport> {
    emit(&on_progress, ProgressEvent::Stage { stage: CopyStage::Init });
    let plan = plan_copy(source, destination, params)
        .await
        .map_err(|e| e.at_stage(CopyStage::Init))?;

    execute_plan(source, destination, plan, params.wait, on_progress).await
}

/// Run an already resolved [`CopyPlan`]
///
/// Used directly by callers that show the plan (or ask for confirmation)
/// before anything is created.
pub async fn execute_plan(
    source: &Account,
    destination: &Account,
    plan: CopyPlan,
    wait: WaitOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<CopyReport> {
    let started_at = Utc::now();
    let start = Instant::now();

    // Step 1: Snapshot the source cluster and wait for it
    let stage = enter(&on_progress, CopyStage::SnapshotCreating);
    info!(cluster = %plan.cluster_id, snapshot = %plan.snapshot_name, "Creating cluster snapshot");
    source
        .rds
        .create_cluster_snapshot(&plan.cluster_id, &plan.snapshot_name)
        .await
        .map_err(|e| e.at_stage(stage))?;

    poll_until_available(
        &format!("cluster snapshot {}", plan.snapshot_name),
        || source.rds.cluster_snapshot_status(&plan.snapshot_name),
        wait.snapshot_timeout,
        wait.interval,
        &on_progress,
    )
    .await
    .map_err(|e| e.at_stage(stage))?;

    // Step 2: Share it with the destination account
    let stage = enter(&on_progress, CopyStage::SnapshotAvailable);
    info!(snapshot = %plan.snapshot_name, account = %plan.destination_account_id, "Sharing snapshot");
    source
        .rds
        .share_cluster_snapshot(&plan.snapshot_name, &plan.destination_account_id)
        .await
        .map_err(|e| e.at_stage(stage))?;
    enter(&on_progress, CopyStage::SnapshotShared);
    info!(arn = %plan.snapshot_arn, "Cluster snapshot shared");

    // Step 3: Restore in the destination account and wait for the cluster
    let stage = enter(&on_progress, CopyStage::ClusterRestoring);
    info!(cluster = %plan.cluster_id, "Restoring cluster from snapshot");
    destination
        .rds
        .restore_cluster_from_snapshot(&plan.restore_request())
        .await
        .map_err(|e| e.at_stage(stage))?;

    let cluster_status = poll_until_available(
        &format!("cluster {}", plan.cluster_id),
        || destination.rds.cluster_status(&plan.cluster_id),
        wait.cluster_timeout,
        wait.interval,
        &on_progress,
    )
    .await
    .map_err(|e| e.at_stage(stage))?;
    enter(&on_progress, CopyStage::ClusterAvailable);

    // Step 4: Attach an instance
    let stage = enter(&on_progress, CopyStage::InstanceCreating);
    info!(instance = %plan.instance_name, "Creating DB instance");
    destination
        .rds
        .create_instance(&plan.instance_request())
        .await
        .map_err(|e| e.at_stage(stage))?;

    let instance_status = if wait.wait_for_instance {
        let status = poll_until_available(
            &format!("instance {}", plan.instance_name),
            || destination.rds.instance_status(&plan.instance_name),
            wait.instance_timeout,
            wait.interval,
            &on_progress,
        )
        .await
        .map_err(|e| e.at_stage(stage))?;
        Some(status)
    } else {
        None
    };

    let stage = enter(&on_progress, CopyStage::Done);
    let elapsed = start.elapsed();
    info!(elapsed_secs = elapsed.as_secs(), "Cluster copy finished");

    Ok(CopyReport {
        plan,
        stage,
        cluster_status,
        instance_status,
        started_at,
        finished_at: Utc::now(),
        elapsed_secs: elapsed.as_secs(),
    })
}

fn enter(on_progress: &Option<ProgressCallback>, stage: CopyStage) -> CopyStage {
    emit(on_progress, ProgressEvent::Stage { stage });
    stage
}

/// True when a failed run created nothing in either account
pub fn is_clean_failure(err: &CoreError) -> bool {
    err.stage().is_none_or(|s| s == CopyStage::Init)
}
