//! # rdsxfer-core
//!
//! Shared engine for copying an Aurora/RDS cluster from one AWS account to
//! another. The CLI is a thin layer over this crate.
//!
//! ## Layers
//!
//! - [`config`] - TOML config with named account profiles
//! - [`account`] - credential triples, account ids, and account handles
//! - [`api`] - the `RdsApi` / `IdentityApi` seams the workflow talks to
//! - [`aws`] - SDK-backed implementations of those seams
//! - [`names`] - snapshot/instance naming and snapshot ARNs
//! - [`params`] - validated copy parameters
//! - [`progress`] - status polling with progress callbacks
//! - [`workflows`] - the copy orchestration itself
//!
//! ## Example
//!
//! ```rust,ignore
//! use rdsxfer_core::{AccountCredentials, CopyClusterParams, aws, copy_cluster};
//!
//! let source = aws::connect(&"AKIA...:secret:us-east-1".parse()?).await;
//! let dest = aws::connect(&"AKIA...:secret:eu-west-1".parse()?).await;
//!
//! let params = CopyClusterParams::new("orders-db", "aurora-postgresql", "15.4", "db.r6g.large");
//! let report = copy_cluster(&source, &dest, &params, None).await?;
//! println!("{}", report.plan.snapshot_arn);
//! ```

pub mod account;
pub mod api;
pub mod aws;
pub mod config;
pub mod error;
pub mod names;
pub mod params;
pub mod progress;
pub mod workflows;

pub use account::{Account, AccountCredentials, AccountId};
pub use api::{CreateInstanceRequest, IdentityApi, RdsApi, RestoreClusterRequest};
pub use config::{Config, ConfigError, Profile};
pub use error::{CoreError, Result};
pub use names::{SnapshotArn, instance_name, snapshot_name};
pub use params::{CopyClusterParams, WaitOptions};
pub use progress::{ProgressCallback, ProgressEvent, poll_until_available};
pub use workflows::{CopyPlan, CopyReport, CopyStage, copy_cluster, execute_plan, plan_copy};
