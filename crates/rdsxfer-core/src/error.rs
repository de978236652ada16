//! Unified error handling for rdsxfer-core
//!
//! AWS SDK errors are flattened into [`CoreError::Aws`] so callers can inspect
//! the service error code without depending on every SDK crate.
//!
//! # Example
//!
//! ```rust
//! use rdsxfer_core::CoreError;
//!
//! let err = CoreError::aws_fault("rds", "RestoreDBClusterFromSnapshot", "DBClusterAlreadyExistsFault", "exists");
//! assert!(err.is_conflict());
//! assert!(!err.is_timeout());
//! ```

use crate::workflows::CopyStage;
use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::time::Duration;
use thiserror::Error;

/// Core error type for the copy workflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// A call to an AWS service failed
    #[error("{service} {operation} failed: {message}")]
    Aws {
        service: &'static str,
        operation: &'static str,
        code: Option<String>,
        message: String,
    },

    /// A resource did not become available in time
    #[error("Timed out after {}s waiting for {resource} to become available", waited.as_secs())]
    Timeout { resource: String, waited: Duration },

    /// A resource reached a terminal state other than `available`
    #[error("{resource} entered status '{status}'")]
    ResourceFailed { resource: String, status: String },

    /// A resource disappeared while being waited on
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input detected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// A workflow step failed; `stage` is the last stage that was entered
    #[error("Copy failed during {stage}: {source}")]
    StepFailed {
        stage: CopyStage,
        #[source]
        source: Box<CoreError>,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Build an `Aws` error from its parts
    pub fn aws_fault(
        service: &'static str,
        operation: &'static str,
        code: &str,
        message: &str,
    ) -> Self {
        CoreError::Aws {
            service,
            operation,
            code: Some(code.to_string()),
            message: message.to_string(),
        }
    }

    /// Convert an SDK error, keeping the service error code
    pub fn from_sdk<E, R>(
        service: &'static str,
        operation: &'static str,
        err: SdkError<E, R>,
    ) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        let code = err.code().map(str::to_string);
        let message = match err.message().map(str::to_string) {
            Some(m) => m,
            None => DisplayErrorContext(err).to_string(),
        };
        CoreError::Aws {
            service,
            operation,
            code,
            message,
        }
    }

    /// Wrap this error with the workflow stage it happened in
    pub fn at_stage(self, stage: CopyStage) -> Self {
        match self {
            // Keep the innermost stage
            CoreError::StepFailed { .. } => self,
            other => CoreError::StepFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping `StepFailed` wrappers
    pub fn root(&self) -> &CoreError {
        match self {
            CoreError::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage a workflow failed in, if known
    pub fn stage(&self) -> Option<CopyStage> {
        match self {
            CoreError::StepFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The AWS error code, if this came from an AWS call
    pub fn aws_code(&self) -> Option<&str> {
        match self.root() {
            CoreError::Aws { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns true if a resource was missing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            CoreError::NotFound(_) => true,
            CoreError::Aws { .. } => self
                .aws_code()
                .is_some_and(|c| c.contains("NotFound")),
            _ => false,
        }
    }

    /// Returns true if the credentials were rejected or lack permission
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.aws_code(),
            Some(
                "InvalidClientTokenId"
                    | "SignatureDoesNotMatch"
                    | "AccessDenied"
                    | "AccessDeniedException"
                    | "UnrecognizedClientException"
                    | "ExpiredToken"
                    | "AuthFailure"
            )
        )
    }

    /// Returns true if a resource with the same identifier already exists
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.aws_code().is_some_and(|c| c.contains("AlreadyExists"))
    }

    /// Returns true if AWS throttled the request
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        matches!(
            self.aws_code(),
            Some("Throttling" | "ThrottlingException" | "RequestLimitExceeded")
        )
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), CoreError::Timeout { .. })
    }

    /// Returns true if input validation failed
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), CoreError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aws_fault_helpers() {
        let err = CoreError::aws_fault(
            "rds",
            "CreateDBClusterSnapshot",
            "DBClusterNotFoundFault",
            "DBCluster orders-db not found.",
        );
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert_eq!(err.aws_code(), Some("DBClusterNotFoundFault"));

        let err = CoreError::aws_fault("sts", "GetCallerIdentity", "InvalidClientTokenId", "bad");
        assert!(err.is_unauthorized());

        let err = CoreError::aws_fault("rds", "CreateDBInstance", "DBInstanceAlreadyExists", "x");
        assert!(err.is_conflict());

        let err = CoreError::aws_fault("rds", "DescribeDBClusters", "Throttling", "slow down");
        assert!(err.is_throttled());
    }

    #[test]
    fn test_timeout() {
        let err = CoreError::Timeout {
            resource: "cluster snapshot orders-db-snapshot".to_string(),
            waited: Duration::from_secs(1800),
        };
        assert!(err.is_timeout());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("1800s"));
    }

    #[test]
    fn test_step_failed_delegates_to_root() {
        let err = CoreError::aws_fault("rds", "RestoreDBClusterFromSnapshot", "DBClusterAlreadyExistsFault", "x")
            .at_stage(CopyStage::ClusterRestoring);
        assert!(err.is_conflict());
        assert_eq!(err.stage(), Some(CopyStage::ClusterRestoring));
        assert!(err.to_string().contains("Copy failed during"));
    }

    #[test]
    fn test_at_stage_keeps_innermost_stage() {
        let err = CoreError::Validation("bad".to_string())
            .at_stage(CopyStage::SnapshotCreating)
            .at_stage(CopyStage::Done);
        assert_eq!(err.stage(), Some(CopyStage::SnapshotCreating));
        assert!(err.is_validation());
    }
}
