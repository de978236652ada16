//! Progress tracking and status polling for long-running RDS operations
//!
//! RDS mutations return immediately and the resource moves through a series
//! of statuses. This module polls a status until it reaches `available`,
//! with optional progress callbacks for UI updates.

use crate::error::{CoreError, Result};
use crate::workflows::CopyStage;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Progress events emitted during the copy workflow
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The workflow entered a new stage
    Stage { stage: CopyStage },
    /// Polling iteration with current status
    Polling {
        resource: String,
        status: String,
        elapsed: Duration,
    },
    /// Resource reached `available`
    Available { resource: String, elapsed: Duration },
    /// Resource reached a failed state or the wait gave up
    Failed { resource: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive its spinner.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

const AVAILABLE: &str = "available";

/// Statuses from which a resource will never become available on its own
const FAILED_STATUSES: &[&str] = &[
    "failed",
    "error",
    "deleting",
    "deleted",
    "incompatible-restore",
    "incompatible-parameters",
    "incompatible-network",
    "incompatible-option-group",
    "inaccessible-encryption-credentials",
    "inaccessible-encryption-credentials-recoverable",
    "restore-error",
    "storage-full",
];

/// Poll `describe` until it reports `available`
///
/// `describe` returns the current status, or `None` if the resource does not
/// exist. Returns the final status, or an error if the resource failed,
/// vanished, or did not become available within `timeout`.
///
/// # Example
///
/// ```rust,ignore
/// use rdsxfer_core::poll_until_available;
/// use std::time::Duration;
///
/// poll_until_available(
///     "cluster orders-db",
///     || account.rds.cluster_status("orders-db"),
///     Duration::from_secs(3600),
///     Duration::from_secs(30),
///     &None,
/// )
/// .await?;
/// ```
pub async fn poll_until_available<F, Fut>(
    resource: &str,
    mut describe: F,
    timeout: Duration,
    interval: Duration,
    on_progress: &Option<ProgressCallback>,
) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    let start = Instant::now();

    loop {
        let elapsed = start.elapsed();

        let Some(status) = describe().await? else {
            emit(
                on_progress,
                ProgressEvent::Failed {
                    resource: resource.to_string(),
                    error: "not found".to_string(),
                },
            );
            return Err(CoreError::NotFound(resource.to_string()));
        };

        debug!(resource, status = %status, elapsed_secs = elapsed.as_secs(), "Polled status");
        emit(
            on_progress,
            ProgressEvent::Polling {
                resource: resource.to_string(),
                status: status.clone(),
                elapsed,
            },
        );

        let normalized = status.to_lowercase();
        if normalized == AVAILABLE {
            emit(
                on_progress,
                ProgressEvent::Available {
                    resource: resource.to_string(),
                    elapsed,
                },
            );
            return Ok(status);
        }
        if FAILED_STATUSES.contains(&normalized.as_str()) {
            emit(
                on_progress,
                ProgressEvent::Failed {
                    resource: resource.to_string(),
                    error: format!("status {}", status),
                },
            );
            return Err(CoreError::ResourceFailed {
                resource: resource.to_string(),
                status,
            });
        }

        // The status is always checked once before the deadline applies
        if start.elapsed() >= timeout {
            emit(
                on_progress,
                ProgressEvent::Failed {
                    resource: resource.to_string(),
                    error: format!("timed out after {}s", timeout.as_secs()),
                },
            );
            return Err(CoreError::Timeout {
                resource: resource.to_string(),
                waited: timeout,
            });
        }

        tokio::time::sleep(interval).await;
    }
}

/// Helper to emit progress events
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
