//! Convergence waiter
//!
//! Blocks the calling step until an asynchronous provider operation reaches
//! a terminal state. Waits are always bounded: running out of attempts is an
//! error, never a silent success.

use crate::error::{CloudError, Result};
use crate::provider::{StackApi, StackStatus, WaitConfig};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Where stack creation ended up
#[derive(Debug, Clone, PartialEq, Eq)]
enum CreatePhase {
    Complete,
    RollingBack(String),
}

/// Wait for a stack created with on-failure deletion to converge.
///
/// * `CREATE_COMPLETE` → `Ok(())`
/// * creation failed, stack deleted → [`CloudError::StackRolledBack`]
/// * creation failed, deletion failed or never finished →
///   [`CloudError::StackDeleteFailed`]
/// * creation never finished → [`CloudError::Timeout`]
pub async fn await_stack_created(
    stacks: &dyn StackApi,
    stack_name: &str,
    wait: &WaitConfig,
) -> Result<()> {
    tracing::info!("Waiting for stack {} to finish creating...", stack_name);

    match poll_creation(stacks, stack_name, wait).await? {
        CreatePhase::Complete => {
            tracing::info!("Stack {} created", stack_name);
            Ok(())
        }
        CreatePhase::RollingBack(status) => {
            tracing::warn!(
                "Stack {} failed to create ({}); waiting for it to finish deleting...",
                stack_name,
                status
            );
            await_stack_deleted(stacks, stack_name, wait).await
        }
    }
}

async fn poll_creation(
    stacks: &dyn StackApi,
    stack_name: &str,
    wait: &WaitConfig,
) -> Result<CreatePhase> {
    for attempt in 0..wait.max_attempts {
        match stacks.stack_status(stack_name).await {
            Ok(StackStatus::CreateComplete) => return Ok(CreatePhase::Complete),
            Ok(StackStatus::CreateInProgress) => {
                tracing::debug!("Stack {} still creating (poll {})", stack_name, attempt + 1);
            }
            Ok(status) => return Ok(CreatePhase::RollingBack(status.to_string())),
            // Failed and already cleaned up between two polls
            Err(e) if e.is_not_found() => {
                return Ok(CreatePhase::RollingBack("DELETE_COMPLETE".to_string()));
            }
            Err(e) => return Err(e),
        }

        if attempt + 1 < wait.max_attempts {
            sleep(wait.delay_for_attempt(attempt)).await;
        }
    }

    Err(CloudError::Timeout(format!(
        "stack {} to finish creating",
        stack_name
    )))
}

/// Always returns an error: the stack could not be created either way.
async fn await_stack_deleted(
    stacks: &dyn StackApi,
    stack_name: &str,
    wait: &WaitConfig,
) -> Result<()> {
    let rolled_back = || CloudError::StackRolledBack {
        stack: stack_name.to_string(),
    };
    let delete_failed = |status: String| CloudError::StackDeleteFailed {
        stack: stack_name.to_string(),
        status,
    };

    for attempt in 0..wait.max_attempts {
        match stacks.stack_status(stack_name).await {
            Err(e) if e.is_not_found() => return Err(rolled_back()),
            Err(e) => return Err(e),
            Ok(StackStatus::DeleteComplete) => return Err(rolled_back()),
            Ok(
                status @ (StackStatus::DeleteFailed
                | StackStatus::RollbackFailed
                | StackStatus::RollbackComplete),
            ) => return Err(delete_failed(status.to_string())),
            Ok(status) => {
                tracing::debug!("Stack {} is {} (poll {})", stack_name, status, attempt + 1);
            }
        }

        if attempt + 1 < wait.max_attempts {
            sleep(wait.delay_for_attempt(attempt)).await;
        }
    }

    Err(delete_failed("timed out waiting for deletion".to_string()))
}

/// Fixed wait for provider-side propagation where no native waiter exists
pub async fn settle(what: &str, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tracing::info!("Waiting {}s for {} to propagate", delay.as_secs(), what);
    sleep(delay).await;
}

/// Run `op`, and run it exactly once more if the first error matches
/// `should_retry`. Never loops further.
pub async fn retry_once_if<T, F, Fut>(
    should_retry: impl Fn(&CloudError) -> bool,
    delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(e) if should_retry(&e) => {
            tracing::warn!("Retrying once after: {}", e);
            sleep(delay).await;
            op().await
        }
        result => result,
    }
}
