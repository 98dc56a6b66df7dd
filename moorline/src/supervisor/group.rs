//! Structured supervision of the receive/process task pair.
//!
//! [`TaskGroup::spawn`] starts the receive pump and the message processor as
//! one group and watches both. The first failure (including a panic) cancels
//! the sibling, both tasks are joined, and the failure is re-raised from
//! [`TaskGroup::join`]. Explicit cancellation is not a failure: both tasks
//! end at their suspension points and the group reports `Cancelled`.
//!
//! # Example
//!
//! ```ignore
//! use moorline::pipeline::Inbox;
//! use moorline::supervisor::{GroupStatus, TaskGroup};
//!
//! let inbox = Inbox::new();
//! let group = TaskGroup::spawn(read_half, inbox.clone());
//!
//! // ... later, during disconnect:
//! group.cancel();
//! group.join().await?;
//! ```

use std::fmt;

use tokio::io::AsyncRead;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::pipeline::{process_frames, receive_pump, Inbox, PipelineError};

/// Lifecycle of a supervised group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GroupStatus {
    /// Spawned, but the supervisor has not started the tasks yet.
    #[default]
    Idle,

    /// Both tasks are running.
    Running,

    /// Both tasks ended cleanly without cancellation or failure.
    Completed,

    /// The group was cancelled; both tasks ended at their suspension points.
    Cancelled,

    /// A task failed; the sibling was cancelled and the failure re-raised.
    Failed,
}

impl GroupStatus {
    /// Returns true if this is a terminal state (the group is finished).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true if the group has not reached a terminal state yet.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Idle | Self::Running)
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Handle to the running receive/process group.
///
/// Dropping the handle does not stop the group; call [`TaskGroup::cancel`]
/// and then [`TaskGroup::join`] for an orderly teardown.
pub struct TaskGroup {
    cancel: CancellationToken,
    status_rx: watch::Receiver<GroupStatus>,
    supervisor: JoinHandle<Result<(), PipelineError>>,
}

impl TaskGroup {
    /// Spawns the receive pump and message processor over `reader` as one
    /// supervised group on the current runtime.
    ///
    /// Decoded messages are appended to `inbox` in arrival order.
    pub fn spawn<R>(reader: R, inbox: Inbox) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (status_tx, status_rx) = watch::channel(GroupStatus::Idle);
        let supervisor = tokio::spawn(supervise(reader, inbox, cancel.clone(), status_tx));

        Self {
            cancel,
            status_rx,
            supervisor,
        }
    }

    /// Returns the group's current status without blocking.
    pub fn status(&self) -> GroupStatus {
        *self.status_rx.borrow()
    }

    /// Returns a watcher that keeps reporting the status after the group
    /// handle itself has been consumed by [`TaskGroup::join`].
    pub fn status_watch(&self) -> watch::Receiver<GroupStatus> {
        self.status_rx.clone()
    }

    /// Requests cooperative cancellation of both tasks.
    ///
    /// Returns immediately; the tasks observe the cancellation at their next
    /// suspension point. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the whole group to terminate.
    ///
    /// Returns the first failure if any task failed; a cancelled group joins
    /// with `Ok(())` because cancellation is never an error to the canceller.
    pub async fn join(self) -> Result<(), PipelineError> {
        match self.supervisor.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => Err(PipelineError::Panicked {
                reason: panic_reason(join_error),
            }),
            Err(_) => Ok(()),
        }
    }
}

impl fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGroup")
            .field("status", &self.status())
            .finish()
    }
}

/// Runs both pipeline tasks and resolves the group's terminal state.
async fn supervise<R>(
    reader: R,
    inbox: Inbox,
    cancel: CancellationToken,
    status_tx: watch::Sender<GroupStatus>,
) -> Result<(), PipelineError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let _ = status_tx.send(GroupStatus::Running);
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();

    let mut pump = tokio::spawn(receive_pump(reader, frame_tx, cancel.clone()));
    let mut processor = tokio::spawn(process_frames(frame_rx, inbox, cancel.clone()));

    // Wait for the first finisher. A failure there cancels the sibling so it
    // unblocks from its suspension point; then both are joined either way.
    let (first_failure, second_failure) = tokio::select! {
        outcome = &mut pump => {
            let first = task_failure(outcome);
            if first.is_some() {
                cancel.cancel();
            }
            let second = task_failure(processor.await);
            (first, second)
        }
        outcome = &mut processor => {
            let first = task_failure(outcome);
            if first.is_some() {
                cancel.cancel();
            }
            let second = task_failure(pump.await);
            (first, second)
        }
    };

    match first_failure.or(second_failure) {
        Some(error) => {
            warn!(error = %error, "Pipeline task failed, group failed");
            let _ = status_tx.send(GroupStatus::Failed);
            Err(error)
        }
        None if cancel.is_cancelled() => {
            debug!("Supervised group cancelled");
            let _ = status_tx.send(GroupStatus::Cancelled);
            Ok(())
        }
        None => {
            debug!("Supervised group completed");
            let _ = status_tx.send(GroupStatus::Completed);
            Ok(())
        }
    }
}

/// Extracts the failure from a joined task, treating a panic as a failure
/// and clean ends (including cancellation) as no failure.
fn task_failure<T>(
    outcome: Result<Result<T, PipelineError>, JoinError>,
) -> Option<PipelineError> {
    match outcome {
        Ok(Ok(_)) => None,
        Ok(Err(error)) => Some(error),
        Err(join_error) if join_error.is_panic() => Some(PipelineError::Panicked {
            reason: panic_reason(join_error),
        }),
        // An aborted task only happens when the runtime is torn down under us.
        Err(_) => None,
    }
}

fn panic_reason(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "opaque panic payload".to_string()),
        Err(error) => error.to_string(),
    }
}
