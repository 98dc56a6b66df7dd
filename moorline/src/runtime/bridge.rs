//! Cross-thread bridge: submit work to the loop, block for the result.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use super::error::BridgeError;
use super::host::{panic_text, record_fault, FaultCell};

/// Submits asynchronous work to a [`LoopHost`](super::LoopHost) from any
/// thread.
///
/// Cloneable; all clones target the same loop. This is the only sanctioned
/// crossing between external threads and loop-owned state: everything the
/// loop mutates is reached through a future submitted here.
#[derive(Clone)]
pub struct LoopBridge {
    handle: runtime::Handle,
    stop_token: CancellationToken,
    fault: FaultCell,
}

impl LoopBridge {
    pub(crate) fn new(
        handle: runtime::Handle,
        stop_token: CancellationToken,
        fault: FaultCell,
    ) -> Self {
        Self {
            handle,
            stop_token,
            fault,
        }
    }

    /// Schedules `work` onto the loop and returns a handle to wait on.
    ///
    /// The work starts running whether or not anyone waits for it. A panic
    /// inside the work is recorded as the host's last fault and the waiter
    /// sees [`BridgeError::WorkerGone`].
    pub fn submit<F>(&self, work: F) -> BridgeHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::sync_channel(1);

        if self.stop_token.is_cancelled() {
            // Dropping the sender here makes every wait report WorkerGone.
            warn!("Work submitted after the event loop stopped");
            return BridgeHandle { result_rx };
        }

        let fault = Arc::clone(&self.fault);
        self.handle.spawn(async move {
            match AssertUnwindSafe(work).catch_unwind().await {
                Ok(value) => {
                    // A dropped handle just means nobody is waiting.
                    let _ = result_tx.send(value);
                }
                Err(payload) => {
                    let reason = panic_text(payload);
                    error!(reason = %reason, "Submitted work panicked");
                    record_fault(&fault, reason);
                }
            }
        });

        BridgeHandle { result_rx }
    }
}

/// Waitable handle for one submitted unit of work.
pub struct BridgeHandle<T> {
    result_rx: mpsc::Receiver<T>,
}

impl<T> BridgeHandle<T> {
    /// Blocks the calling thread until the work completes.
    pub fn wait(self) -> Result<T, BridgeError> {
        self.result_rx.recv().map_err(|_| BridgeError::WorkerGone)
    }

    /// Blocks at most `timeout` for the result.
    ///
    /// Expiry abandons the wait, not the work: the future keeps running on
    /// the loop and a later wait on this handle can still pick up its result.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, BridgeError> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(BridgeError::TimeoutWaiting { timeout }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(BridgeError::WorkerGone),
        }
    }
}
