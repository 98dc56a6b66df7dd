//! Event loop host: one cooperative scheduler on a dedicated worker thread.

use std::any::Any;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tokio::runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::bridge::LoopBridge;
use super::error::HostError;

/// Name given to the worker thread for diagnostics.
const LOOP_THREAD_NAME: &str = "moorline-loop";

/// Cross-thread cell holding the last fault seen on the loop.
pub(crate) type FaultCell = Arc<Mutex<Option<String>>>;

/// Hosts a single-threaded cooperative scheduler on a dedicated worker
/// thread.
///
/// Exactly one scheduler is bound to that thread for its lifetime. Work gets
/// onto it through the bridge returned by [`LoopHost::bridge`].
/// [`LoopHost::stop`] asks the loop to stop from the inside (the loop's root
/// future observes a cancellation token) and then joins the thread; the
/// thread is never terminated forcibly. Dropping the host without stopping
/// signals the token but detaches the thread, so an abandoned host never
/// blocks process exit.
pub struct LoopHost {
    runtime_handle: runtime::Handle,
    stop_token: CancellationToken,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
    fault: FaultCell,
}

impl LoopHost {
    /// Spawns the worker thread and blocks until its scheduler is ready.
    pub fn spawn() -> Result<Self, HostError> {
        let stop_token = CancellationToken::new();
        let fault: FaultCell = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = mpsc::channel();

        let loop_token = stop_token.clone();
        let thread = thread::Builder::new()
            .name(LOOP_THREAD_NAME.to_string())
            .spawn(move || {
                let scheduler = match runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(scheduler) => scheduler,
                    Err(source) => {
                        let _ = ready_tx.send(Err(source));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(scheduler.handle().clone()));

                debug!("Event loop started");
                // Park the root future on the stop token; submitted work runs
                // concurrently until the token fires.
                scheduler.block_on(loop_token.cancelled());
                debug!("Event loop stopped");
            })
            .map_err(|source| HostError::ThreadSpawn { source })?;

        let runtime_handle = match ready_rx.recv() {
            Ok(Ok(handle)) => handle,
            Ok(Err(source)) => {
                let _ = thread.join();
                return Err(HostError::RuntimeBuild { source });
            }
            Err(_) => {
                let _ = thread.join();
                return Err(HostError::WorkerExited);
            }
        };

        Ok(Self {
            runtime_handle,
            stop_token,
            thread: Mutex::new(Some(thread)),
            fault,
        })
    }

    /// Returns a bridge for submitting work to this loop from any thread.
    pub fn bridge(&self) -> LoopBridge {
        LoopBridge::new(
            self.runtime_handle.clone(),
            self.stop_token.clone(),
            Arc::clone(&self.fault),
        )
    }

    /// The last fault observed on the loop, if any.
    ///
    /// Set when submitted work panics, or when the worker thread itself dies
    /// unexpectedly.
    pub fn last_fault(&self) -> Option<String> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True until [`LoopHost::stop`] has joined the worker thread.
    pub fn is_running(&self) -> bool {
        self.thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Requests graceful termination and waits for the worker to finish.
    ///
    /// Idempotent; later calls return immediately.
    pub fn stop(&self) {
        self.stop_token.cancel();
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            debug!("Waiting for the event loop thread to stop");
            if let Err(payload) = handle.join() {
                let reason = panic_text(payload);
                warn!(reason = %reason, "Event loop thread panicked");
                record_fault(&self.fault, reason);
            }
        }
    }
}

impl Drop for LoopHost {
    fn drop(&mut self) {
        // Signal, but never join here: an abandoned host must not block
        // process exit. `stop()` is the graceful path.
        self.stop_token.cancel();
        let _ = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Stores `reason` as the loop's last-seen fault.
pub(crate) fn record_fault(cell: &FaultCell, reason: String) {
    *cell.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
}

/// Renders a panic payload as text, best effort.
pub(crate) fn panic_text(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "opaque panic payload".to_string())
}
