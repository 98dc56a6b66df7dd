//! Error types for the loop host and the cross-thread bridge.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors spawning or initializing the loop host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The worker thread could not be spawned.
    #[error("Failed to spawn the event loop thread: {source}")]
    ThreadSpawn { source: io::Error },

    /// The scheduler could not be built on the worker thread.
    #[error("Failed to build the event loop runtime: {source}")]
    RuntimeBuild { source: io::Error },

    /// The worker thread exited before initialization finished.
    #[error("Event loop thread exited during initialization")]
    WorkerExited,
}

/// Errors observed by a caller waiting on bridged work.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The wait timed out; the work itself keeps running on the loop.
    #[error("Timed out after {timeout:?} waiting for the event loop result")]
    TimeoutWaiting { timeout: Duration },

    /// The loop is gone, or the submitted work died without producing a
    /// result. Check [`LoopHost::last_fault`](super::LoopHost::last_fault)
    /// for the reason.
    #[error("The event loop is gone or the submitted work was lost")]
    WorkerGone,
}
