//! Event loop hosting and the cross-thread bridge.
//!
//! The crate runs all of its asynchronous work on a single-threaded
//! scheduler hosted by a dedicated worker thread. External threads never
//! touch loop-owned state directly; they submit futures through the bridge
//! and block for the result:
//!
//! ```text
//!   caller thread                         worker thread
//!   ─────────────                         ─────────────
//!   LoopBridge::submit(fut) ──────────▶   scheduler runs fut
//!   BridgeHandle::wait()    ◀──────────   result over channel
//! ```
//!
//! [`LoopHost::stop`] winds the loop down from outside; a worker that dies
//! on its own is surfaced through [`LoopHost::last_fault`].

mod bridge;
mod error;
mod host;

pub use bridge::{BridgeHandle, LoopBridge};
pub use error::{BridgeError, HostError};
pub use host::LoopHost;
