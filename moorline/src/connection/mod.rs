//! Connection establishment, send path, and orderly teardown.
//!
//! [`ConnectionManager`] owns the transport for one connection at a time:
//! it runs the bounded retry loop, hands the read half to a supervised
//! [`TaskGroup`](crate::supervisor::TaskGroup) on success, keeps the write
//! half for `send`, and tears everything down in the safe order (pipeline
//! first, socket second).

mod error;
mod manager;
mod retry;

pub use error::{ConnectError, DisconnectError, SendError};
pub use manager::{ConnectionManager, ConnectionState};
pub use retry::{RetryPolicy, DEFAULT_BACKOFF_DELAY};
