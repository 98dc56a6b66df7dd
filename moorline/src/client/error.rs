//! Client error types.

use thiserror::Error;

use crate::connection::{ConnectError, DisconnectError, SendError};
use crate::runtime::{BridgeError, HostError};

/// Errors surfaced by the blocking client facade.
///
/// Each variant wraps the error of the layer it came from, so callers can
/// match on the stage that failed without the facade flattening detail away.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The event loop host could not be started or has died.
    #[error("Event loop error: {0}")]
    Host(#[from] HostError),

    /// Waiting on work submitted to the event loop failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Connecting to the server failed.
    #[error("Connect error: {0}")]
    Connect(#[from] ConnectError),

    /// Sending a message failed.
    #[error("Send error: {0}")]
    Send(#[from] SendError),

    /// Tearing the connection down failed.
    #[error("Disconnect error: {0}")]
    Disconnect(#[from] DisconnectError),
}
