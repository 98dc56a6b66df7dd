//! Error types for connection management.

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::PipelineError;

/// Errors that can occur while establishing a connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The peer actively refused the connection. Retryable.
    #[error("Connection refused by {host}:{port}")]
    Refused {
        host: String,
        port: u16,
        source: io::Error,
    },

    /// The attempt did not finish within the per-attempt timeout. Retryable.
    #[error("Connection attempt to {host}:{port} timed out after {timeout:?}")]
    Timeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// Any other transport-level failure. Not retryable.
    #[error("Failed to connect to {host}:{port}: {source}")]
    Transport {
        host: String,
        port: u16,
        source: io::Error,
    },

    /// A connection is already established on this client.
    #[error("A connection is already established")]
    AlreadyConnected,
}

impl ConnectError {
    /// True for the failures the retry loop absorbs within budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Refused { .. } | Self::Timeout { .. })
    }
}

/// Errors that can occur when sending a message.
#[derive(Debug, Error)]
pub enum SendError {
    /// There is no established connection to write to.
    #[error("Client is not connected")]
    NotConnected,

    /// The transport rejected the write or the flush.
    #[error("Transport write failed: {source}")]
    Transport { source: io::Error },
}

/// Errors that can occur during disconnect.
///
/// Cancelling the supervised group is not an error. What surfaces here is an
/// earlier pipeline failure discovered at join time, or a failing transport
/// close.
#[derive(Debug, Error)]
pub enum DisconnectError {
    /// The supervised group had failed before or during teardown.
    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// Closing the transport failed.
    #[error("Transport close failed: {source}")]
    Transport { source: io::Error },
}
