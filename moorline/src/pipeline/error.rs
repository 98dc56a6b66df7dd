//! Error types for the receive/decode pipeline.

use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Errors that can occur inside the supervised receive/decode pipeline.
///
/// A peer closing the connection is not represented here: that is a clean
/// end of the pump, reported as [`PumpEnd::PeerClosed`](super::PumpEnd).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The transport read failed with something other than end-of-stream.
    #[error("Transport read failed: {source}")]
    Read { source: io::Error },

    /// A received frame was not valid UTF-8.
    #[error("Received frame is not valid UTF-8: {0}")]
    Decode(#[from] FromUtf8Error),

    /// A pipeline task panicked instead of returning.
    #[error("Pipeline task panicked: {reason}")]
    Panicked { reason: String },
}
