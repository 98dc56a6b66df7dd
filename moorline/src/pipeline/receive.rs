//! Transport receive pump.
//!
//! Reads bounded chunks from the connection and pushes each one onto the
//! frame queue as-is. Frame boundaries are whatever a single read returned;
//! the pump imposes no framing of its own.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::error::PipelineError;

/// Upper bound on bytes drawn from the transport in one read call.
pub const RECV_CHUNK_BYTES: usize = 4096;

/// How the receive pump came to a clean stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpEnd {
    /// The peer shut the connection down (zero-length read).
    PeerClosed,
    /// Cancellation was observed at the read suspension point.
    Cancelled,
}

/// Reads frames from `reader` until the peer closes, cancellation is
/// observed, or the transport fails.
///
/// Each non-empty read is forwarded on `frame_tx` in read order. Dropping
/// the sender on return is what tells the downstream processor that no more
/// frames are coming.
///
/// # Returns
///
/// A [`PumpEnd`] describing the clean stop, or the transport error that
/// terminated the pump.
pub async fn receive_pump<R>(
    mut reader: R,
    frame_tx: mpsc::UnboundedSender<Vec<u8>>,
    cancel: CancellationToken,
) -> Result<PumpEnd, PipelineError>
where
    R: AsyncRead + Unpin,
{
    debug!("Receive pump started");
    let mut buffer = vec![0u8; RECV_CHUNK_BYTES];

    loop {
        let read = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Receive pump cancelled");
                return Ok(PumpEnd::Cancelled);
            }

            read = reader.read(&mut buffer) => read,
        };

        match read {
            Ok(0) => {
                debug!("Peer closed the connection");
                return Ok(PumpEnd::PeerClosed);
            }
            Ok(len) => {
                trace!(len, "Frame received");
                if frame_tx.send(buffer[..len].to_vec()).is_err() {
                    // The consumer is gone; the supervisor tears us down next.
                    debug!("Frame queue closed, stopping receive pump");
                    return Ok(PumpEnd::Cancelled);
                }
            }
            Err(source) => {
                warn!(error = %source, "Transport read failed");
                return Err(PipelineError::Read { source });
            }
        }
    }
}
