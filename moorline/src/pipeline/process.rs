//! Frame-to-message processor.
//!
//! Consumes raw frames from the queue the pump fills, decodes them as UTF-8
//! and appends the result to the shared [`Inbox`]. Runs as the pump's sibling
//! inside the supervised group.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::PipelineError;
use super::inbox::Inbox;

/// How the message processor came to a clean stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorEnd {
    /// The frame queue closed because the pump is gone; everything still
    /// buffered was decoded and delivered first.
    QueueClosed,
    /// Cancellation was observed at the queue-wait suspension point.
    Cancelled,
}

/// Decodes frames from `frame_rx` into the inbox until the queue closes,
/// cancellation is observed, or a frame fails to decode.
///
/// Messages are appended in exactly the order frames were queued.
pub async fn process_frames(
    mut frame_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    inbox: Inbox,
    cancel: CancellationToken,
) -> Result<ProcessorEnd, PipelineError> {
    debug!("Message processor started");

    loop {
        let frame = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Message processor cancelled");
                return Ok(ProcessorEnd::Cancelled);
            }

            frame = frame_rx.recv() => frame,
        };

        match frame {
            Some(frame) => {
                let message = String::from_utf8(frame)?;
                debug!(len = message.len(), "Message appended to inbox");
                inbox.push(message);
            }
            None => {
                debug!("Frame queue closed, message processor finished");
                return Ok(ProcessorEnd::QueueClosed);
            }
        }
    }
}
