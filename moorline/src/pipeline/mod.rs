//! Receive/decode pipeline between the transport and the inbox.
//!
//! Two cooperating tasks form the pipeline, joined by an unbounded FIFO of
//! raw frames:
//!
//! ```text
//! transport ──> receive_pump ──> frame queue ──> process_frames ──> Inbox
//! ```
//!
//! The queue is confined to the event loop: the pump is its only producer and
//! the processor its only consumer, so messages reach the inbox in exactly
//! the order frames came off the wire. Both tasks observe cancellation at
//! their suspension point (the read and the queue wait respectively) and end
//! cleanly instead of raising. The [`supervisor`](crate::supervisor) runs the
//! pair as one structured group.

mod error;
mod inbox;
mod process;
mod receive;

pub use error::PipelineError;
pub use inbox::Inbox;
pub use process::{process_frames, ProcessorEnd};
pub use receive::{receive_pump, PumpEnd, RECV_CHUNK_BYTES};
