//! Moorline - Async TCP client behind a blocking API
//!
//! This library connects to a TCP server, receives and decodes whatever the
//! server sends, and buffers it for the caller, while hiding the async
//! machinery behind a blocking facade: a dedicated worker thread hosts a
//! single-threaded event loop, and callers on any thread submit work to it
//! through a bridge.
//!
//! # High-Level API
//!
//! For most use cases, the [`client`] module is the entry point:
//!
//! ```no_run
//! use moorline::client::{Client, ClientConfig};
//!
//! # fn main() -> Result<(), moorline::client::ClientError> {
//! let config = ClientConfig::new("127.0.0.1", 8888).with_max_retries(3);
//! let client = Client::new(config)?;
//!
//! client.start()?;
//! client.send("hello")?;
//! let messages = client.get_messages();
//! client.stop();
//! # Ok(())
//! # }
//! ```
//!
//! Programs already inside an async runtime skip the worker thread and use
//! [`client::AsyncClient`] directly.

pub mod client;
pub mod connection;
pub mod logging;
pub mod pipeline;
pub mod runtime;
pub mod supervisor;

/// Version of the moorline library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
