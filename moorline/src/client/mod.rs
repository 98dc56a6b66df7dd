//! Client surfaces: blocking facade and async core.
//!
//! Two ways to drive the same machinery, selected by type:
//!
//! - [`Client`] spawns a dedicated worker thread hosting the event loop and
//!   exposes blocking calls, for programs that are not themselves async.
//! - [`AsyncClient`] runs in the caller's own task context, for programs
//!   already inside a runtime.
//!
//! Both are configured through [`ClientConfig`].

mod config;
mod core;
mod error;
mod facade;

pub use self::core::AsyncClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use facade::Client;
