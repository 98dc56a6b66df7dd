//! Async client core.
//!
//! [`AsyncClient`] is the foreground-loop mode of the client: the caller's
//! own task context drives it, no worker thread or bridge involved. The
//! blocking [`Client`](super::Client) wraps one of these behind a hosted
//! event loop.

use tracing::debug;

use crate::connection::{
    ConnectError, ConnectionManager, ConnectionState, DisconnectError, RetryPolicy, SendError,
};
use crate::pipeline::Inbox;
use crate::supervisor::GroupStatus;

use super::config::ClientConfig;

/// Async TCP client: connect with retries, send text, collect what arrives.
///
/// Received messages accumulate in an [`Inbox`] as they are decoded;
/// [`get_messages`](Self::get_messages) drains them in arrival order.
pub struct AsyncClient {
    config: ClientConfig,
    manager: ConnectionManager,
    inbox: Inbox,
}

impl AsyncClient {
    /// Creates a client for the configured endpoint. No I/O happens until
    /// [`start`](Self::start).
    pub fn new(config: ClientConfig) -> Self {
        let inbox = Inbox::new();
        Self {
            config,
            manager: ConnectionManager::new(inbox.clone()),
            inbox,
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handle on the shared inbox. Clones drain the same store, from any
    /// thread.
    pub fn inbox(&self) -> Inbox {
        self.inbox.clone()
    }

    /// Connects using the configured retry budget and spawns the receive
    /// pipeline.
    pub async fn start(&mut self) -> Result<(), ConnectError> {
        let policy = self.config.retry_policy();
        self.start_with(&policy).await
    }

    /// Connects with an explicit retry policy, overriding the configured one.
    pub async fn start_with(&mut self, policy: &RetryPolicy) -> Result<(), ConnectError> {
        self.manager
            .connect(self.config.host(), self.config.port(), policy)
            .await
    }

    /// Sends `text` and waits for the transport write to flush.
    pub async fn send(&mut self, text: &str) -> Result<(), SendError> {
        self.manager.send(text).await
    }

    /// Drains the inbox: returns every message received so far, oldest
    /// first, leaving the inbox empty.
    pub fn get_messages(&self) -> Vec<String> {
        self.inbox.drain()
    }

    /// Tears the connection down, surfacing any failure the pipeline or
    /// transport reports. Idempotent.
    pub async fn disconnect(&mut self) -> Result<(), DisconnectError> {
        self.manager.disconnect().await
    }

    /// Tears the connection down without surfacing errors.
    ///
    /// Teardown failures are logged and swallowed; stopping twice, or
    /// without ever having started, is fine.
    pub async fn stop(&mut self) {
        if let Err(error) = self.manager.disconnect().await {
            debug!(error = %error, "Ignoring teardown failure during stop");
        }
    }

    /// Current connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Terminal or live status of the receive pipeline, if one was spawned.
    pub fn pipeline_status(&self) -> Option<GroupStatus> {
        self.manager.pipeline_status()
    }
}
