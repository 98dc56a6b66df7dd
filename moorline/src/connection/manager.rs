//! Connection lifecycle: establish with bounded retries, hand the socket to
//! the supervised pipeline, send, and tear down in order.

use std::io;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::pipeline::Inbox;
use crate::supervisor::{GroupStatus, TaskGroup};

use super::error::{ConnectError, DisconnectError, SendError};
use super::retry::RetryPolicy;

/// Where the connection is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been established yet.
    #[default]
    Disconnected,
    /// An establishment attempt (possibly retrying) is in flight.
    Connecting,
    /// The transport is up and the pipeline group is spawned.
    Connected,
    /// Teardown is in progress.
    Closing,
    /// The connection was torn down.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Closing => write!(f, "Closing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Owns the transport and the supervised pipeline for one connection.
///
/// At most one connection is live at a time: a second `connect` without an
/// intervening [`disconnect`](Self::disconnect) is rejected.
pub struct ConnectionManager {
    state: ConnectionState,
    writer: Option<OwnedWriteHalf>,
    group: Option<TaskGroup>,
    pipeline_status: Option<watch::Receiver<GroupStatus>>,
    inbox: Inbox,
}

impl ConnectionManager {
    /// Creates a manager that delivers decoded messages into `inbox`.
    pub fn new(inbox: Inbox) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            writer: None,
            group: None,
            pipeline_status: None,
            inbox,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Status of the supervised pipeline group, if one was ever spawned.
    ///
    /// Keeps reporting the terminal status after teardown, which is how a
    /// caller can tell a peer-closed session (`Completed`) from a failed one.
    pub fn pipeline_status(&self) -> Option<GroupStatus> {
        self.pipeline_status.as_ref().map(|status| *status.borrow())
    }

    /// Establishes the connection, retrying per `policy`, and spawns the
    /// receive/process group on success.
    ///
    /// Attempts are bounded by `policy.timeout_per_attempt`; refused and
    /// timed-out attempts are retried after `policy.backoff_delay` until the
    /// budget of `max_retries + 1` total attempts is spent, then the last
    /// error is returned. Any other failure returns immediately.
    pub async fn connect(
        &mut self,
        host: &str,
        port: u16,
        policy: &RetryPolicy,
    ) -> Result<(), ConnectError> {
        if self.writer.is_some() {
            return Err(ConnectError::AlreadyConnected);
        }

        self.state = ConnectionState::Connecting;
        info!(host, port, max_retries = policy.max_retries, "Connecting");

        let stream = match establish(host, port, policy).await {
            Ok(stream) => stream,
            Err(error) => {
                self.state = ConnectionState::Disconnected;
                return Err(error);
            }
        };

        let (read_half, write_half) = stream.into_split();
        let group = TaskGroup::spawn(read_half, self.inbox.clone());
        self.pipeline_status = Some(group.status_watch());
        self.group = Some(group);
        self.writer = Some(write_half);
        self.state = ConnectionState::Connected;
        info!(host, port, "Connection established");
        Ok(())
    }

    /// Writes `text` to the transport and flushes before returning, so the
    /// caller observes transport backpressure.
    pub async fn send(&mut self, text: &str) -> Result<(), SendError> {
        let writer = self.writer.as_mut().ok_or(SendError::NotConnected)?;

        debug!(len = text.len(), "Sending message");
        writer
            .write_all(text.as_bytes())
            .await
            .map_err(|source| SendError::Transport { source })?;
        writer
            .flush()
            .await
            .map_err(|source| SendError::Transport { source })?;
        Ok(())
    }

    /// Tears the connection down: cancel the group, join it, then close the
    /// transport and await closure.
    ///
    /// Idempotent; calling it with nothing to tear down is a no-op. The
    /// pipeline is always joined before the socket is touched so the pump is
    /// never mid-read on a transport being closed underneath it.
    pub async fn disconnect(&mut self) -> Result<(), DisconnectError> {
        let group = self.group.take();
        let writer = self.writer.take();
        if group.is_none() && writer.is_none() {
            // Never connected, or already torn down.
            return Ok(());
        }

        info!("Disconnecting");
        self.state = ConnectionState::Closing;

        let mut first_failure = None;
        if let Some(group) = group {
            group.cancel();
            if let Err(error) = group.join().await {
                warn!(error = %error, "Pipeline reported a failure during teardown");
                first_failure = Some(DisconnectError::Pipeline(error));
            }
        }

        if let Some(mut writer) = writer {
            if let Err(source) = writer.shutdown().await {
                warn!(error = %source, "Transport close failed");
                if first_failure.is_none() {
                    first_failure = Some(DisconnectError::Transport { source });
                }
            }
        }

        self.state = ConnectionState::Closed;
        info!("Disconnected");
        match first_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Runs the bounded retry loop around single attempts.
async fn establish(host: &str, port: u16, policy: &RetryPolicy) -> Result<TcpStream, ConnectError> {
    let total = policy.total_attempts();
    let mut attempt = 1;

    loop {
        match attempt_connect(host, port, policy.timeout_per_attempt).await {
            Ok(stream) => {
                if attempt > 1 {
                    info!(attempt, "Connected after retrying");
                }
                return Ok(stream);
            }
            Err(error) if error.is_retryable() && attempt < total => {
                warn!(attempt, total, error = %error, "Connection attempt failed, backing off");
                tokio::time::sleep(policy.backoff_delay).await;
                attempt += 1;
            }
            Err(error) => {
                warn!(attempt, error = %error, "Giving up on connecting");
                return Err(error);
            }
        }
    }
}

/// One connection attempt, bounded by `limit` when given.
async fn attempt_connect(
    host: &str,
    port: u16,
    limit: Option<Duration>,
) -> Result<TcpStream, ConnectError> {
    let connect = TcpStream::connect((host, port));

    let connected = match limit {
        Some(timeout) => match tokio::time::timeout(timeout, connect).await {
            Ok(connected) => connected,
            Err(_) => {
                return Err(ConnectError::Timeout {
                    host: host.to_string(),
                    port,
                    timeout,
                })
            }
        },
        None => connect.await,
    };

    connected.map_err(|source| match source.kind() {
        io::ErrorKind::ConnectionRefused => ConnectError::Refused {
            host: host.to_string(),
            port,
            source,
        },
        _ => ConnectError::Transport {
            host: host.to_string(),
            port,
            source,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::retry::DEFAULT_BACKOFF_DELAY;
    use std::time::Instant;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    const LOCALHOST: &str = "127.0.0.1";

    /// Binds and immediately drops a listener to find a port that refuses.
    async fn refusing_port() -> u16 {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            // Keep the server side open until the client is done.
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let mut manager = ConnectionManager::new(Inbox::new());
        manager
            .connect(LOCALHOST, port, &RetryPolicy::default())
            .await
            .expect("listener should accept");
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.pipeline_status().is_some());

        manager.disconnect().await.expect("teardown should be clean");
        assert_eq!(manager.state(), ConnectionState::Closed);
        assert_eq!(manager.pipeline_status(), Some(GroupStatus::Cancelled));

        server.abort();
    }

    #[tokio::test]
    async fn test_refused_connect_retries_then_surfaces() {
        let port = refusing_port().await;
        let policy = RetryPolicy::new(2).with_backoff_delay(Duration::from_millis(20));
        let mut manager = ConnectionManager::new(Inbox::new());

        let started = Instant::now();
        let result = manager.connect(LOCALHOST, port, &policy).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(ConnectError::Refused { .. })));
        // Three attempts mean two backoff sleeps.
        assert!(elapsed >= Duration::from_millis(40), "elapsed {elapsed:?}");
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_refused_connect_without_retries_fails_fast() {
        let port = refusing_port().await;
        let mut manager = ConnectionManager::new(Inbox::new());

        let started = Instant::now();
        let result = manager
            .connect(LOCALHOST, port, &RetryPolicy::default())
            .await;

        assert!(matches!(result, Err(ConnectError::Refused { .. })));
        // No retries means no backoff sleep.
        assert!(started.elapsed() < DEFAULT_BACKOFF_DELAY);
    }

    #[tokio::test]
    async fn test_second_connect_is_rejected() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let mut manager = ConnectionManager::new(Inbox::new());
        manager
            .connect(LOCALHOST, port, &RetryPolicy::default())
            .await
            .unwrap();

        let second = manager
            .connect(LOCALHOST, port, &RetryPolicy::default())
            .await;
        assert!(matches!(second, Err(ConnectError::AlreadyConnected)));

        manager.disconnect().await.unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn test_send_before_connect_errors() {
        let mut manager = ConnectionManager::new(Inbox::new());
        let result = manager.send("hello").await;
        assert!(matches!(result, Err(SendError::NotConnected)));
    }

    #[tokio::test]
    async fn test_send_reaches_the_peer() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 16];
            let len = socket.read(&mut buffer).await.unwrap();
            buffer.truncate(len);
            buffer
        });

        let mut manager = ConnectionManager::new(Inbox::new());
        manager
            .connect(LOCALHOST, port, &RetryPolicy::default())
            .await
            .unwrap();
        manager.send("ping").await.expect("send should flush");

        let received = timeout(Duration::from_secs(1), server)
            .await
            .expect("server should observe the write")
            .unwrap();
        assert_eq!(received, b"ping");

        manager.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let mut manager = ConnectionManager::new(Inbox::new());
        manager
            .connect(LOCALHOST, port, &RetryPolicy::default())
            .await
            .unwrap();

        manager.disconnect().await.expect("first teardown");
        manager.disconnect().await.expect("second teardown is a no-op");
        assert_eq!(manager.state(), ConnectionState::Closed);

        server.abort();
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_a_no_op() {
        let mut manager = ConnectionManager::new(Inbox::new());
        manager.disconnect().await.expect("nothing to tear down");
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_peer_close_completes_pipeline_before_disconnect() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"bye").await.unwrap();
            // Dropping the socket closes the connection cleanly.
        });

        let inbox = Inbox::new();
        let mut manager = ConnectionManager::new(inbox.clone());
        manager
            .connect(LOCALHOST, port, &RetryPolicy::default())
            .await
            .unwrap();

        // Give the pump time to observe the data and the close.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(manager.pipeline_status(), Some(GroupStatus::Completed));
        assert_eq!(inbox.drain(), vec!["bye"]);

        manager
            .disconnect()
            .await
            .expect("completed pipeline joins cleanly");
    }

    #[tokio::test]
    async fn test_disconnect_surfaces_an_earlier_pipeline_failure() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(&[0xff, 0xfe]).await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let mut manager = ConnectionManager::new(Inbox::new());
        manager
            .connect(LOCALHOST, port, &RetryPolicy::default())
            .await
            .unwrap();

        // Let the processor hit the undecodable frame.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(manager.pipeline_status(), Some(GroupStatus::Failed));

        let result = manager.disconnect().await;
        assert!(matches!(result, Err(DisconnectError::Pipeline(_))));
        // The transport is still torn down.
        assert_eq!(manager.state(), ConnectionState::Closed);
    }
}
