//! Blocking client facade.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::connection::RetryPolicy;
use crate::pipeline::Inbox;
use crate::runtime::{LoopBridge, LoopHost};
use crate::supervisor::GroupStatus;

use super::config::ClientConfig;
use super::core::AsyncClient;
use super::error::ClientError;

/// Blocking TCP client hosted on a background event loop.
///
/// Construction spawns a dedicated worker thread running a single-threaded
/// scheduler; every operation except [`get_messages`](Self::get_messages)
/// is submitted to that loop through the bridge and blocks the caller until
/// the loop reports back. Call from any thread.
///
/// # Example
///
/// ```no_run
/// use moorline::client::{Client, ClientConfig};
///
/// # fn main() -> Result<(), moorline::client::ClientError> {
/// let client = Client::new(ClientConfig::new("127.0.0.1", 8888))?;
/// client.start()?;
/// client.send("hello server")?;
/// std::thread::sleep(std::time::Duration::from_millis(200));
/// for message in client.get_messages() {
///     println!("received: {message}");
/// }
/// client.stop();
/// # Ok(())
/// # }
/// ```
pub struct Client {
    core: Arc<Mutex<AsyncClient>>,
    inbox: Inbox,
    bridge: LoopBridge,
    host: LoopHost,
}

impl Client {
    /// Spawns the event loop worker and wires a client to it.
    ///
    /// No connection is attempted yet; that happens in [`start`](Self::start).
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let host = LoopHost::spawn()?;
        let bridge = host.bridge();
        let core = AsyncClient::new(config);
        let inbox = core.inbox();
        info!("Client created");
        Ok(Self {
            core: Arc::new(Mutex::new(core)),
            inbox,
            bridge,
            host,
        })
    }

    /// Connects using the configured retry budget, blocking until the
    /// connection is established or the budget is spent.
    ///
    /// On failure the error of the last attempt is returned.
    pub fn start(&self) -> Result<(), ClientError> {
        let core = Arc::clone(&self.core);
        self.bridge
            .submit(async move { core.lock().await.start().await })
            .wait()??;
        Ok(())
    }

    /// Connects with an explicit retry policy, overriding the configured one.
    pub fn start_with(&self, policy: RetryPolicy) -> Result<(), ClientError> {
        let core = Arc::clone(&self.core);
        self.bridge
            .submit(async move { core.lock().await.start_with(&policy).await })
            .wait()??;
        Ok(())
    }

    /// Sends `text`, blocking until the transport write has flushed.
    pub fn send(&self, text: &str) -> Result<(), ClientError> {
        let text = text.to_string();
        let core = Arc::clone(&self.core);
        self.bridge
            .submit(async move { core.lock().await.send(&text).await })
            .wait()??;
        Ok(())
    }

    /// Drains the inbox: every message received so far, oldest first.
    ///
    /// Reads the shared inbox directly, so it works before [`start`] and
    /// after [`stop`](Self::stop) and never touches the event loop.
    ///
    /// [`start`]: Self::start
    pub fn get_messages(&self) -> Vec<String> {
        self.inbox.drain()
    }

    /// Status of the receive pipeline, if a connection ever spawned one.
    ///
    /// `Completed` after the peer closed cleanly, `Failed` after a pipeline
    /// error, `Cancelled` after an ordinary stop.
    pub fn pipeline_status(&self) -> Result<Option<GroupStatus>, ClientError> {
        let core = Arc::clone(&self.core);
        let status = self
            .bridge
            .submit(async move { core.lock().await.pipeline_status() })
            .wait()?;
        Ok(status)
    }

    /// Last fault recorded against the event loop worker, if any.
    pub fn last_fault(&self) -> Option<String> {
        self.host.last_fault()
    }

    /// Disconnects and stops the event loop worker.
    ///
    /// Never returns an error: teardown failures are logged and swallowed.
    /// Idempotent, and safe even if [`start`](Self::start) never succeeded.
    pub fn stop(&self) {
        let core = Arc::clone(&self.core);
        let teardown = self
            .bridge
            .submit(async move { core.lock().await.stop().await });
        if let Err(error) = teardown.wait() {
            // Expected on a second stop; the loop is already gone.
            debug!(error = %error, "Teardown was not confirmed by the loop");
        }
        self.host.stop();
        info!("Client stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SendError;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    const LOCALHOST: &str = "127.0.0.1";

    /// Accepts one connection, writes `payload`, then holds the socket open
    /// until the returned thread is joined.
    fn serve_once(payload: &'static [u8]) -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind((LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            socket.write_all(payload).unwrap();
            thread::sleep(Duration::from_secs(2));
            drop(socket);
        });
        (port, server)
    }

    #[test]
    fn test_lifecycle_start_receive_stop() {
        let (port, _server) = serve_once(b"hello");
        let client = Client::new(ClientConfig::new(LOCALHOST, port)).unwrap();

        client.start().expect("server should accept");
        thread::sleep(Duration::from_millis(150));

        assert_eq!(client.get_messages(), vec!["hello"]);
        assert!(client.get_messages().is_empty());
        client.stop();
    }

    #[test]
    fn test_stop_before_start_is_safe() {
        let client = Client::new(ClientConfig::new(LOCALHOST, 1)).unwrap();
        client.stop();
        client.stop();
        assert!(client.get_messages().is_empty());
    }

    #[test]
    fn test_send_before_start_reports_not_connected() {
        let client = Client::new(ClientConfig::new(LOCALHOST, 1)).unwrap();
        let result = client.send("too early");
        assert!(matches!(
            result,
            Err(ClientError::Send(SendError::NotConnected))
        ));
        client.stop();
    }

    #[test]
    fn test_stop_twice_after_start() {
        let (port, _server) = serve_once(b"");
        let client = Client::new(ClientConfig::new(LOCALHOST, port)).unwrap();
        client.start().unwrap();

        client.stop();
        client.stop();
    }
}
