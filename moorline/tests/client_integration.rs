//! Integration tests for the blocking client facade.
//!
//! These tests drive a real [`Client`] against local TCP servers and verify:
//! - Connect, send, receive, and stop across the thread boundary
//! - Retry budget consumption and the surfaced terminal error
//! - Clean peer-close handling versus pipeline failure
//! - Arrival ordering of received messages
//! - Stop safety: before start, twice, and while the connection is idle

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use moorline::client::{Client, ClientConfig, ClientError};
use moorline::connection::{ConnectError, RetryPolicy};
use moorline::runtime::BridgeError;
use moorline::supervisor::GroupStatus;

const LOCALHOST: &str = "127.0.0.1";

// =============================================================================
// Test Helpers
// =============================================================================

fn bind_local() -> (TcpListener, u16) {
    let listener = TcpListener::bind((LOCALHOST, 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// Binds and immediately drops a listener to find a port that refuses.
fn refusing_port() -> u16 {
    let (listener, port) = bind_local();
    drop(listener);
    port
}

/// Polls the inbox until `want` messages have arrived, or panics after the
/// deadline.
fn collect_messages(client: &Client, want: usize, within: Duration) -> Vec<String> {
    let deadline = Instant::now() + within;
    let mut messages = Vec::new();
    while messages.len() < want {
        messages.extend(client.get_messages());
        if Instant::now() > deadline {
            panic!(
                "Timed out waiting for {} messages, got {:?}",
                want, messages
            );
        }
        thread::sleep(Duration::from_millis(10));
    }
    messages
}

/// Polls the pipeline status until it is terminal, or panics after the
/// deadline.
fn wait_for_terminal_status(client: &Client, within: Duration) -> GroupStatus {
    let deadline = Instant::now() + within;
    loop {
        if let Some(status) = client.pipeline_status().unwrap() {
            if status.is_terminal() {
                return status;
            }
        }
        if Instant::now() > deadline {
            panic!("Timed out waiting for the pipeline to end");
        }
        thread::sleep(Duration::from_millis(10));
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[test]
fn test_client_sends_and_receives_an_echo() {
    let (listener, port) = bind_local();
    let server = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        let mut buffer = vec![0u8; 256];
        let len = socket.read(&mut buffer).unwrap();
        socket.write_all(&buffer[..len]).unwrap();
        // Hold the connection open until the client is done with it.
        thread::sleep(Duration::from_secs(2));
    });

    let client = Client::new(ClientConfig::new(LOCALHOST, port)).unwrap();
    client.start().expect("server should accept");
    client.send("Hello, Server!").expect("send should flush");

    let messages = collect_messages(&client, 1, Duration::from_secs(2));
    assert_eq!(messages, vec!["Hello, Server!"]);

    client.stop();
    drop(server);
}

#[test]
fn test_peer_close_is_a_clean_end() {
    let (listener, port) = bind_local();
    thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        socket.write_all(b"hello").unwrap();
        // Socket drops here: the peer closes cleanly.
    });

    let client = Client::new(ClientConfig::new(LOCALHOST, port)).unwrap();
    client.start().unwrap();

    let status = wait_for_terminal_status(&client, Duration::from_secs(2));
    assert_eq!(status, GroupStatus::Completed);

    // Everything sent before the close is still delivered, exactly once.
    assert_eq!(client.get_messages(), vec!["hello"]);
    assert!(client.get_messages().is_empty());

    client.stop();
}

#[test]
fn test_messages_arrive_in_send_order() {
    let (listener, port) = bind_local();
    thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        for payload in [&b"alpha"[..], b"beta", b"gamma"] {
            socket.write_all(payload).unwrap();
            // Gaps keep the writes in distinct reads on the client side.
            thread::sleep(Duration::from_millis(30));
        }
        thread::sleep(Duration::from_secs(1));
    });

    let client = Client::new(ClientConfig::new(LOCALHOST, port)).unwrap();
    client.start().unwrap();

    let messages = collect_messages(&client, 3, Duration::from_secs(2));
    assert_eq!(messages, vec!["alpha", "beta", "gamma"]);

    client.stop();
}

#[test]
fn test_connect_spends_the_retry_budget_then_surfaces_refused() {
    let port = refusing_port();
    let client = Client::new(ClientConfig::new(LOCALHOST, port)).unwrap();
    let policy = RetryPolicy::new(2).with_backoff_delay(Duration::from_millis(25));

    let started = Instant::now();
    let result = client.start_with(policy);
    let elapsed = started.elapsed();

    assert!(matches!(
        result,
        Err(ClientError::Connect(ConnectError::Refused { .. }))
    ));
    // Three attempts separated by two backoff sleeps, and nothing beyond.
    assert!(elapsed >= Duration::from_millis(50), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "elapsed {elapsed:?}");

    client.stop();
}

#[test]
fn test_stop_unblocks_an_idle_connection() {
    let (listener, port) = bind_local();
    let server = thread::spawn(move || {
        let (socket, _) = listener.accept().unwrap();
        // Say nothing; the client's pump sits in a read until cancelled.
        thread::sleep(Duration::from_secs(5));
        drop(socket);
    });

    let client = Client::new(ClientConfig::new(LOCALHOST, port)).unwrap();
    client.start().unwrap();

    let started = Instant::now();
    client.stop();

    assert!(
        started.elapsed() < Duration::from_secs(2),
        "stop should not wait out the server"
    );
    drop(server);
}

#[test]
fn test_stop_is_safe_before_start_and_repeatable() {
    let client = Client::new(ClientConfig::new(LOCALHOST, 1)).unwrap();
    assert!(client.get_messages().is_empty());

    client.stop();
    client.stop();

    // The loop is gone, so later operations report that rather than hang.
    let result = client.start();
    assert!(matches!(
        result,
        Err(ClientError::Bridge(BridgeError::WorkerGone))
    ));
}
