//! Moorline CLI - Command-line interface
//!
//! Connects to a TCP server, optionally sends a message, and prints whatever
//! the server sends back until the listen window closes or the server hangs
//! up.

use clap::Parser;
use moorline::client::{Client, ClientConfig};
use moorline::logging::{default_log_dir, default_log_file, init_logging};
use std::process;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(name = "moorline")]
#[command(version = moorline::VERSION)]
#[command(about = "Connect to a TCP server and print what it sends", long_about = None)]
struct Args {
    /// Server hostname or IP address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server TCP port
    #[arg(long, default_value = "8888")]
    port: u16,

    /// Extra connection attempts after the first fails
    #[arg(long, default_value = "0")]
    retries: u32,

    /// Per-attempt connect timeout in seconds (unbounded if omitted)
    #[arg(long)]
    timeout: Option<f64>,

    /// Delay between connection attempts in seconds
    #[arg(long, default_value = "1.0")]
    backoff: f64,

    /// Message to send once connected
    #[arg(long)]
    send: Option<String>,

    /// How long to keep listening for incoming messages, in seconds
    #[arg(long, default_value = "5.0")]
    listen: f64,
}

fn main() {
    let args = Args::parse();

    let _logging_guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            process::exit(1);
        }
    };

    info!("Moorline v{}", moorline::VERSION);

    let mut config = ClientConfig::new(args.host.clone(), args.port)
        .with_max_retries(args.retries)
        .with_backoff_delay(Duration::from_secs_f64(args.backoff));
    if let Some(timeout) = args.timeout {
        config = config.with_timeout_per_attempt(Duration::from_secs_f64(timeout));
    }

    let client = match Client::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error starting event loop: {}", e);
            process::exit(1);
        }
    };

    println!("Connecting to {}:{}...", args.host, args.port);
    if let Err(e) = client.start() {
        eprintln!("Error connecting: {}", e);
        client.stop();
        process::exit(1);
    }
    println!("✓ Connected");

    if let Some(message) = &args.send {
        if let Err(e) = client.send(message) {
            eprintln!("Error sending message: {}", e);
            client.stop();
            process::exit(1);
        }
        println!("Sent: {}", message);
    }

    // Poll the inbox until the window closes or the pipeline ends.
    let deadline = Instant::now() + Duration::from_secs_f64(args.listen);
    let mut received = 0usize;
    while Instant::now() < deadline {
        received += print_messages(&client);

        if let Ok(Some(status)) = client.pipeline_status() {
            if status.is_terminal() {
                println!("Connection ended: {}", status);
                break;
            }
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    // Catch anything that arrived after the last poll.
    received += print_messages(&client);

    client.stop();
    println!("✓ Done ({} messages received)", received);
}

fn print_messages(client: &Client) -> usize {
    let messages = client.get_messages();
    for message in &messages {
        println!("Received: {}", message);
    }
    messages.len()
}
