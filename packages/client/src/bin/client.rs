//! Beacon notification client with automatic reconnection.
//!
//! Connects to a Beacon server, prints pushed messages and user activity, and
//! reconnects on connection loss following a fixed backoff schedule.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin beacon-client
//! cargo run --bin beacon-client -- --url ws://127.0.0.1:8080/ws --group ops --group alerts
//! ```

use std::time::Duration;

use beacon_client::{ClientConfig, ReconnectPolicy, SessionConfig, run_client};
use beacon_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "beacon-client")]
#[command(about = "Push-notification client with automatic reconnection", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Group to join after connecting (repeatable)
    #[arg(short = 'g', long = "group")]
    groups: Vec<String>,

    /// Maximum number of buffered messages
    #[arg(long, default_value = "500")]
    buffer_capacity: usize,

    /// Timeout for a single connection attempt
    #[arg(long, default_value = "10")]
    connect_timeout_secs: u64,

    /// Reconnect delays in milliseconds; the last one repeats
    #[arg(long, value_delimiter = ',', default_value = "0,2000,10000,30000")]
    backoff_ms: Vec<u64>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let config = ClientConfig {
        url: args.url,
        groups: args.groups,
        session: SessionConfig {
            buffer_capacity: args.buffer_capacity,
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            reconnect_policy: ReconnectPolicy::from_millis(&args.backoff_ms),
        },
    };

    // Run the client
    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
