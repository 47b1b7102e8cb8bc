//! Beacon push-notification relay server.
//!
//! Accepts WebSocket connections at `/ws`, periodically generates status
//! messages and broadcasts them to every connected client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin beacon-server
//! cargo run --bin beacon-server -- --host 0.0.0.0 --port 3000 --interval-mode fixed
//! ```

use std::{sync::Arc, time::Duration};

use beacon_server::{
    domain::{ConnectionRegistry, MessagePusher},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, message_source::RandomMessageSource,
        repository::InMemoryConnectionRegistry,
    },
    ui::{AppState, Server},
    usecase::{
        Broadcaster, ConnectClientUseCase, DisconnectClientUseCase, GeneratorConfig,
        GetGroupsUseCase, GetRecentMessagesUseCase, JoinGroupUseCase, LeaveGroupUseCase,
        MessageGenerator, TickInterval,
    },
};
use beacon_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IntervalMode {
    /// Uniform random delay between --min-interval-ms and --max-interval-ms
    Jittered,
    /// Constant --fixed-interval-ms delay
    Fixed,
}

#[derive(Parser, Debug)]
#[command(name = "beacon-server")]
#[command(about = "Real-time push-notification relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Message generator cadence
    #[arg(long, value_enum, default_value = "jittered")]
    interval_mode: IntervalMode,

    #[arg(long, default_value = "3000")]
    min_interval_ms: u64,

    #[arg(long, default_value = "8000")]
    max_interval_ms: u64,

    #[arg(long, default_value = "5000")]
    fixed_interval_ms: u64,

    /// Wait after a failed generator tick
    #[arg(long, default_value = "5000")]
    cooldown_ms: u64,

    /// Maximum number of simultaneous connections (unlimited if omitted)
    #[arg(long)]
    max_connections: Option<usize>,

    /// Number of broadcast messages kept for GET /api/messages
    #[arg(long, default_value = "100")]
    message_log_capacity: usize,
}

impl Args {
    fn generator_config(&self) -> GeneratorConfig {
        let interval = match self.interval_mode {
            IntervalMode::Jittered => TickInterval::jittered(
                Duration::from_millis(self.min_interval_ms),
                Duration::from_millis(self.max_interval_ms),
            ),
            IntervalMode::Fixed => {
                TickInterval::Fixed(Duration::from_millis(self.fixed_interval_ms))
            }
        };
        GeneratorConfig {
            interval,
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let generator_config = args.generator_config();
    tracing::info!("Generator config: {:?}", generator_config);

    // Initialize dependencies in order:
    // 1. Registry
    // 2. MessagePusher
    // 3. Broadcaster
    // 4. UseCases
    // 5. MessageGenerator
    // 6. Server

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 1. Create Registry (in-memory)
    let registry: Arc<dyn ConnectionRegistry> = match args.max_connections {
        Some(max) => {
            tracing::info!("Connection limit: {}", max);
            Arc::new(InMemoryConnectionRegistry::with_max_connections(max))
        }
        None => Arc::new(InMemoryConnectionRegistry::new()),
    };

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

    // 3. Create Broadcaster
    let broadcaster = Arc::new(Broadcaster::new(
        registry.clone(),
        message_pusher.clone(),
        args.message_log_capacity,
    ));

    // 4. Create UseCases
    let connect_client_usecase = Arc::new(ConnectClientUseCase::new(
        registry.clone(),
        message_pusher.clone(),
        broadcaster.clone(),
        clock.clone(),
    ));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(
        registry.clone(),
        message_pusher.clone(),
        broadcaster.clone(),
        clock.clone(),
    ));
    let join_group_usecase = Arc::new(JoinGroupUseCase::new(
        registry.clone(),
        broadcaster.clone(),
        clock.clone(),
    ));
    let leave_group_usecase = Arc::new(LeaveGroupUseCase::new(
        registry.clone(),
        broadcaster.clone(),
        clock.clone(),
    ));
    let get_groups_usecase = Arc::new(GetGroupsUseCase::new(registry.clone()));
    let get_recent_messages_usecase =
        Arc::new(GetRecentMessagesUseCase::new(broadcaster.clone()));

    // 5. Create MessageGenerator
    let generator = MessageGenerator::new(
        Box::new(RandomMessageSource::new()),
        broadcaster,
        generator_config,
    );

    // 6. Create and run the server
    let app_state = AppState {
        connect_client_usecase,
        disconnect_client_usecase,
        join_group_usecase,
        leave_group_usecase,
        get_groups_usecase,
        get_recent_messages_usecase,
        message_pusher,
        clock,
        shutdown: CancellationToken::new(),
    };
    let server = Server::new(app_state, Some(generator));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
