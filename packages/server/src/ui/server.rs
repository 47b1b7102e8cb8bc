//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::MessageGenerator;

use super::{
    handler::{get_groups, get_recent_messages, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Push-notification relay server
///
/// Serves the WebSocket endpoint and the HTTP API, and drives the message
/// generator (if any) for as long as the server is up.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, Some(generator));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    app_state: Arc<AppState>,
    /// MessageGenerator（None の場合は定期配信を行わない）
    generator: Option<MessageGenerator>,
}

impl Server {
    pub fn new(app_state: AppState, generator: Option<MessageGenerator>) -> Self {
        Self {
            app_state: Arc::new(app_state),
            generator,
        }
    }

    /// Run the server until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Beacon server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// When the signal fires, the shutdown token in [`AppState`] is cancelled:
    /// the generator stops and every open socket is sent a Close frame.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.app_state.shutdown.clone();

        let generator_task = self.generator.map(|generator| {
            tracing::info!("Starting message generator");
            generator.spawn(shutdown.clone())
        });

        let app = router(self.app_state);

        let token = shutdown.clone();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                token.cancel();
            })
            .await;

        // Also reached when serving failed
        shutdown.cancel();
        if let Some(task) = generator_task
            && let Err(e) = task.await
        {
            tracing::warn!("Message generator task failed: {}", e);
        }

        result
    }
}

fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/groups", get(get_groups))
        .route("/api/messages", get(get_recent_messages))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
