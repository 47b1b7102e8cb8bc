//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ConnectionId, Notification, OUTBOUND_QUEUE_CAPACITY, PusherReceiver, pusher_channel},
    infrastructure::dto::websocket::{ClientCall, ClientInvocation},
    ui::state::AppState,
    usecase::ConnectError,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    // Create a channel for this client to receive notifications
    let (tx, rx) = pusher_channel(OUTBOUND_QUEUE_CAPACITY);

    let connection_id = match state.connect_client_usecase.execute(tx).await {
        Ok(id) => id,
        Err(ConnectError::CapacityExceeded(max)) => {
            tracing::warn!("Connection capacity ({}) exceeded. Rejecting connection.", max);
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    tracing::info!("Client '{}' connected and registered", connection_id);

    let failed_state = state.clone();
    let failed_id = connection_id.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade failed for '{}': {}", failed_id, e);
            tokio::spawn(async move {
                if let Err(e) = failed_state
                    .disconnect_client_usecase
                    .execute(&failed_id)
                    .await
                {
                    tracing::warn!("Failed to clean up '{}': {}", failed_id, e);
                }
            });
        })
        .on_upgrade(move |socket| handle_socket(socket, state, connection_id, rx)))
}

/// Spawns a task that forwards queued frames to the WebSocket sender.
///
/// Frames queued by the `MessagePusher` (handshake, messages, activity, completions)
/// are written in queue order. On server shutdown a Close frame is sent.
fn pusher_loop(
    mut rx: PusherReceiver,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else { break };
                    if sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                _ = shutdown.cancelled() => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    rx: PusherReceiver,
) {
    let (sender, mut receiver) = socket.split();

    // Start forwarding first so the queued handshake is the first frame on the wire
    let mut send_task = pusher_loop(rx, sender, state.shutdown.clone());

    // Broadcast UserConnected to everyone (including the new client)
    match state.connect_client_usecase.announce(&connection_id).await {
        Ok(report) => tracing::info!(
            "Broadcasted UserConnected for '{}' to {} client(s)",
            connection_id,
            report.delivered
        ),
        Err(e) => tracing::warn!("Failed to broadcast UserConnected: {}", e),
    }

    let recv_state = state.clone();
    let recv_id = connection_id.clone();

    // Spawn a task to receive invocations from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", recv_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => handle_invocation(&recv_state, &recv_id, &text).await,
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", recv_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    match state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await
    {
        Ok(Some(report)) => tracing::info!(
            "Client '{}' disconnected, notified {} client(s)",
            connection_id,
            report.delivered
        ),
        Ok(None) => tracing::debug!("Client '{}' was already removed", connection_id),
        Err(e) => tracing::warn!("Failed to broadcast UserDisconnected: {}", e),
    }
}

/// Dispatch a `JoinGroup` / `LeaveGroup` call and acknowledge it with a `Completion`.
async fn handle_invocation(state: &AppState, connection_id: &ConnectionId, text: &str) {
    let (invocation_id, error) = match serde_json::from_str::<ClientInvocation>(text) {
        Ok(invocation) => {
            let result = match &invocation.call {
                ClientCall::JoinGroup { group_name } => {
                    state
                        .join_group_usecase
                        .execute(connection_id, group_name)
                        .await
                }
                ClientCall::LeaveGroup { group_name } => {
                    state
                        .leave_group_usecase
                        .execute(connection_id, group_name)
                        .await
                }
            };
            (invocation.invocation_id, result.err().map(|e| e.to_string()))
        }
        Err(e) => {
            tracing::warn!("Invalid invocation from '{}': {}", connection_id, e);
            // Still acknowledge if the frame carries an invocation id
            let Some(invocation_id) = serde_json::from_str::<serde_json::Value>(text)
                .ok()
                .and_then(|value| value.get("invocationId")?.as_u64())
            else {
                return;
            };
            (invocation_id, Some(format!("Invalid invocation: {}", e)))
        }
    };

    let completion = Notification::Completion {
        invocation_id,
        error,
    };
    if let Err(e) = state
        .message_pusher
        .push_to(connection_id, &completion)
        .await
    {
        tracing::warn!("Failed to acknowledge invocation {}: {}", invocation_id, e);
    }
}
