//! WebSocket transport (tokio-tungstenite).

use std::sync::Arc;

use async_trait::async_trait;
use beacon_server::{
    domain::{ActivityEvent, ActivityKind, ConnectionId, Message, Timestamp},
    infrastructure::dto::websocket::{ClientInvocation, ServerEvent},
};
use beacon_shared::time::{Clock, SystemClock};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};

use super::{Connector, InboundEvent, Link};
use crate::error::ClientError;

pub struct WebSocketConnector {
    url: String,
    clock: Arc<dyn Clock>,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_clock(url, Arc::new(SystemClock))
    }

    /// Activity events carry no timestamp on the wire; `clock` stamps them on receipt.
    pub fn with_clock(url: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            url: url.into(),
            clock,
        }
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self) -> Result<Link, ClientError> {
        let (ws_stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        // The first server frame must be the handshake
        let connection_id = loop {
            match read.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    break parse_handshake(text.as_str())?;
                }
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
                Some(Ok(WsMessage::Close(_))) | None => {
                    return Err(ClientError::HandshakeFailed(
                        "connection closed before handshake".to_string(),
                    ));
                }
                Some(Ok(_)) => {
                    return Err(ClientError::HandshakeFailed(
                        "unexpected frame before handshake".to_string(),
                    ));
                }
                Some(Err(e)) => return Err(ClientError::ConnectionError(e.to_string())),
            }
        };
        tracing::debug!("Handshake completed, connection id '{}'", connection_id);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (calls_tx, mut calls_rx) = mpsc::unbounded_channel::<ClientInvocation>();

        // Reader: decode frames until the server closes or the link is dropped
        let clock = self.clock.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = events_tx.closed() => break,
                    frame = read.next() => match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            let Some(event) = decode_event(text.as_str(), clock.as_ref()) else {
                                continue;
                            };
                            if events_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Some(Ok(WsMessage::Close(_))) | None => {
                            tracing::info!("Server closed the connection");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::warn!("WebSocket read error: {}", e);
                            break;
                        }
                        // Ping/pong is handled by tungstenite
                        Some(Ok(_)) => {}
                    },
                }
            }
        });

        // Writer: forward calls; a dropped link closes the socket
        tokio::spawn(async move {
            while let Some(invocation) = calls_rx.recv().await {
                let json = match serde_json::to_string(&invocation) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize invocation: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(WsMessage::Text(json.into())).await {
                    tracing::warn!("Failed to send invocation: {}", e);
                    return;
                }
            }
            let _ = write.send(WsMessage::Close(None)).await;
        });

        Ok(Link {
            connection_id,
            events: events_rx,
            calls: calls_tx,
        })
    }
}

fn parse_handshake(text: &str) -> Result<ConnectionId, ClientError> {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(ServerEvent::Handshake(payload)) => ConnectionId::new(payload.connection_id)
            .map_err(|e| ClientError::HandshakeFailed(e.to_string())),
        Ok(other) => Err(ClientError::HandshakeFailed(format!(
            "expected Handshake, got {:?}",
            other
        ))),
        Err(e) => Err(ClientError::HandshakeFailed(e.to_string())),
    }
}

/// Decode one server frame.
///
/// Returns `None` (and logs) for frames that cannot be decoded or that are not
/// expected after the handshake.
pub fn decode_event(text: &str, clock: &dyn Clock) -> Option<InboundEvent> {
    let event = match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Failed to decode server frame: {}", e);
            return None;
        }
    };

    let activity = |kind, description| {
        InboundEvent::Activity(ActivityEvent::new(
            kind,
            description,
            Timestamp::new(clock.now()),
        ))
    };

    match event {
        ServerEvent::ReceiveMessage(dto) => match Message::try_from(dto) {
            Ok(message) => Some(InboundEvent::Message(message)),
            Err(e) => {
                tracing::warn!("Discarding malformed message: {}", e);
                None
            }
        },
        ServerEvent::UserConnected(text) => Some(activity(ActivityKind::Connected, text)),
        ServerEvent::UserDisconnected(text) => Some(activity(ActivityKind::Disconnected, text)),
        ServerEvent::UserJoined(text) => Some(activity(ActivityKind::Joined, text)),
        ServerEvent::UserLeft(text) => Some(activity(ActivityKind::Left, text)),
        ServerEvent::Completion(payload) => Some(InboundEvent::Completion {
            invocation_id: payload.invocation_id,
            error: payload.error,
        }),
        ServerEvent::Handshake(_) => {
            tracing::warn!("Ignoring unexpected handshake frame");
            None
        }
    }
}
