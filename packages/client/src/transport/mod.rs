//! Transport seam between the session state machine and the wire.
//!
//! A [`Connector`] performs the handshake and hands back a [`Link`]: a stream
//! of decoded server events and a sink for outgoing calls. The link is lost
//! when `events` yields `None`; dropping the link closes the connection.

mod websocket;

pub use websocket::{WebSocketConnector, decode_event};

use async_trait::async_trait;
use beacon_server::{
    domain::{ActivityEvent, ConnectionId, Message},
    infrastructure::dto::websocket::ClientInvocation,
};
use tokio::sync::mpsc;

use crate::error::ClientError;

/// Decoded server push event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(Message),
    Activity(ActivityEvent),
    Completion {
        invocation_id: u64,
        error: Option<String>,
    },
}

/// An established connection
pub struct Link {
    /// Identifier assigned by the server in the handshake
    pub connection_id: ConnectionId,
    pub events: mpsc::UnboundedReceiver<InboundEvent>,
    pub calls: mpsc::UnboundedSender<ClientInvocation>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection and complete the handshake.
    async fn connect(&self) -> Result<Link, ClientError>;
}
