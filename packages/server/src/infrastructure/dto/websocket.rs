//! WebSocket frame DTOs.
//!
//! Every frame is a JSON text message.
//!
//! Server → client: `{"event": "<name>", "payload": <value>}`
//!
//! ```json
//! {"event":"Handshake","payload":{"connectionId":"6f1c..."}}
//! {"event":"ReceiveMessage","payload":{"id":"...","content":"Cache atualizado","timestamp":"2024-01-01T00:00:00.000Z","type":"info"}}
//! {"event":"UserJoined","payload":"Client 6f1c... joined group ops"}
//! {"event":"Completion","payload":{"invocationId":1,"error":null}}
//! ```
//!
//! Client → server:
//!
//! ```json
//! {"invocationId":1,"method":"JoinGroup","groupName":"ops"}
//! ```

use serde::{Deserialize, Serialize};

/// Message category on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Info,
    Warning,
    Success,
    Error,
}

/// Message wire shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    pub content: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub r#type: MessageType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakePayload {
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    pub invocation_id: u64,
    pub error: Option<String>,
}

/// Server-to-client push event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum ServerEvent {
    Handshake(HandshakePayload),
    ReceiveMessage(MessageDto),
    UserConnected(String),
    UserDisconnected(String),
    UserJoined(String),
    UserLeft(String),
    Completion(CompletionPayload),
}

/// Client-to-server call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ClientCall {
    JoinGroup {
        #[serde(rename = "groupName")]
        group_name: String,
    },
    LeaveGroup {
        #[serde(rename = "groupName")]
        group_name: String,
    },
}

impl ClientCall {
    pub fn group_name(&self) -> &str {
        match self {
            ClientCall::JoinGroup { group_name } | ClientCall::LeaveGroup { group_name } => {
                group_name
            }
        }
    }
}

/// Client-to-server call with the id used to correlate its `Completion`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInvocation {
    pub invocation_id: u64,
    #[serde(flatten)]
    pub call: ClientCall,
}
