//! Entities.

use std::collections::HashSet;

use super::value_object::{
    ConnectionId, GroupName, MessageCategory, MessageContent, MessageId, Timestamp,
};

/// A live client connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub groups: HashSet<GroupName>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            groups: HashSet::new(),
            connected_at,
        }
    }
}

/// A status message pushed to clients. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub content: MessageContent,
    pub category: MessageCategory,
    pub timestamp: Timestamp,
}

impl Message {
    pub fn new(content: MessageContent, category: MessageCategory, timestamp: Timestamp) -> Self {
        Self {
            id: MessageId::generate(),
            content,
            category,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Connected,
    Disconnected,
    Joined,
    Left,
}

/// Transient notification about connection and membership activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: Timestamp,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind, description: String, timestamp: Timestamp) -> Self {
        Self {
            kind,
            description,
            timestamp,
        }
    }

    pub fn connected(id: &ConnectionId, timestamp: Timestamp) -> Self {
        Self::new(
            ActivityKind::Connected,
            format!("Client {} connected", id),
            timestamp,
        )
    }

    pub fn disconnected(id: &ConnectionId, timestamp: Timestamp) -> Self {
        Self::new(
            ActivityKind::Disconnected,
            format!("Client {} disconnected", id),
            timestamp,
        )
    }

    pub fn joined(id: &ConnectionId, group: &GroupName, timestamp: Timestamp) -> Self {
        Self::new(
            ActivityKind::Joined,
            format!("Client {} joined group {}", id, group),
            timestamp,
        )
    }

    pub fn left(id: &ConnectionId, group: &GroupName, timestamp: Timestamp) -> Self {
        Self::new(
            ActivityKind::Left,
            format!("Client {} left group {}", id, group),
            timestamp,
        )
    }
}
