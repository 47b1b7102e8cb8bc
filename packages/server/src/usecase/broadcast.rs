//! Group Broadcaster
//!
//! Resolves a scope (all connections, or the members of one group) to a
//! point-in-time snapshot of connection ids and fans a notification out to
//! each of them. Connections that register or join after the snapshot was
//! taken do not receive the notification.
//!
//! Every broadcast `Message` is also appended to a bounded in-memory log.

use std::sync::Arc;

use beacon_shared::buffer::BoundedBuffer;
use tokio::sync::Mutex;

use crate::domain::{
    ActivityEvent, ConnectionId, ConnectionRegistry, DeliveryReport, GroupName, Message,
    MessagePusher, Notification,
};

use super::error::BroadcastError;

/// Default number of messages kept in the server-side log
pub const DEFAULT_MESSAGE_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastScope {
    All,
    Group(GroupName),
}

pub struct Broadcaster {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    message_log: Mutex<BoundedBuffer<Message>>,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        message_log_capacity: usize,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            message_log: Mutex::new(BoundedBuffer::new(message_log_capacity)),
        }
    }

    /// Deliver `message` to every connection registered at call time.
    pub async fn broadcast_all(&self, message: Message) -> Result<DeliveryReport, BroadcastError> {
        self.broadcast_message(&BroadcastScope::All, message).await
    }

    /// Deliver `message` to the members of `group` at call time.
    pub async fn broadcast_group(
        &self,
        group: &GroupName,
        message: Message,
    ) -> Result<DeliveryReport, BroadcastError> {
        self.broadcast_message(&BroadcastScope::Group(group.clone()), message)
            .await
    }

    pub async fn broadcast_activity(
        &self,
        scope: &BroadcastScope,
        event: ActivityEvent,
    ) -> Result<DeliveryReport, BroadcastError> {
        self.deliver(scope, &Notification::Activity(event)).await
    }

    /// Snapshot of the message log, oldest first
    pub async fn recent_messages(&self) -> Vec<Message> {
        self.message_log.lock().await.to_vec()
    }

    async fn broadcast_message(
        &self,
        scope: &BroadcastScope,
        message: Message,
    ) -> Result<DeliveryReport, BroadcastError> {
        self.message_log.lock().await.push(message.clone());
        self.deliver(scope, &Notification::ReceiveMessage(message))
            .await
    }

    async fn resolve(&self, scope: &BroadcastScope) -> Vec<ConnectionId> {
        let targets = match scope {
            BroadcastScope::All => self.registry.all_connections().await,
            BroadcastScope::Group(group) => self.registry.members_of(group).await,
        };
        targets.into_iter().collect()
    }

    async fn deliver(
        &self,
        scope: &BroadcastScope,
        notification: &Notification,
    ) -> Result<DeliveryReport, BroadcastError> {
        let targets = self.resolve(scope).await;
        let report = self.message_pusher.broadcast(targets, notification).await?;
        if !report.failed.is_empty() {
            tracing::warn!(
                "Broadcast to {:?}: {} delivered, {} skipped",
                scope,
                report.delivered,
                report.failed.len()
            );
        } else {
            tracing::debug!("Broadcast to {:?}: {} delivered", scope, report.delivered);
        }
        Ok(report)
    }
}
