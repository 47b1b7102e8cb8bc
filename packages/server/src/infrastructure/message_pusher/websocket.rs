//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（容量付き `Sender`）を管理
//! - `Notification` を JSON フレームにエンコードして送信キューに投入
//!
//! ## 設計ノート
//!
//! WebSocket への書き込みは UI 層（`src/ui/handler/websocket.rs`）の送信タスクが行います。
//! この実装は `try_send` でキューへの投入のみを行うため、遅いクライアントが
//! ブロードキャスト全体を待たせることはありません。
//! キューが満杯のクライアントへのフレームは破棄され、配送失敗として記録されます。
//! 1 つの接続に対する投入は常にこの Mutex の下で行われるため、接続ごとの順序が保持されます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{
    ConnectionId, DeliveryReport, MessagePushError, MessagePusher, Notification, PusherChannel,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信キュー
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn encode(notification: &Notification) -> Result<String, MessagePushError> {
        let event = ServerEvent::from(notification);
        serde_json::to_string(&event).map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
    }

    fn enqueue(
        id: &ConnectionId,
        sender: &PusherChannel,
        frame: String,
    ) -> Result<(), MessagePushError> {
        sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => MessagePushError::QueueFull(id.as_str().to_string()),
            TrySendError::Closed(_) => {
                MessagePushError::PushFailed(format!("channel of client '{}' is closed", id))
            }
        })
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", id);
        clients.insert(id, sender);
    }

    async fn unregister_client(&self, id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", id);
    }

    async fn push_to(
        &self,
        id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let frame = Self::encode(notification)?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(id)
            .ok_or_else(|| MessagePushError::ClientNotFound(id.as_str().to_string()))?;
        Self::enqueue(id, sender, frame)?;
        tracing::debug!("Pushed notification to client '{}'", id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notification: &Notification,
    ) -> Result<DeliveryReport, MessagePushError> {
        let frame = Self::encode(notification)?;
        let clients = self.clients.lock().await;

        let mut report = DeliveryReport::default();
        for target in targets {
            // ブロードキャストでは一部の送信失敗を許容
            match clients.get(&target) {
                Some(sender) => match Self::enqueue(&target, sender, frame.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        tracing::warn!("Failed to push notification to client '{}': {}", target, e);
                        report.failed.push(target);
                    }
                },
                None => {
                    tracing::warn!("Client '{}' not found during broadcast, skipping", target);
                    report.failed.push(target);
                }
            }
        }

        Ok(report)
    }
}
