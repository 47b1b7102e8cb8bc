//! UseCase: クライアント接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::execute() / announce()
//! - 接続 ID の割り当て、ハンドシェイクの送信、UserConnected の全体通知
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続にハンドシェイクが最初のフレームとして届く
//! - 異常系：接続数の上限超過

use std::sync::Arc;

use beacon_shared::time::Clock;

use crate::domain::{
    ActivityEvent, ConnectionId, ConnectionRegistry, DeliveryReport, MessagePusher, Notification,
    PusherChannel, Timestamp,
};

use super::{
    broadcast::{BroadcastScope, Broadcaster},
    error::{BroadcastError, ConnectError},
};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl ConnectClientUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        broadcaster: Arc<Broadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            broadcaster,
            clock,
        }
    }

    /// 接続を登録し、ハンドシェイクを送信キューに投入する
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 割り当てられた接続 ID
    /// * `Err(ConnectError)` - 接続数の上限超過など
    pub async fn execute(&self, sender: PusherChannel) -> Result<ConnectionId, ConnectError> {
        // 1. Registry に接続を登録（ID の割り当て）
        let id = self.registry.register().await?;

        // 2. MessagePusher に送信キューを登録
        self.message_pusher.register_client(id.clone(), sender).await;

        // 3. ハンドシェイクを最初のフレームとして送信
        let handshake = Notification::Handshake {
            connection_id: id.clone(),
        };
        if let Err(e) = self.message_pusher.push_to(&id, &handshake).await {
            self.message_pusher.unregister_client(&id).await;
            self.registry.unregister(&id).await;
            return Err(ConnectError::HandshakeFailed(e.to_string()));
        }

        Ok(id)
    }

    /// 接続したことを全ての接続（本人を含む）に通知する
    pub async fn announce(&self, id: &ConnectionId) -> Result<DeliveryReport, BroadcastError> {
        let event = ActivityEvent::connected(id, Timestamp::new(self.clock.now()));
        self.broadcaster
            .broadcast_activity(&BroadcastScope::All, event)
            .await
    }
}
