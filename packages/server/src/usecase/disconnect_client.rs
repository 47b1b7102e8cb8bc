//! UseCase: クライアント切断処理
//!
//! 接続と全てのグループ所属を削除し、残りの接続に UserDisconnected を通知します。
//! 既に削除済みの接続に対しては何もしません（冪等）。

use std::sync::Arc;

use beacon_shared::time::Clock;

use crate::domain::{
    ActivityEvent, ConnectionId, ConnectionRegistry, DeliveryReport, MessagePusher, Timestamp,
};

use super::{
    broadcast::{BroadcastScope, Broadcaster},
    error::BroadcastError,
};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl DisconnectClientUseCase {
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

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Some(report))` - 切断を通知した
    /// * `Ok(None)` - 既に切断済み
    pub async fn execute(
        &self,
        id: &ConnectionId,
    ) -> Result<Option<DeliveryReport>, BroadcastError> {
        self.message_pusher.unregister_client(id).await;

        let Some(connection) = self.registry.unregister(id).await else {
            return Ok(None);
        };
        tracing::debug!(
            "Connection '{}' removed from {} group(s)",
            id,
            connection.groups.len()
        );

        let event = ActivityEvent::disconnected(id, Timestamp::new(self.clock.now()));
        self.broadcaster
            .broadcast_activity(&BroadcastScope::All, event)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::GroupName,
        infrastructure::{
            dto::websocket::ServerEvent, message_pusher::WebSocketMessagePusher,
            repository::InMemoryConnectionRegistry,
        },
    };
    use beacon_shared::time::SystemClock;
    use tokio::sync::mpsc;

    struct Fixture {
        registry: Arc<InMemoryConnectionRegistry>,
        pusher: Arc<WebSocketMessagePusher>,
        usecase: DisconnectClientUseCase,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone(), pusher.clone(), 10));
        let usecase = DisconnectClientUseCase::new(
            registry.clone(),
            pusher.clone(),
            broadcaster,
            Arc::new(SystemClock),
        );
        Fixture {
            registry,
            pusher,
            usecase,
        }
    }

    #[tokio::test]
    async fn test_disconnect_removes_memberships_and_notifies_others() {
        // テスト項目: 切断で所属グループから削除され、残りの接続に通知される
        // given (前提条件):
        let fixture = fixture();
        let alice = fixture.registry.register().await.unwrap();
        let bob = fixture.registry.register().await.unwrap();
        let (alice_tx, _alice_rx) = mpsc::channel(64);
        let (bob_tx, mut bob_rx) = mpsc::channel(64);
        fixture.pusher.register_client(alice.clone(), alice_tx).await;
        fixture.pusher.register_client(bob.clone(), bob_tx).await;
        let ops = GroupName::new("ops").unwrap();
        fixture.registry.join(&alice, &ops).await.unwrap();

        // when (操作):
        let report = fixture.usecase.execute(&alice).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.map(|r| r.delivered), Some(1));
        assert!(fixture.registry.members_of(&ops).await.is_empty());
        let frame = bob_rx.recv().await.unwrap();
        match serde_json::from_str::<ServerEvent>(&frame).unwrap() {
            ServerEvent::UserDisconnected(text) => assert!(text.contains(alice.as_str())),
            other => panic!("expected UserDisconnected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        // テスト項目: 2 回目の切断は何も通知しない
        // given (前提条件):
        let fixture = fixture();
        let alice = fixture.registry.register().await.unwrap();
        fixture.usecase.execute(&alice).await.unwrap();

        // when (操作):
        let result = fixture.usecase.execute(&alice).await;

        // then (期待する結果):
        assert_eq!(result, Ok(None));
    }
}
