//! UseCase: グループ参加処理
//!
//! 参加後、グループのメンバー（参加者本人を含む）に UserJoined を通知します。

use std::sync::Arc;

use beacon_shared::time::Clock;

use crate::domain::{ActivityEvent, ConnectionId, ConnectionRegistry, GroupName, Timestamp};

use super::{
    broadcast::{BroadcastScope, Broadcaster},
    error::GroupMembershipError,
};

/// グループ参加のユースケース
pub struct JoinGroupUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl JoinGroupUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        broadcaster: Arc<Broadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            clock,
        }
    }

    /// グループ参加を実行
    ///
    /// 通知の失敗は参加処理の失敗として扱いません。
    pub async fn execute(
        &self,
        id: &ConnectionId,
        group_name: &str,
    ) -> Result<GroupName, GroupMembershipError> {
        let group = GroupName::new(group_name)?;
        self.registry.join(id, &group).await?;
        tracing::info!("Connection '{}' joined group '{}'", id, group);

        let event = ActivityEvent::joined(id, &group, Timestamp::new(self.clock.now()));
        if let Err(e) = self
            .broadcaster
            .broadcast_activity(&BroadcastScope::Group(group.clone()), event)
            .await
        {
            tracing::warn!("Failed to broadcast UserJoined for '{}': {}", id, e);
        }

        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessagePusher, RegistryError, ValueObjectError},
        infrastructure::{
            dto::websocket::ServerEvent, message_pusher::WebSocketMessagePusher,
            repository::InMemoryConnectionRegistry,
        },
    };
    use beacon_shared::time::SystemClock;
    use tokio::sync::mpsc;

    fn create_usecase() -> (
        Arc<InMemoryConnectionRegistry>,
        Arc<WebSocketMessagePusher>,
        JoinGroupUseCase,
    ) {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone(), pusher.clone(), 10));
        let usecase = JoinGroupUseCase::new(registry.clone(), broadcaster, Arc::new(SystemClock));
        (registry, pusher, usecase)
    }

    #[tokio::test]
    async fn test_join_notifies_group_members_only() {
        // テスト項目: 参加通知はグループのメンバー（本人含む）にのみ届く
        // given (前提条件):
        let (registry, pusher, usecase) = create_usecase();
        let alice = registry.register().await.unwrap();
        let bob = registry.register().await.unwrap();
        let (alice_tx, mut alice_rx) = mpsc::channel(64);
        let (bob_tx, mut bob_rx) = mpsc::channel(64);
        pusher.register_client(alice.clone(), alice_tx).await;
        pusher.register_client(bob.clone(), bob_tx).await;

        // when (操作):
        let group = usecase.execute(&alice, "ops").await.unwrap();

        // then (期待する結果):
        assert_eq!(group.as_str(), "ops");
        assert!(registry.members_of(&group).await.contains(&alice));
        let frame = alice_rx.recv().await.unwrap();
        assert!(matches!(
            serde_json::from_str::<ServerEvent>(&frame).unwrap(),
            ServerEvent::UserJoined(_)
        ));
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_join_with_blank_group_name_fails() {
        // テスト項目: 空のグループ名では参加できず、状態も変わらない
        // given (前提条件):
        let (registry, _pusher, usecase) = create_usecase();
        let alice = registry.register().await.unwrap();

        // when (操作):
        let result = usecase.execute(&alice, "  ").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(GroupMembershipError::InvalidGroupName(
                ValueObjectError::BlankGroupName
            ))
        );
        assert!(registry.group_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_connection_fails() {
        // テスト項目: 登録されていない接続は参加できない
        // given (前提条件):
        let (_registry, _pusher, usecase) = create_usecase();
        let ghost = ConnectionId::generate();

        // when (操作):
        let result = usecase.execute(&ghost, "ops").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(GroupMembershipError::Registry(
                RegistryError::ConnectionNotFound(ghost.as_str().to_string())
            ))
        );
    }
}
