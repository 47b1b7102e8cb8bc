//! UseCase: グループ離脱処理
//!
//! 離脱後、グループに残っているメンバーに UserLeft を通知します。

use std::sync::Arc;

use beacon_shared::time::Clock;

use crate::domain::{ActivityEvent, ConnectionId, ConnectionRegistry, GroupName, Timestamp};

use super::{
    broadcast::{BroadcastScope, Broadcaster},
    error::GroupMembershipError,
};

/// グループ離脱のユースケース
pub struct LeaveGroupUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl LeaveGroupUseCase {
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

    /// グループ離脱を実行（未参加のグループでもエラーにならない）
    pub async fn execute(
        &self,
        id: &ConnectionId,
        group_name: &str,
    ) -> Result<GroupName, GroupMembershipError> {
        let group = GroupName::new(group_name)?;
        self.registry.leave(id, &group).await;
        tracing::info!("Connection '{}' left group '{}'", id, group);

        let event = ActivityEvent::left(id, &group, Timestamp::new(self.clock.now()));
        if let Err(e) = self
            .broadcaster
            .broadcast_activity(&BroadcastScope::Group(group.clone()), event)
            .await
        {
            tracing::warn!("Failed to broadcast UserLeft for '{}': {}", id, e);
        }

        Ok(group)
    }
}
