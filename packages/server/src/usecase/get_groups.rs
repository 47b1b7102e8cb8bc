//! UseCase: グループ一覧取得（デバッグ用）

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, GroupName};

/// グループとそのメンバー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub name: GroupName,
    /// ID 順にソート済み
    pub members: Vec<ConnectionId>,
}

pub struct GetGroupsUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetGroupsUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続数とグループ一覧（名前順）を返す
    pub async fn execute(&self) -> (usize, Vec<GroupSnapshot>) {
        let connection_count = self.registry.count().await;

        let mut groups = Vec::new();
        for name in self.registry.group_names().await {
            let mut members: Vec<ConnectionId> =
                self.registry.members_of(&name).await.into_iter().collect();
            if members.is_empty() {
                // 取得の間に空になったグループ
                continue;
            }
            members.sort();
            groups.push(GroupSnapshot { name, members });
        }

        (connection_count, groups)
    }
}
