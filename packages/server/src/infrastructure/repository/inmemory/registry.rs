//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する `ConnectionRegistry` trait の具体的な実装。
//! `GroupIndex` ドメインモデルを 1 つの Mutex で保護し、
//! register / unregister / join / leave を直列化（線形化）します。

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use beacon_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, GroupIndex, GroupName, RegistryError, Timestamp,
};

/// ID 生成の再試行回数の上限（UUID v4 の衝突は実質起きない）
const MAX_ID_ATTEMPTS: usize = 8;

/// インメモリ Connection Registry 実装
pub struct InMemoryConnectionRegistry {
    index: Arc<Mutex<GroupIndex>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryConnectionRegistry {
    /// 接続数の上限なしで作成
    pub fn new() -> Self {
        Self::with_index(GroupIndex::new(), Arc::new(SystemClock))
    }

    /// 接続数の上限付きで作成
    pub fn with_max_connections(max_connections: usize) -> Self {
        Self::with_index(
            GroupIndex::with_max_connections(max_connections),
            Arc::new(SystemClock),
        )
    }

    pub fn with_index(index: GroupIndex, clock: Arc<dyn Clock>) -> Self {
        Self {
            index: Arc::new(Mutex::new(index)),
            clock,
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self) -> Result<ConnectionId, RegistryError> {
        let mut index = self.index.lock().await;
        let connected_at = Timestamp::new(self.clock.now());

        let mut last_error = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = ConnectionId::generate();
            match index.insert_connection(Connection::new(id.clone(), connected_at)) {
                Ok(()) => {
                    tracing::debug!("Connection '{}' registered", id);
                    return Ok(id);
                }
                Err(RegistryError::DuplicateConnection(dup)) => {
                    last_error = Some(RegistryError::DuplicateConnection(dup));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(RegistryError::CapacityExceeded(index.len())))
    }

    async fn unregister(&self, id: &ConnectionId) -> Option<Connection> {
        let mut index = self.index.lock().await;
        let removed = index.remove_connection(id);
        if removed.is_some() {
            tracing::debug!("Connection '{}' unregistered", id);
        }
        removed
    }

    async fn join(&self, id: &ConnectionId, group: &GroupName) -> Result<(), RegistryError> {
        let mut index = self.index.lock().await;
        if index.join(id, group)? {
            tracing::debug!("Connection '{}' joined group '{}'", id, group);
        }
        Ok(())
    }

    async fn leave(&self, id: &ConnectionId, group: &GroupName) {
        let mut index = self.index.lock().await;
        if index.leave(id, group) {
            tracing::debug!("Connection '{}' left group '{}'", id, group);
        }
    }

    async fn members_of(&self, group: &GroupName) -> HashSet<ConnectionId> {
        self.index.lock().await.members_of(group)
    }

    async fn all_connections(&self) -> HashSet<ConnectionId> {
        self.index.lock().await.all_connections()
    }

    async fn groups_of(&self, id: &ConnectionId) -> HashSet<GroupName> {
        self.index.lock().await.groups_of(id)
    }

    async fn group_names(&self) -> Vec<GroupName> {
        self.index.lock().await.group_names()
    }

    async fn count(&self) -> usize {
        self.index.lock().await.len()
    }
}
