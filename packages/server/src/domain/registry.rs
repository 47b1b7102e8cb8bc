//! Connection registry port.

use std::collections::HashSet;

use async_trait::async_trait;

use super::{Connection, ConnectionId, GroupName, RegistryError};

/// Connection Registry trait
///
/// The single source of truth for live connections and group memberships.
/// Every mutation is atomic with respect to concurrent calls from other
/// connections; queries return point-in-time snapshots.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Allocate a fresh connection. Fails only when no more connections can be accepted.
    async fn register(&self) -> Result<ConnectionId, RegistryError>;

    /// Remove a connection and all its memberships. Idempotent.
    async fn unregister(&self, id: &ConnectionId) -> Option<Connection>;

    /// Add the connection to a group, creating the group if needed. Idempotent.
    async fn join(&self, id: &ConnectionId, group: &GroupName) -> Result<(), RegistryError>;

    /// Remove the connection from a group, reclaiming the group if it becomes empty. Idempotent.
    async fn leave(&self, id: &ConnectionId, group: &GroupName);

    async fn members_of(&self, group: &GroupName) -> HashSet<ConnectionId>;

    async fn all_connections(&self) -> HashSet<ConnectionId>;

    async fn groups_of(&self, id: &ConnectionId) -> HashSet<GroupName>;

    /// Group names sorted alphabetically
    async fn group_names(&self) -> Vec<GroupName>;

    async fn count(&self) -> usize;
}
