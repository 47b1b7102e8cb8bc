//! Connection and group-membership index.
//!
//! Groups are derived from memberships: a group entry is created by the first
//! `join` and reclaimed as soon as its last member leaves or disconnects.
//! Invariant: `id ∈ groups[g]` iff `g ∈ connections[id].groups`.

use std::collections::{HashMap, HashSet};

use super::{
    entity::Connection,
    error::RegistryError,
    value_object::{ConnectionId, GroupName},
};

#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    connections: HashMap<ConnectionId, Connection>,
    groups: HashMap<GroupName, HashSet<ConnectionId>>,
    /// Maximum number of live connections (`None` = unlimited)
    max_connections: Option<usize>,
}

impl GroupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_connections(max_connections: usize) -> Self {
        Self {
            max_connections: Some(max_connections),
            ..Self::default()
        }
    }

    pub fn insert_connection(&mut self, connection: Connection) -> Result<(), RegistryError> {
        if let Some(max) = self.max_connections
            && self.connections.len() >= max
        {
            return Err(RegistryError::CapacityExceeded(max));
        }
        if self.connections.contains_key(&connection.id) {
            return Err(RegistryError::DuplicateConnection(
                connection.id.as_str().to_string(),
            ));
        }
        self.connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    /// Remove a connection together with all of its memberships.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(id)?;
        for group in &connection.groups {
            self.detach(id, group);
        }
        Some(connection)
    }

    /// Returns `true` if the connection was not already a member.
    pub fn join(&mut self, id: &ConnectionId, group: &GroupName) -> Result<bool, RegistryError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RegistryError::ConnectionNotFound(id.as_str().to_string()))?;

        if !connection.groups.insert(group.clone()) {
            return Ok(false);
        }
        self.groups
            .entry(group.clone())
            .or_default()
            .insert(id.clone());
        Ok(true)
    }

    /// Returns `true` if the connection was a member. Unknown connections are a no-op.
    pub fn leave(&mut self, id: &ConnectionId, group: &GroupName) -> bool {
        let removed = self
            .connections
            .get_mut(id)
            .is_some_and(|connection| connection.groups.remove(group));
        if removed {
            self.detach(id, group);
        }
        removed
    }

    fn detach(&mut self, id: &ConnectionId, group: &GroupName) {
        if let Some(members) = self.groups.get_mut(group) {
            members.remove(id);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    pub fn members_of(&self, group: &GroupName) -> HashSet<ConnectionId> {
        self.groups.get(group).cloned().unwrap_or_default()
    }

    pub fn all_connections(&self) -> HashSet<ConnectionId> {
        self.connections.keys().cloned().collect()
    }

    pub fn groups_of(&self, id: &ConnectionId) -> HashSet<GroupName> {
        self.connections
            .get(id)
            .map(|connection| connection.groups.clone())
            .unwrap_or_default()
    }

    pub fn group_names(&self) -> Vec<GroupName> {
        let mut names: Vec<GroupName> = self.groups.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Check the membership invariant in both directions.
    pub fn is_consistent(&self) -> bool {
        let forward = self.connections.values().all(|connection| {
            connection.groups.iter().all(|group| {
                self.groups
                    .get(group)
                    .is_some_and(|members| members.contains(&connection.id))
            })
        });
        let backward = self.groups.iter().all(|(group, members)| {
            !members.is_empty()
                && members.iter().all(|id| {
                    self.connections
                        .get(id)
                        .is_some_and(|connection| connection.groups.contains(group))
                })
        });
        forward && backward
    }
}
