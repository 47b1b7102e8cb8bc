//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::MessageDto;

/// `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub timestamp: String,
}

/// `GET /api/groups`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsDto {
    pub connection_count: usize,
    pub groups: Vec<GroupDto>,
}

/// `GET /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLogDto {
    pub messages: Vec<MessageDto>,
}
