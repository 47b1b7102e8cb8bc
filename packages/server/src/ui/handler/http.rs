//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use beacon_shared::time::to_rfc3339_utc;

use crate::{
    infrastructure::dto::{
        http::{GroupDto, GroupsDto, HealthDto, MessageLogDto},
        websocket::MessageDto,
    },
    ui::state::AppState,
};

/// Liveness endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "Healthy".to_string(),
        timestamp: to_rfc3339_utc(&state.clock.now()),
    })
}

/// Debug endpoint: groups and their members
pub async fn get_groups(State(state): State<Arc<AppState>>) -> Json<GroupsDto> {
    let (connection_count, groups) = state.get_groups_usecase.execute().await;

    // Domain Model から DTO への変換
    let groups = groups
        .into_iter()
        .map(|group| GroupDto {
            name: group.name.into_string(),
            members: group
                .members
                .into_iter()
                .map(|id| id.into_string())
                .collect(),
        })
        .collect();

    Json(GroupsDto {
        connection_count,
        groups,
    })
}

/// Debug endpoint: bounded log of recently broadcast messages
pub async fn get_recent_messages(State(state): State<Arc<AppState>>) -> Json<MessageLogDto> {
    let messages = state.get_recent_messages_usecase.execute().await;
    Json(MessageLogDto {
        messages: messages.iter().map(MessageDto::from).collect(),
    })
}
