//! Server state shared by the handlers.

use std::sync::Arc;

use beacon_shared::time::Clock;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::MessagePusher,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, GetGroupsUseCase, GetRecentMessagesUseCase,
        JoinGroupUseCase, LeaveGroupUseCase,
    },
};

/// Shared application state
pub struct AppState {
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub join_group_usecase: Arc<JoinGroupUseCase>,
    pub leave_group_usecase: Arc<LeaveGroupUseCase>,
    pub get_groups_usecase: Arc<GetGroupsUseCase>,
    pub get_recent_messages_usecase: Arc<GetRecentMessagesUseCase>,
    /// MessagePusher（呼び出しへの Completion 送信に使用）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub clock: Arc<dyn Clock>,
    /// Cancelled when the server shuts down; closes open sockets and stops the generator
    pub shutdown: CancellationToken,
}
