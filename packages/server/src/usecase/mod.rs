//! UseCase layer.
//!
//! Orchestrates the domain ports (`ConnectionRegistry`, `MessagePusher`,
//! `MessageSource`) into the operations exposed by the UI layer.

mod broadcast;
mod connect_client;
mod disconnect_client;
mod error;
mod generate_messages;
mod get_groups;
mod get_recent_messages;
mod join_group;
mod leave_group;

pub use broadcast::{BroadcastScope, Broadcaster};
pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{BroadcastError, ConnectError, GroupMembershipError, TickError};
pub use generate_messages::{GeneratorConfig, MessageGenerator, TickInterval};
pub use get_groups::{GetGroupsUseCase, GroupSnapshot};
pub use get_recent_messages::GetRecentMessagesUseCase;
pub use join_group::JoinGroupUseCase;
pub use leave_group::LeaveGroupUseCase;
