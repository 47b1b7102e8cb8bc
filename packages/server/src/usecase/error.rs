//! UseCase errors.

use thiserror::Error;

use crate::domain::{MessagePushError, MessageSourceError, RegistryError, ValueObjectError};

/// 接続処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Connection capacity exceeded (max {0})")]
    CapacityExceeded(usize),

    #[error("Connection registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Failed to send handshake: {0}")]
    HandshakeFailed(String),
}

impl From<RegistryError> for ConnectError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::CapacityExceeded(max) => ConnectError::CapacityExceeded(max),
            other => ConnectError::RegistryUnavailable(other.to_string()),
        }
    }
}

/// JoinGroup / LeaveGroup のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupMembershipError {
    #[error(transparent)]
    InvalidGroupName(#[from] ValueObjectError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// ブロードキャストのエラー（個々の配送失敗はエラーにならない）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("Failed to broadcast: {0}")]
    PushFailed(#[from] MessagePushError),
}

/// Message generator tick errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    #[error("Failed to produce message: {0}")]
    Source(#[from] MessageSourceError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}
