//! Domain errors.

use thiserror::Error;

/// Value object construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Connection ID must not be empty")]
    EmptyConnectionId,

    #[error("Message ID must not be empty")]
    EmptyMessageId,

    #[error("Group name must not be blank")]
    BlankGroupName,

    #[error("Group name is too long ({actual} characters, max {max})")]
    GroupNameTooLong { max: usize, actual: usize },

    #[error("Message content must not be empty")]
    EmptyMessageContent,

    #[error("Unknown message category '{0}'")]
    UnknownCategory(String),
}

/// Connection registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No more connections can be accepted
    #[error("Connection capacity exceeded (max {0})")]
    CapacityExceeded(usize),

    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(String),
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),

    #[error("Outbound queue of client '{0}' is full")]
    QueueFull(String),

    #[error("Failed to encode notification: {0}")]
    EncodeFailed(String),
}

/// Message source errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageSourceError {
    #[error("Message source is unavailable: {0}")]
    Unavailable(String),

    #[error("Generated message is invalid: {0}")]
    InvalidMessage(#[from] ValueObjectError),
}
