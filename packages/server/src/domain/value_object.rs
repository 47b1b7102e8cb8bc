//! Value objects.
//!
//! Constructors validate their input so that an instance is always valid.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::error::ValueObjectError;

/// Opaque, server-assigned connection identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyConnectionId);
        }
        Ok(Self(value))
    }

    /// Generate a fresh identifier (UUID v4)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a broadcast group
///
/// Surrounding whitespace is trimmed; the remaining name must be non-empty and
/// at most [`GroupName::MAX_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupName(String);

impl GroupName {
    pub const MAX_LEN: usize = 64;

    pub fn new(value: impl AsRef<str>) -> Result<Self, ValueObjectError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::BlankGroupName);
        }
        let len = trimmed.chars().count();
        if len > Self::MAX_LEN {
            return Err(ValueObjectError::GroupNameTooLong {
                max: Self::MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for GroupName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique message identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyMessageId);
        }
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Message body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyMessageContent);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Message category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    Info,
    Warning,
    Success,
    Error,
}

impl MessageCategory {
    pub const ALL: [MessageCategory; 4] = [
        MessageCategory::Info,
        MessageCategory::Warning,
        MessageCategory::Success,
        MessageCategory::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageCategory::Info => "info",
            MessageCategory::Warning => "warning",
            MessageCategory::Success => "success",
            MessageCategory::Error => "error",
        }
    }
}

impl FromStr for MessageCategory {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(MessageCategory::Info),
            "warning" => Ok(MessageCategory::Warning),
            "success" => Ok(MessageCategory::Success),
            "error" => Ok(MessageCategory::Error),
            other => Err(ValueObjectError::UnknownCategory(other.to_string())),
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UTC instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_name_is_trimmed() {
        // テスト項目: グループ名の前後の空白が除去される
        // given (前提条件):
        let input = "  ops ";

        // when (操作):
        let result = GroupName::new(input);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "ops");
    }

    #[test]
    fn test_group_name_rejects_blank() {
        // テスト項目: 空白のみのグループ名はエラーになる
        // given (前提条件):
        let input = "   ";

        // when (操作):
        let result = GroupName::new(input);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::BlankGroupName));
    }

    #[test]
    fn test_group_name_rejects_too_long() {
        // テスト項目: 上限を超える長さのグループ名はエラーになる
        // given (前提条件):
        let input = "g".repeat(GroupName::MAX_LEN + 1);

        // when (操作):
        let result = GroupName::new(&input);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::GroupNameTooLong {
                max: GroupName::MAX_LEN,
                actual: GroupName::MAX_LEN + 1,
            })
        );
    }

    #[test]
    fn test_connection_id_generate_is_unique() {
        // テスト項目: 生成される接続 ID は毎回異なる
        // given (前提条件):

        // when (操作):
        let first = ConnectionId::generate();
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
        assert!(!first.as_str().is_empty());
    }

    #[test]
    fn test_connection_id_rejects_empty() {
        // テスト項目: 空の接続 ID はエラーになる
        // given (前提条件):

        // when (操作):
        let result = ConnectionId::try_from(String::new());

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyConnectionId));
    }

    #[test]
    fn test_message_category_parses_known_values() {
        // テスト項目: 既知のカテゴリ文字列が相互変換できる
        // given (前提条件):

        // when (操作) / then (期待する結果):
        for category in MessageCategory::ALL {
            assert_eq!(category.as_str().parse::<MessageCategory>(), Ok(category));
        }
    }

    #[test]
    fn test_message_category_rejects_unknown_value() {
        // テスト項目: 未知のカテゴリ文字列はエラーになる
        // given (前提条件):

        // when (操作):
        let result = "debug".parse::<MessageCategory>();

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::UnknownCategory("debug".to_string()))
        );
    }

    #[test]
    fn test_message_content_rejects_empty() {
        // テスト項目: 空のメッセージ本文はエラーになる
        // given (前提条件):

        // when (操作):
        let result = MessageContent::new(String::new());

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyMessageContent));
    }
}
