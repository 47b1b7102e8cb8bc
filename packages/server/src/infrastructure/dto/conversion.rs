//! Conversion logic between DTOs and domain entities.

use beacon_shared::time::{parse_rfc3339_utc, to_rfc3339_utc};
use thiserror::Error;

use crate::domain::{
    ActivityEvent, ActivityKind, Message, MessageCategory, MessageContent, MessageId, Notification,
    Timestamp, ValueObjectError,
};
use crate::infrastructure::dto::websocket as dto;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error(transparent)]
    InvalidValue(#[from] ValueObjectError),
}

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::MessageType> for MessageCategory {
    fn from(dto: dto::MessageType) -> Self {
        match dto {
            dto::MessageType::Info => MessageCategory::Info,
            dto::MessageType::Warning => MessageCategory::Warning,
            dto::MessageType::Success => MessageCategory::Success,
            dto::MessageType::Error => MessageCategory::Error,
        }
    }
}

impl TryFrom<dto::MessageDto> for Message {
    type Error = ConversionError;

    fn try_from(dto: dto::MessageDto) -> Result<Self, Self::Error> {
        let timestamp = parse_rfc3339_utc(&dto.timestamp)
            .map_err(|_| ConversionError::InvalidTimestamp(dto.timestamp.clone()))?;
        Ok(Self {
            id: MessageId::new(dto.id)?,
            content: MessageContent::new(dto.content)?,
            category: dto.r#type.into(),
            timestamp: Timestamp::new(timestamp),
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<MessageCategory> for dto::MessageType {
    fn from(model: MessageCategory) -> Self {
        match model {
            MessageCategory::Info => dto::MessageType::Info,
            MessageCategory::Warning => dto::MessageType::Warning,
            MessageCategory::Success => dto::MessageType::Success,
            MessageCategory::Error => dto::MessageType::Error,
        }
    }
}

impl From<&Message> for dto::MessageDto {
    fn from(model: &Message) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            content: model.content.as_str().to_string(),
            timestamp: to_rfc3339_utc(&model.timestamp.value()),
            r#type: model.category.into(),
        }
    }
}

impl From<&ActivityEvent> for dto::ServerEvent {
    fn from(model: &ActivityEvent) -> Self {
        let text = model.description.clone();
        match model.kind {
            ActivityKind::Connected => dto::ServerEvent::UserConnected(text),
            ActivityKind::Disconnected => dto::ServerEvent::UserDisconnected(text),
            ActivityKind::Joined => dto::ServerEvent::UserJoined(text),
            ActivityKind::Left => dto::ServerEvent::UserLeft(text),
        }
    }
}

impl From<&Notification> for dto::ServerEvent {
    fn from(model: &Notification) -> Self {
        match model {
            Notification::Handshake { connection_id } => {
                dto::ServerEvent::Handshake(dto::HandshakePayload {
                    connection_id: connection_id.as_str().to_string(),
                })
            }
            Notification::ReceiveMessage(message) => {
                dto::ServerEvent::ReceiveMessage(message.into())
            }
            Notification::Activity(event) => event.into(),
            Notification::Completion {
                invocation_id,
                error,
            } => dto::ServerEvent::Completion(dto::CompletionPayload {
                invocation_id: *invocation_id,
                error: error.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionId;
    use chrono::DateTime;

    fn timestamp(millis: i64) -> Timestamp {
        Timestamp::new(DateTime::from_timestamp_millis(millis).unwrap())
    }

    #[test]
    fn test_domain_message_to_dto() {
        // テスト項目: ドメインの Message が UTC 文字列の DTO に変換される
        // given (前提条件):
        let message = Message {
            id: MessageId::new("m1".to_string()).unwrap(),
            content: MessageContent::new("Cache atualizado".to_string()).unwrap(),
            category: MessageCategory::Warning,
            timestamp: timestamp(1_672_531_200_000),
        };

        // when (操作):
        let dto_msg: dto::MessageDto = (&message).into();

        // then (期待する結果):
        assert_eq!(dto_msg.id, "m1");
        assert_eq!(dto_msg.content, "Cache atualizado");
        assert_eq!(dto_msg.timestamp, "2023-01-01T00:00:00.000Z");
        assert_eq!(dto_msg.r#type, dto::MessageType::Warning);
    }

    #[test]
    fn test_dto_message_to_domain_parses_timestamp() {
        // テスト項目: DTO の文字列タイムスタンプがドメインの時刻に変換される
        // given (前提条件):
        let dto_msg = dto::MessageDto {
            id: "m2".to_string(),
            content: "Backup realizado com sucesso".to_string(),
            timestamp: "2023-01-01T09:00:00.250+09:00".to_string(),
            r#type: dto::MessageType::Success,
        };

        // when (操作):
        let message = Message::try_from(dto_msg).unwrap();

        // then (期待する結果):
        assert_eq!(message.id.as_str(), "m2");
        assert_eq!(message.category, MessageCategory::Success);
        assert_eq!(message.timestamp, timestamp(1_672_531_200_250));
    }

    #[test]
    fn test_dto_message_with_invalid_timestamp_fails() {
        // テスト項目: 不正なタイムスタンプはエラーになる
        // given (前提条件):
        let dto_msg = dto::MessageDto {
            id: "m3".to_string(),
            content: "Monitoramento ativo".to_string(),
            timestamp: "not-a-date".to_string(),
            r#type: dto::MessageType::Info,
        };

        // when (操作):
        let result = Message::try_from(dto_msg);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConversionError::InvalidTimestamp("not-a-date".to_string()))
        );
    }

    #[test]
    fn test_activity_notification_maps_to_event_name() {
        // テスト項目: アクティビティの種類ごとに対応するイベント名へ変換される
        // given (前提条件):
        let id = ConnectionId::new("c1".to_string()).unwrap();
        let ts = timestamp(0);
        let cases = [
            (ActivityEvent::connected(&id, ts), "UserConnected"),
            (ActivityEvent::disconnected(&id, ts), "UserDisconnected"),
        ];

        for (event, expected) in cases {
            // when (操作):
            let server_event: dto::ServerEvent = (&Notification::Activity(event)).into();

            // then (期待する結果):
            let json: serde_json::Value = serde_json::to_value(&server_event).unwrap();
            assert_eq!(json["event"], expected);
        }
    }
}
