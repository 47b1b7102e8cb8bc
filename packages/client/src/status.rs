//! Observable connection status.

use std::fmt;

use beacon_server::domain::ConnectionId;
use chrono::{DateTime, Utc};

/// Client session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::Connecting => "Connecting",
            SessionState::Connected => "Connected",
            SessionState::Reconnecting => "Reconnecting",
        };
        f.write_str(label)
    }
}

/// Coarse status record published on every session transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: SessionState,
    pub is_connected: bool,
    pub connection_id: Option<ConnectionId>,
    pub last_activity: Option<DateTime<Utc>>,
    /// Failed reconnect attempts since the connection was lost; 0 once connected
    pub reconnect_attempts: u32,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: SessionState::Disconnected,
            is_connected: false,
            connection_id: None,
            last_activity: None,
            reconnect_attempts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_disconnected() {
        // テスト項目: 初期状態は未接続で、接続 ID や再接続回数を持たない
        // given (前提条件):

        // when (操作):
        let status = ConnectionStatus::default();

        // then (期待する結果):
        assert_eq!(status.state, SessionState::Disconnected);
        assert!(!status.is_connected);
        assert!(status.connection_id.is_none());
        assert!(status.last_activity.is_none());
        assert_eq!(status.reconnect_attempts, 0);
    }

    #[test]
    fn test_session_state_display() {
        // テスト項目: 状態が UI 表示用のラベルに変換される
        // given (前提条件):
        let states = [
            SessionState::Disconnected,
            SessionState::Connecting,
            SessionState::Connected,
            SessionState::Reconnecting,
        ];

        // when (操作):
        let labels: Vec<String> = states.iter().map(|s| s.to_string()).collect();

        // then (期待する結果):
        assert_eq!(
            labels,
            vec!["Disconnected", "Connecting", "Connected", "Reconnecting"]
        );
    }
}
