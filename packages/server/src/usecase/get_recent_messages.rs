//! UseCase: 直近のメッセージ取得（サーバー側の有界ログ）

use std::sync::Arc;

use crate::domain::Message;

use super::broadcast::Broadcaster;

pub struct GetRecentMessagesUseCase {
    broadcaster: Arc<Broadcaster>,
}

impl GetRecentMessagesUseCase {
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self { broadcaster }
    }

    /// 古い順のメッセージ一覧
    pub async fn execute(&self) -> Vec<Message> {
        self.broadcaster.recent_messages().await
    }
}
