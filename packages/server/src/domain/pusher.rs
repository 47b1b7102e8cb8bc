//! MessagePusher trait 定義
//!
//! クライアントへの通知送信のインターフェース。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ActivityEvent, ConnectionId, Message, MessagePushError};

/// クライアントごとの送信キューの容量
pub const OUTBOUND_QUEUE_CAPACITY: usize = 1024;

/// クライアントへ送信するエンコード済みフレームのチャンネル
pub type PusherChannel = mpsc::Sender<String>;

/// 送信キューの受信側（UI 層の送信タスクが読み出す）
pub type PusherReceiver = mpsc::Receiver<String>;

/// 容量 `capacity`（最小 1）の送信キューを作成
pub fn pusher_channel(capacity: usize) -> (PusherChannel, PusherReceiver) {
    mpsc::channel(capacity.max(1))
}

/// サーバーからクライアントへ送信する通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// 接続直後に送信される接続 ID
    Handshake { connection_id: ConnectionId },
    ReceiveMessage(Message),
    Activity(ActivityEvent),
    /// クライアントからの呼び出し（JoinGroup / LeaveGroup）への応答
    Completion {
        invocation_id: u64,
        error: Option<String>,
    },
}

/// ブロードキャストの配送結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<ConnectionId>,
}

/// MessagePusher trait
///
/// 送信はクライアントごとの送信キューへの投入で完了します（fire-and-forget）。
/// キューが満杯のクライアントへの送信は待たずに失敗扱いになります。
/// 同一クライアントへの送信順序は保持されます。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, id: &ConnectionId);

    /// 特定のクライアントに送信
    async fn push_to(
        &self,
        id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントに送信
    ///
    /// 個々の送信失敗は `DeliveryReport::failed` に記録され、残りの送信は継続されます。
    /// エンコードに失敗した場合のみ `Err` を返します。
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notification: &Notification,
    ) -> Result<DeliveryReport, MessagePushError>;
}
