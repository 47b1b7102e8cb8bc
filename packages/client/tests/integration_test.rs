//! End-to-end tests: an in-process server on an ephemeral port and real
//! WebSocket clients.
//!
//! # テスト作業記録
//!
//! - サーバーは `Server::serve` でポート 0 にバインドし、メッセージ生成は無効化
//!   （配信は `Broadcaster` を直接呼び出して決定的に行う）
//! - 接続断はサーバー側で `DisconnectClientUseCase` を呼び出して発生させる

use std::{net::SocketAddr, sync::Arc, time::Duration};

use beacon_client::{
    ClientError, ClientSession, ReconnectPolicy, SessionConfig, SessionEvent, SessionState,
    transport::WebSocketConnector,
};
use beacon_server::{
    domain::{
        ConnectionId, ConnectionRegistry, GroupName, Message, MessageCategory, MessageContent,
        MessageId, MessagePusher, Timestamp,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryConnectionRegistry,
    },
    ui::{AppState, Server},
    usecase::{
        Broadcaster, ConnectClientUseCase, DisconnectClientUseCase, GetGroupsUseCase,
        GetRecentMessagesUseCase, JoinGroupUseCase, LeaveGroupUseCase,
    },
};
use beacon_shared::time::{Clock, SystemClock, parse_rfc3339_utc};
use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::TcpListener,
    sync::{broadcast, oneshot},
    task::JoinHandle,
    time::timeout,
};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    addr: SocketAddr,
    broadcaster: Arc<Broadcaster>,
    disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start(max_connections: Option<usize>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let registry: Arc<dyn ConnectionRegistry> = match max_connections {
            Some(max) => Arc::new(InMemoryConnectionRegistry::with_max_connections(max)),
            None => Arc::new(InMemoryConnectionRegistry::new()),
        };
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            message_pusher.clone(),
            100,
        ));

        let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(
            registry.clone(),
            message_pusher.clone(),
            broadcaster.clone(),
            clock.clone(),
        ));
        let app_state = AppState {
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(
                registry.clone(),
                message_pusher.clone(),
                broadcaster.clone(),
                clock.clone(),
            )),
            disconnect_client_usecase: disconnect_client_usecase.clone(),
            join_group_usecase: Arc::new(JoinGroupUseCase::new(
                registry.clone(),
                broadcaster.clone(),
                clock.clone(),
            )),
            leave_group_usecase: Arc::new(LeaveGroupUseCase::new(
                registry.clone(),
                broadcaster.clone(),
                clock.clone(),
            )),
            get_groups_usecase: Arc::new(GetGroupsUseCase::new(registry.clone())),
            get_recent_messages_usecase: Arc::new(GetRecentMessagesUseCase::new(
                broadcaster.clone(),
            )),
            message_pusher,
            clock,
            shutdown: CancellationToken::new(),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(Server::new(app_state, None).serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            broadcaster,
            disconnect_client_usecase,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn session(&self, reconnect_policy: ReconnectPolicy) -> ClientSession {
        ClientSession::new(
            Arc::new(WebSocketConnector::new(self.ws_url())),
            SessionConfig {
                reconnect_policy,
                ..SessionConfig::default()
            },
        )
    }

    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        timeout(WAIT, self.handle)
            .await
            .expect("server did not shut down")
            .unwrap()
            .unwrap();
    }
}

fn message(id: &str, content: &str) -> Message {
    Message {
        id: MessageId::new(id.to_string()).unwrap(),
        content: MessageContent::new(content.to_string()).unwrap(),
        category: MessageCategory::Info,
        timestamp: Timestamp::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
    }
}

async fn next_message(events: &mut broadcast::Receiver<SessionEvent>) -> Message {
    timeout(WAIT, async {
        loop {
            if let SessionEvent::MessageReceived(message) = events.recv().await.unwrap() {
                return message;
            }
        }
    })
    .await
    .expect("timed out waiting for a message")
}

#[tokio::test]
async fn test_broadcast_group_membership_and_reconnect() {
    // テスト項目: 接続 → 全体配信 → グループ参加 → グループ配信（非メンバーには届かない）→ 接続断 → 再接続
    // given (前提条件):
    let server = TestServer::start(None).await;
    let client = server.session(ReconnectPolicy::from_millis(&[300, 1_000]));
    let other = server.session(ReconnectPolicy::default());
    let mut client_events = client.subscribe();
    let mut other_events = other.subscribe();

    let client_id = client.start().await.unwrap();
    other.start().await.unwrap();
    let status = client.status();
    assert!(status.is_connected);
    assert_eq!(status.reconnect_attempts, 0);

    // when (操作): 全体配信
    let m1 = message("m1", "Sistema funcionando normalmente");
    server.broadcaster.broadcast_all(m1.clone()).await.unwrap();

    // then (期待する結果):
    assert_eq!(next_message(&mut client_events).await, m1);
    assert_eq!(next_message(&mut other_events).await, m1);
    assert_eq!(client.messages().await, vec![m1.clone()]);

    // when (操作): グループ参加
    client.join_group("ops").await.unwrap();

    // then (期待する結果):
    let groups: serde_json::Value = reqwest::get(server.http_url("/api/groups"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(groups["connectionCount"], 2);
    assert_eq!(
        groups["groups"],
        serde_json::json!([{ "name": "ops", "members": [client_id.as_str()] }])
    );

    // when (操作): グループ配信
    let m2 = message("m2", "Cache atualizado");
    let ops = GroupName::new("ops").unwrap();
    let report = server.broadcaster.broadcast_group(&ops, m2.clone()).await.unwrap();

    // then (期待する結果):
    assert_eq!(report.delivered, 1);
    assert_eq!(next_message(&mut client_events).await, m2);
    assert_eq!(client.messages().await, vec![m1.clone(), m2.clone()]);

    // 非メンバーは m2 を受け取らない（接続ごとの FIFO により、後続の m3 の前に m2 が無いことを確認）
    let m3 = message("m3", "Monitoramento ativo");
    server.broadcaster.broadcast_all(m3.clone()).await.unwrap();
    assert_eq!(next_message(&mut other_events).await, m3);
    assert_eq!(other.messages().await, vec![m1.clone(), m3.clone()]);
    assert_eq!(next_message(&mut client_events).await, m3);

    // when (操作): サーバー側で接続を切断
    let mut status = client.watch_status();
    server
        .disconnect_client_usecase
        .execute(&client_id)
        .await
        .unwrap();

    // then (期待する結果):
    let reconnecting = timeout(WAIT, status.wait_for(|s| s.state == SessionState::Reconnecting))
        .await
        .expect("client did not notice the connection loss")
        .unwrap()
        .clone();
    assert!(!reconnecting.is_connected);

    let reconnected = timeout(WAIT, status.wait_for(|s| s.state == SessionState::Connected))
        .await
        .expect("client did not reconnect")
        .unwrap()
        .clone();
    assert!(reconnected.is_connected);
    assert_eq!(reconnected.reconnect_attempts, 0);
    let new_id: ConnectionId = reconnected.connection_id.unwrap();
    assert_ne!(new_id, client_id);

    // 再接続後もバッファは保持される
    assert_eq!(client.messages().await.len(), 3);

    client.stop().await;
    other.stop().await;
    server.stop().await;
}

#[tokio::test]
async fn test_handshake_and_invocation_completion_on_the_wire() {
    // テスト項目: 最初のフレームはハンドシェイクで、呼び出しには Completion で応答する（不正なグループ名はエラー付き）
    // given (前提条件):
    let server = TestServer::start(None).await;
    let (mut ws, _) = connect_async(server.ws_url()).await.unwrap();

    // when (操作):
    let first = ws.next().await.unwrap().unwrap();

    // then (期待する結果):
    let WsMessage::Text(first) = first else {
        panic!("expected a text frame, got {:?}", first);
    };
    let handshake: serde_json::Value = serde_json::from_str(first.as_str()).unwrap();
    assert_eq!(handshake["event"], "Handshake");
    assert!(handshake["payload"]["connectionId"].as_str().is_some());

    // when (操作):
    let call = r#"{"invocationId":1,"method":"JoinGroup","groupName":"   "}"#;
    ws.send(WsMessage::Text(call.into())).await.unwrap();

    // then (期待する結果):
    let completion = timeout(WAIT, async {
        loop {
            let frame = ws.next().await.unwrap().unwrap();
            if let WsMessage::Text(text) = frame {
                let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
                if value["event"] == "Completion" {
                    return value;
                }
            }
        }
    })
    .await
    .expect("no completion received");
    assert_eq!(completion["payload"]["invocationId"], 1);
    assert!(completion["payload"]["error"].as_str().is_some());

    ws.close(None).await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn test_capacity_exceeded_rejects_upgrade() {
    // テスト項目: 接続数の上限に達している場合、新しい接続は 503 で拒否される
    // given (前提条件):
    let server = TestServer::start(Some(1)).await;
    let first = server.session(ReconnectPolicy::default());
    first.start().await.unwrap();

    // when (操作):
    let second = server.session(ReconnectPolicy::default());
    let result = second.start().await;

    // then (期待する結果):
    let Err(ClientError::ConnectionError(reason)) = result else {
        panic!("expected a connection error, got {:?}", result);
    };
    assert!(reason.contains("503"), "unexpected reason: {}", reason);
    assert_eq!(second.status().state, SessionState::Disconnected);

    first.stop().await;
    second.stop().await;
    server.stop().await;
}

#[tokio::test]
async fn test_health_and_message_log_endpoints() {
    // テスト項目: ヘルスチェックが Healthy と UTC タイムスタンプを返し、配信済みメッセージがログに残る
    // given (前提条件):
    let server = TestServer::start(None).await;
    server
        .broadcaster
        .broadcast_all(message("m1", "Métricas coletadas"))
        .await
        .unwrap();

    // when (操作):
    let health: serde_json::Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let log: serde_json::Value = reqwest::get(server.http_url("/api/messages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health["status"], "Healthy");
    assert!(parse_rfc3339_utc(health["timestamp"].as_str().unwrap()).is_ok());
    assert_eq!(
        log["messages"],
        serde_json::json!([{
            "id": "m1",
            "content": "Métricas coletadas",
            "timestamp": "2024-01-01T00:00:00.000Z",
            "type": "info"
        }])
    );

    server.stop().await;
}
