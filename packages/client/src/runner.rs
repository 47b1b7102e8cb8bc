//! Interactive client execution logic.

use std::{collections::BTreeSet, sync::Arc};

use beacon_server::domain::ConnectionId;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{
    sync::{Mutex, broadcast, mpsc},
    task::JoinHandle,
};

use crate::{
    command::{CliCommand, parse_command},
    formatter::MessageFormatter,
    session::{ClientSession, SessionConfig, SessionEvent},
    status::ConnectionStatus,
    transport::WebSocketConnector,
    ui::{PROMPT, redisplay_prompt},
};

/// Groups the user is in; re-joined after every reconnect
type GroupSet = Arc<Mutex<BTreeSet<String>>>;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    /// Groups joined right after connecting
    pub groups: Vec<String>,
    pub session: SessionConfig,
}

/// Run the interactive client until `/quit`, Ctrl+C or Ctrl+D
///
/// # Errors
///
/// Returns an error if the initial connection fails. Later connection losses
/// are retried per the reconnect policy and never end the client.
pub async fn run_client(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let connector = Arc::new(WebSocketConnector::new(config.url.clone()));
    let session = Arc::new(ClientSession::new(connector, config.session));

    tracing::info!("Connecting to {}", config.url);
    let connection_id = session.start().await?;
    println!(
        "\nConnected as '{}'. Type /help for commands. Press Ctrl+C to exit.\n",
        connection_id
    );

    let groups: GroupSet = Arc::new(Mutex::new(config.groups.into_iter().collect()));
    join_groups(&session, &groups).await;

    let printer = spawn_event_printer(session.subscribe());
    let watcher = spawn_status_watcher(session.clone(), groups.clone());

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    spawn_readline(input_tx);

    while let Some(line) = input_rx.recv().await {
        match parse_command(&line) {
            Ok(CliCommand::Quit) => break,
            Ok(command) => execute(&session, &groups, command).await,
            Err(message) => println!("{}", message),
        }
    }

    session.stop().await;
    printer.abort();
    watcher.abort();
    tracing::info!("Client session ended normally");

    Ok(())
}

async fn execute(session: &ClientSession, groups: &GroupSet, command: CliCommand) {
    match command {
        CliCommand::Join(group) => match session.join_group(&group).await {
            Ok(()) => {
                println!("Joined group '{}'", group);
                groups.lock().await.insert(group);
            }
            Err(e) => println!("Failed to join '{}': {}", group, e),
        },
        CliCommand::Leave(group) => match session.leave_group(&group).await {
            Ok(()) => {
                println!("Left group '{}'", group);
                groups.lock().await.remove(&group);
            }
            Err(e) => println!("Failed to leave '{}': {}", group, e),
        },
        CliCommand::Status => print!("{}", MessageFormatter::format_status(&session.status())),
        CliCommand::Messages => {
            let messages = session.messages().await;
            print!("{}", MessageFormatter::format_message_list(&messages));
        }
        CliCommand::Clear => {
            session.clear_messages().await;
            println!("Message buffer cleared");
        }
        CliCommand::Help => print!("{}", MessageFormatter::format_help()),
        // Handled by the input loop
        CliCommand::Quit => {}
    }
}

async fn join_groups(session: &ClientSession, groups: &GroupSet) {
    let names: Vec<String> = groups.lock().await.iter().cloned().collect();
    for group in names {
        match session.join_group(&group).await {
            Ok(()) => tracing::info!("Joined group '{}'", group),
            Err(e) => tracing::warn!("Failed to join '{}': {}", group, e),
        }
    }
}

/// Print received messages and activity as they arrive
fn spawn_event_printer(mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::MessageReceived(message)) => {
                    print!("{}", MessageFormatter::format_message(&message));
                }
                Ok(SessionEvent::Activity(activity)) => {
                    print!("{}", MessageFormatter::format_activity(&activity));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Display lagged behind, skipped {} event(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            redisplay_prompt();
        }
    })
}

/// Print status transitions and restore group memberships after a reconnect
fn spawn_status_watcher(session: Arc<ClientSession>, groups: GroupSet) -> JoinHandle<()> {
    let mut status = session.watch_status();
    // Snapshot before spawning so a reconnect racing the spawn is still seen
    let mut last = status.borrow_and_update().clone();
    let mut reconnects = ReconnectDetector::new(&last);
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            if current.state != last.state
                || current.reconnect_attempts != last.reconnect_attempts
                || current.connection_id != last.connection_id
            {
                print!("{}", MessageFormatter::format_status(&current));
                redisplay_prompt();
            }
            if reconnects.observe(&current) {
                join_groups(&session, &groups).await;
            }
            last = current;
        }
    })
}

/// Recognizes a reconnect by a change of connection id.
///
/// `watch` only keeps the latest status, so the intermediate `Reconnecting`
/// may never be observed. Every successful reconnect carries a fresh id.
#[derive(Debug, Default)]
struct ReconnectDetector {
    last_connection_id: Option<ConnectionId>,
}

impl ReconnectDetector {
    fn new(status: &ConnectionStatus) -> Self {
        Self {
            last_connection_id: status.connection_id.clone(),
        }
    }

    /// `true` when `status` is connected under an id other than the last connected one
    fn observe(&mut self, status: &ConnectionStatus) -> bool {
        if !status.is_connected {
            return false;
        }
        let Some(id) = status.connection_id.as_ref() else {
            return false;
        };
        let reconnected = self
            .last_connection_id
            .as_ref()
            .is_some_and(|last| last != id);
        self.last_connection_id = Some(id.clone());
        reconnected
    }
}

/// Spawn a blocking thread for rustyline (synchronous readline)
fn spawn_readline(input_tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex as StdMutex, time::Duration};

    use async_trait::async_trait;
    use beacon_server::infrastructure::dto::websocket::{ClientCall, ClientInvocation};

    use super::*;
    use crate::{
        error::ClientError,
        status::SessionState,
        transport::{Connector, InboundEvent, Link},
    };

    /// Server side of a fake link
    struct Remote {
        events: mpsc::UnboundedSender<InboundEvent>,
        calls: mpsc::UnboundedReceiver<ClientInvocation>,
    }

    /// Connector that immediately accepts each scripted id, then refuses
    struct AcceptingConnector {
        ids: StdMutex<VecDeque<&'static str>>,
        remotes: mpsc::UnboundedSender<Remote>,
    }

    impl AcceptingConnector {
        fn new(ids: Vec<&'static str>) -> (Arc<Self>, mpsc::UnboundedReceiver<Remote>) {
            let (remotes_tx, remotes_rx) = mpsc::unbounded_channel();
            let connector = Arc::new(Self {
                ids: StdMutex::new(ids.into()),
                remotes: remotes_tx,
            });
            (connector, remotes_rx)
        }
    }

    #[async_trait]
    impl Connector for AcceptingConnector {
        async fn connect(&self) -> Result<Link, ClientError> {
            let Some(id) = self.ids.lock().unwrap().pop_front() else {
                return Err(ClientError::ConnectionError("connection refused".to_string()));
            };
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let (calls_tx, calls_rx) = mpsc::unbounded_channel();
            let _ = self.remotes.send(Remote {
                events: events_tx,
                calls: calls_rx,
            });
            Ok(Link {
                connection_id: ConnectionId::new(id.to_string()).unwrap(),
                events: events_rx,
                calls: calls_tx,
            })
        }
    }

    fn status(state: SessionState, id: Option<&str>) -> ConnectionStatus {
        ConnectionStatus {
            state,
            is_connected: state == SessionState::Connected,
            connection_id: id.map(|id| ConnectionId::new(id.to_string()).unwrap()),
            ..ConnectionStatus::default()
        }
    }

    #[test]
    fn test_first_connection_is_not_a_reconnect() {
        // テスト項目: 最初の接続は再接続として扱わない
        // given (前提条件):
        let mut detector = ReconnectDetector::new(&ConnectionStatus::default());

        // when (操作) / then (期待する結果):
        assert!(!detector.observe(&status(SessionState::Connecting, None)));
        assert!(!detector.observe(&status(SessionState::Connected, Some("c1"))));
        assert!(!detector.observe(&status(SessionState::Connected, Some("c1"))));
    }

    #[test]
    fn test_reconnect_is_detected_through_reconnecting() {
        // テスト項目: Reconnecting を経由した再接続を 1 回だけ検出する
        // given (前提条件):
        let mut detector = ReconnectDetector::new(&status(SessionState::Connected, Some("c1")));

        // when (操作) / then (期待する結果):
        assert!(!detector.observe(&status(SessionState::Reconnecting, None)));
        assert!(detector.observe(&status(SessionState::Connected, Some("c2"))));
        assert!(!detector.observe(&status(SessionState::Connected, Some("c2"))));
    }

    #[test]
    fn test_reconnect_is_detected_when_reconnecting_was_skipped() {
        // テスト項目: Reconnecting を観測できず Connected が連続しても、接続 ID の変化で再接続を検出する
        // given (前提条件):
        let mut detector = ReconnectDetector::new(&status(SessionState::Connected, Some("c1")));

        // when (操作):
        let reconnected = detector.observe(&status(SessionState::Connected, Some("c2")));

        // then (期待する結果):
        assert!(reconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_watcher_rejoins_groups_after_immediate_reconnect() {
        // テスト項目: 即時再接続（バックオフ 0ms）の後でも、参加中のグループに再参加する
        // given (前提条件):
        let (connector, mut remotes) = AcceptingConnector::new(vec!["c1", "c2"]);
        let session = Arc::new(ClientSession::new(connector, SessionConfig::default()));
        session.start().await.unwrap();
        let first = remotes.recv().await.unwrap();
        let groups: GroupSet = Arc::new(Mutex::new(BTreeSet::from(["ops".to_string()])));
        let watcher = spawn_status_watcher(session.clone(), groups);

        // when (操作):
        drop(first);
        let mut second = remotes.recv().await.unwrap();

        // then (期待する結果):
        let invocation = tokio::time::timeout(Duration::from_secs(5), second.calls.recv())
            .await
            .expect("group was not re-joined")
            .unwrap();
        assert_eq!(
            invocation.call,
            ClientCall::JoinGroup {
                group_name: "ops".to_string()
            }
        );
        second
            .events
            .send(InboundEvent::Completion {
                invocation_id: invocation.invocation_id,
                error: None,
            })
            .unwrap();
        assert_eq!(session.status().connection_id.unwrap().as_str(), "c2");

        watcher.abort();
        session.stop().await;
    }
}
