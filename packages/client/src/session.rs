//! Client session state machine.
//!
//! ```text
//! Disconnected --start()--> Connecting --ok--> Connected
//!                           Connecting --err/timeout--> Disconnected
//! Connected --transport loss--> Reconnecting --ok--> Connected
//!                               Reconnecting --err--> Reconnecting (attempts += 1)
//! Connected | Reconnecting --stop()--> Disconnected (terminal)
//! ```
//!
//! A single driver task owns the state, the current [`Link`] and the pending
//! calls. [`ClientSession`] is a handle that talks to it over channels, so
//! message receipt and reconnection never race each other. Status is
//! published through `tokio::sync::watch`; received messages and activity
//! through `tokio::sync::broadcast`.

use std::{collections::HashMap, sync::Arc, time::Duration};

use beacon_server::{
    domain::{ActivityEvent, ConnectionId, Message},
    infrastructure::dto::websocket::{ClientCall, ClientInvocation},
};
use beacon_shared::{
    buffer::BoundedBuffer,
    time::{Clock, SystemClock},
};
use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    backoff::ReconnectPolicy,
    error::ClientError,
    status::{ConnectionStatus, SessionState},
    transport::{Connector, InboundEvent, Link},
};

/// Capacity of the `SessionEvent` broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of buffered messages (oldest evicted first)
    pub buffer_capacity: usize,
    /// Upper bound for a single connection attempt, handshake included
    pub connect_timeout: Duration,
    pub reconnect_policy: ReconnectPolicy,
}

impl SessionConfig {
    pub const DEFAULT_BUFFER_CAPACITY: usize = 500;
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: Self::DEFAULT_BUFFER_CAPACITY,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

/// Notification emitted to session observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    MessageReceived(Message),
    Activity(ActivityEvent),
}

type Reply<T> = oneshot::Sender<Result<T, ClientError>>;

enum Command {
    Start(Reply<ConnectionId>),
    Invoke { call: ClientCall, reply: Reply<()> },
}

/// Why the connected phase ended
enum Exit {
    Lost,
    Stopped,
}

/// Handle to a client session
pub struct ClientSession {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    events: broadcast::Sender<SessionEvent>,
    buffer: Arc<Mutex<BoundedBuffer<Message>>>,
    cancel: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl ClientSession {
    /// Create a session in the `Disconnected` state. Must be called within a tokio runtime.
    pub fn new(connector: Arc<dyn Connector>, config: SessionConfig) -> Self {
        Self::with_clock(connector, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        connector: Arc<dyn Connector>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let buffer = Arc::new(Mutex::new(BoundedBuffer::new(config.buffer_capacity)));
        let cancel = CancellationToken::new();

        let driver = Driver {
            connector,
            config,
            clock,
            commands: commands_rx,
            status: status_tx,
            events: events_tx.clone(),
            buffer: buffer.clone(),
            cancel: cancel.clone(),
            next_invocation_id: 0,
        };
        let handle = tokio::spawn(driver.run());

        Self {
            commands: commands_tx,
            status: status_rx,
            events: events_tx,
            buffer,
            cancel,
            driver: Mutex::new(Some(handle)),
        }
    }

    /// Connect and complete the handshake.
    ///
    /// # Errors
    ///
    /// * `ConnectionError` / `HandshakeFailed` / `Timeout` - the session stays `Disconnected`
    /// * `AlreadyStarted` - the session is `Connected` or `Reconnecting`
    /// * `Stopped` - `stop()` was called
    pub async fn start(&self) -> Result<ConnectionId, ClientError> {
        self.request(Command::Start).await
    }

    /// Close the connection and stop reconnecting. Terminal.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.driver.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!("Session driver task failed: {}", e);
        }
    }

    /// Join `group` and wait for the server's acknowledgment.
    pub async fn join_group(&self, group: &str) -> Result<(), ClientError> {
        let call = ClientCall::JoinGroup {
            group_name: group.to_string(),
        };
        self.request(|reply| Command::Invoke { call, reply }).await
    }

    /// Leave `group` and wait for the server's acknowledgment.
    pub async fn leave_group(&self, group: &str) -> Result<(), ClientError> {
        let call = ClientCall::LeaveGroup {
            group_name: group.to_string(),
        };
        self.request(|reply| Command::Invoke { call, reply }).await
    }

    /// Current status snapshot
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status transition
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Buffered messages in arrival order
    pub async fn messages(&self) -> Vec<Message> {
        self.buffer.lock().await.to_vec()
    }

    pub async fn clear_messages(&self) {
        self.buffer.lock().await.clear();
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ClientError> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Stopped);
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .map_err(|_| ClientError::Stopped)?;
        reply_rx.await.map_err(|_| ClientError::Stopped)?
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Driver {
    connector: Arc<dyn Connector>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionStatus>,
    events: broadcast::Sender<SessionEvent>,
    buffer: Arc<Mutex<BoundedBuffer<Message>>>,
    cancel: CancellationToken,
    next_invocation_id: u64,
}

impl Driver {
    async fn run(mut self) {
        if let Some(link) = self.wait_for_start().await {
            self.drive(link).await;
        }
        self.publish(SessionState::Disconnected, None, 0);
        tracing::info!("Session stopped");
    }

    /// Disconnected: serve `start()` until one succeeds. `None` once stopped.
    async fn wait_for_start(&mut self) -> Option<Link> {
        loop {
            let command = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                command = self.commands.recv() => command?,
            };

            match command {
                Command::Start(reply) => {
                    self.publish(SessionState::Connecting, None, 0);
                    match self.attempt().await {
                        Ok(Some(link)) => {
                            self.publish_connected(&link);
                            let _ = reply.send(Ok(link.connection_id.clone()));
                            return Some(link);
                        }
                        Ok(None) => {
                            let _ = reply.send(Err(ClientError::Stopped));
                            return None;
                        }
                        Err(e) => {
                            tracing::warn!("Connection failed: {}", e);
                            self.publish(SessionState::Disconnected, None, 0);
                            let _ = reply.send(Err(e));
                        }
                    }
                }
                Command::Invoke { reply, .. } => {
                    let _ = reply.send(Err(ClientError::NotConnected));
                }
            }
        }
    }

    /// Alternate between Connected and Reconnecting until stopped.
    async fn drive(&mut self, mut link: Link) {
        loop {
            match self.connected(&mut link).await {
                Exit::Stopped => return,
                Exit::Lost => tracing::warn!("Connection '{}' lost", link.connection_id),
            }
            drop(link);
            match self.reconnect().await {
                Some(new_link) => link = new_link,
                None => return,
            }
        }
    }

    async fn connected(&mut self, link: &mut Link) -> Exit {
        let mut pending: HashMap<u64, Reply<()>> = HashMap::new();

        let exit = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Exit::Stopped,
                event = link.events.recv() => match event {
                    Some(event) => self.handle_event(event, &mut pending).await,
                    None => break Exit::Lost,
                },
                command = self.commands.recv() => match command {
                    Some(Command::Start(reply)) => {
                        let _ = reply.send(Err(ClientError::AlreadyStarted));
                    }
                    Some(Command::Invoke { call, reply }) => {
                        self.next_invocation_id += 1;
                        let invocation_id = self.next_invocation_id;
                        let invocation = ClientInvocation { invocation_id, call };
                        if link.calls.send(invocation).is_err() {
                            let _ = reply.send(Err(ClientError::ConnectionLost));
                        } else {
                            pending.insert(invocation_id, reply);
                        }
                    }
                    // Every handle is gone
                    None => break Exit::Stopped,
                },
            }
        };

        let error = match exit {
            Exit::Lost => ClientError::ConnectionLost,
            Exit::Stopped => ClientError::Stopped,
        };
        for (_, reply) in pending.drain() {
            let _ = reply.send(Err(error.clone()));
        }
        exit
    }

    async fn handle_event(&mut self, event: InboundEvent, pending: &mut HashMap<u64, Reply<()>>) {
        match event {
            InboundEvent::Message(message) => {
                self.buffer.lock().await.push(message.clone());
                // No subscribers is fine
                let _ = self.events.send(SessionEvent::MessageReceived(message));
            }
            InboundEvent::Activity(activity) => {
                let _ = self.events.send(SessionEvent::Activity(activity));
            }
            InboundEvent::Completion {
                invocation_id,
                error,
            } => {
                let Some(reply) = pending.remove(&invocation_id) else {
                    tracing::debug!("Completion for unknown invocation {}", invocation_id);
                    return;
                };
                let result = match error {
                    Some(e) => Err(ClientError::Rejected(e)),
                    None => Ok(()),
                };
                let _ = reply.send(result);
            }
        }
    }

    /// Reconnecting: retry per the backoff schedule. `None` once stopped.
    async fn reconnect(&mut self) -> Option<Link> {
        let mut failed_attempts: u32 = 0;
        self.publish(SessionState::Reconnecting, None, failed_attempts);

        loop {
            let delay = self.config.reconnect_policy.delay_for(failed_attempts);
            tracing::info!(
                "Reconnecting in {:?} (failed attempts: {})",
                delay,
                failed_attempts
            );
            if !self.sleep(delay).await {
                return None;
            }

            match self.attempt().await {
                Ok(Some(link)) => {
                    tracing::info!("Reconnected as '{}'", link.connection_id);
                    self.publish_connected(&link);
                    return Some(link);
                }
                Ok(None) => return None,
                Err(e) => {
                    failed_attempts = failed_attempts.saturating_add(1);
                    tracing::warn!("Reconnect attempt {} failed: {}", failed_attempts, e);
                    self.publish(SessionState::Reconnecting, None, failed_attempts);
                }
            }
        }
    }

    /// One bounded connection attempt. `Ok(None)` when stopped meanwhile.
    async fn attempt(&mut self) -> Result<Option<Link>, ClientError> {
        let connector = self.connector.clone();
        let timeout = self.config.connect_timeout;
        let connect = tokio::time::timeout(timeout, async move { connector.connect().await });
        tokio::pin!(connect);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(None),
                result = &mut connect => {
                    return match result {
                        Ok(Ok(link)) => Ok(Some(link)),
                        Ok(Err(e)) => Err(e),
                        Err(_) => Err(ClientError::Timeout(timeout)),
                    };
                }
                command = self.commands.recv() => match command {
                    Some(command) => reject_while_disconnected(command),
                    None => return Ok(None),
                },
            }
        }
    }

    /// Backoff delay that still answers commands. `false` once stopped.
    async fn sleep(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    Some(command) => reject_while_disconnected(command),
                    None => return false,
                },
            }
        }
    }

    fn publish_connected(&self, link: &Link) {
        self.publish(
            SessionState::Connected,
            Some(link.connection_id.clone()),
            0,
        );
    }

    fn publish(&self, state: SessionState, connection_id: Option<ConnectionId>, attempts: u32) {
        let status = ConnectionStatus {
            state,
            is_connected: state == SessionState::Connected,
            connection_id,
            last_activity: Some(self.clock.now()),
            reconnect_attempts: attempts,
        };
        tracing::debug!("Session status: {} (attempts: {})", state, attempts);
        self.status.send_replace(status);
    }
}

/// Commands arriving while a connection attempt or backoff is in progress
fn reject_while_disconnected(command: Command) {
    match command {
        Command::Start(reply) => {
            let _ = reply.send(Err(ClientError::AlreadyStarted));
        }
        Command::Invoke { reply, .. } => {
            let _ = reply.send(Err(ClientError::NotConnected));
        }
    }
}
