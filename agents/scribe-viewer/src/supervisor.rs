use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::{debug, info, warn};

use meetscribe_transcript::wire::{ClientMessage, ServerMessage};
use meetscribe_transcript::{TranscriptEntry, TranscriptView};

/// Fixed delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// Ceiling on consecutive failed connection attempts.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Close codes that mean the peer ended the session normally.
const NORMAL_CLOSE_CODES: [u16; 2] = [1000, 1001];
/// Policy violation — the server's in-band authentication failure signal.
const AUTH_FAILURE_CLOSE_CODE: u16 = 1008;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:3000/ws`.
    pub server_url: String,
    pub meeting_name: String,
    pub token: Option<String>,
    pub reconnect_delay: Duration,
    pub max_attempts: u32,
}

impl SupervisorConfig {
    pub fn new(server_url: impl Into<String>, meeting_name: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            meeting_name: meeting_name.into(),
            token: None,
            reconnect_delay: RECONNECT_DELAY,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// What the supervisor reports to its consumer.
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    State(ConnectionState),
    /// The merged transcript after a snapshot or delta was applied.
    Transcript(Vec<TranscriptEntry>),
    /// The meeting finalized.
    Complete {
        meeting_title: String,
        transcripts: Vec<TranscriptEntry>,
    },
    /// The supervisor gave up; it will not reconnect.
    Fatal(String),
}

/// Lets the owner request a clean disconnect from another task. The flag is
/// checked before any reconnect is scheduled, so a requested disconnect
/// always suppresses the retry path.
#[derive(Clone)]
pub struct DisconnectHandle {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl DisconnectHandle {
    pub fn disconnect(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseKind {
    /// Caller asked for the disconnect.
    Requested,
    /// Peer closed with a normal-closure code.
    Normal,
    /// Authentication failure close — fatal, credentials are cleared.
    AuthFailure,
    /// Anything else: transport error or unexpected close code.
    Abnormal,
}

/// Owns the transport session for one meeting watch: connect, watch,
/// reconcile, reconnect with a fixed delay up to a fixed ceiling.
///
/// DISCONNECTED → CONNECTING → CONNECTED → (CLOSING | DISCONNECTED).
pub struct ConnectionSupervisor {
    config: SupervisorConfig,
    token: Option<String>,
    state: ConnectionState,
    view: TranscriptView,
    events: mpsc::UnboundedSender<ViewerEvent>,
    disconnect_flag: Arc<AtomicBool>,
    disconnect_notify: Arc<Notify>,
}

impl ConnectionSupervisor {
    pub fn new(
        config: SupervisorConfig,
        events: mpsc::UnboundedSender<ViewerEvent>,
    ) -> (Self, DisconnectHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let notify = Arc::new(Notify::new());
        let handle = DisconnectHandle {
            flag: flag.clone(),
            notify: notify.clone(),
        };
        let token = config.token.clone();
        let supervisor = Self {
            config,
            token,
            state: ConnectionState::Disconnected,
            view: TranscriptView::new(),
            events,
            disconnect_flag: flag,
            disconnect_notify: notify,
        };
        (supervisor, handle)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Runs the connection lifecycle until a fatal condition, a normal
    /// server-side close, or a caller-requested disconnect.
    pub async fn run(mut self) {
        let mut attempts: u32 = 0;
        loop {
            if self.disconnect_requested() {
                self.set_state(ConnectionState::Disconnected);
                return;
            }

            self.set_state(ConnectionState::Connecting);
            let stream = match connect_async(self.connect_url()).await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    if is_auth_rejection(&e) {
                        self.fail_authentication(&e.to_string());
                        return;
                    }
                    attempts += 1;
                    if attempts >= self.config.max_attempts {
                        self.set_state(ConnectionState::Disconnected);
                        self.emit(ViewerEvent::Fatal(format!(
                            "connection failed after {attempts} attempts: {e}"
                        )));
                        return;
                    }
                    warn!(attempt = attempts, %e, "Connection failed, will retry");
                    if !self.wait_before_reconnect().await {
                        return;
                    }
                    continue;
                }
            };

            attempts = 0;
            self.set_state(ConnectionState::Connected);
            info!(meeting = %self.config.meeting_name, "Connected, watching transcript");

            match self.drive(stream).await {
                CloseKind::Requested => {
                    self.set_state(ConnectionState::Closing);
                    self.set_state(ConnectionState::Disconnected);
                    return;
                }
                CloseKind::Normal => {
                    self.set_state(ConnectionState::Disconnected);
                    return;
                }
                CloseKind::AuthFailure => {
                    self.fail_authentication("server closed with policy violation");
                    return;
                }
                CloseKind::Abnormal => {
                    attempts += 1;
                    if attempts >= self.config.max_attempts {
                        self.set_state(ConnectionState::Disconnected);
                        self.emit(ViewerEvent::Fatal(format!(
                            "connection lost {attempts} times, giving up"
                        )));
                        return;
                    }
                    warn!(attempt = attempts, "Connection lost, will reconnect");
                    self.set_state(ConnectionState::Disconnected);
                    if !self.wait_before_reconnect().await {
                        return;
                    }
                }
            }
        }
    }

    /// Runs one connected epoch. Registers the watch (the bootstrap snapshot
    /// that follows is authoritative and discards anything buffered before
    /// the reconnect), then pumps messages until the session ends.
    async fn drive(&mut self, stream: WsStream) -> CloseKind {
        let (mut tx, mut rx) = stream.split();

        let watch = ClientMessage::WatchTranscript {
            meeting_name: self.config.meeting_name.clone(),
        };
        let text = match serde_json::to_string(&watch) {
            Ok(t) => t,
            Err(e) => {
                warn!(%e, "Failed to encode watch message");
                return CloseKind::Abnormal;
            }
        };
        if tx.send(tungstenite::Message::Text(text.into())).await.is_err() {
            return CloseKind::Abnormal;
        }

        let notify = self.disconnect_notify.clone();
        loop {
            if self.disconnect_requested() {
                let _ = tx.send(tungstenite::Message::Close(None)).await;
                return CloseKind::Requested;
            }
            tokio::select! {
                _ = notify.notified() => {
                    let _ = tx.send(tungstenite::Message::Close(None)).await;
                    return CloseKind::Requested;
                }
                msg = rx.next() => match msg {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        self.handle_server_message(text.as_str());
                    }
                    Some(Ok(tungstenite::Message::Ping(data))) => {
                        let _ = tx.send(tungstenite::Message::Pong(data)).await;
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        return classify_close(frame.as_ref());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%e, "WebSocket error");
                        return CloseKind::Abnormal;
                    }
                    None => return CloseKind::Abnormal,
                }
            }
        }
    }

    /// Applies one server message to the watch context. Events for other
    /// meetings are ignored; malformed payloads are dropped with a warning.
    fn handle_server_message(&mut self, text: &str) {
        let message: ServerMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                warn!(%e, "Dropping malformed server message");
                return;
            }
        };

        match message {
            ServerMessage::InitialTranscripts { transcripts } => {
                debug!(entries = transcripts.len(), "Bootstrap snapshot loaded");
                self.view.load_snapshot(transcripts);
                self.emit_transcript();
            }
            ServerMessage::Transcript {
                speaker,
                text,
                is_final,
                meeting_name,
            } => {
                if meeting_name == self.config.meeting_name {
                    self.view
                        .apply(TranscriptEntry::new(speaker, text, is_final));
                    self.emit_transcript();
                }
            }
            ServerMessage::TranscriptNew {
                meeting_name,
                transcripts,
            }
            | ServerMessage::TranscriptUpdate {
                meeting_name,
                transcripts,
            } => {
                if meeting_name != self.config.meeting_name {
                    return;
                }
                for entry in transcripts {
                    self.view.apply(entry);
                }
                self.emit_transcript();
            }
            ServerMessage::CompleteTranscript {
                meeting_title,
                transcripts,
            } => {
                self.view.load_snapshot(transcripts.clone());
                self.emit(ViewerEvent::Complete {
                    meeting_title,
                    transcripts,
                });
            }
            ServerMessage::Error { message } => {
                warn!(%message, "Server reported an error");
            }
        }
    }

    fn connect_url(&self) -> String {
        match self.token.as_deref() {
            Some(token) => format!("{}?token={}", self.config.server_url, token),
            None => self.config.server_url.clone(),
        }
    }

    /// Authentication failures are fatal, not transient: stored credentials
    /// are cleared and no reconnect is attempted.
    fn fail_authentication(&mut self, detail: &str) {
        warn!(%detail, "Authentication failed, clearing credentials");
        self.token = None;
        self.set_state(ConnectionState::Disconnected);
        self.emit(ViewerEvent::Fatal(format!(
            "authentication rejected: {detail}"
        )));
    }

    /// Sleeps the fixed reconnect delay. Returns false when a disconnect was
    /// requested, in which case no reconnect may be scheduled.
    async fn wait_before_reconnect(&self) -> bool {
        if self.disconnect_requested() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.config.reconnect_delay) => !self.disconnect_requested(),
            _ = self.disconnect_notify.notified() => false,
        }
    }

    fn disconnect_requested(&self) -> bool {
        self.disconnect_flag.load(Ordering::SeqCst)
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(?state, "Connection state changed");
            self.state = state;
            self.emit(ViewerEvent::State(state));
        }
    }

    fn emit_transcript(&self) {
        self.emit(ViewerEvent::Transcript(self.view.entries().to_vec()));
    }

    fn emit(&self, event: ViewerEvent) {
        let _ = self.events.send(event);
    }
}

fn classify_close(frame: Option<&CloseFrame>) -> CloseKind {
    match frame {
        Some(frame) => {
            let code = u16::from(frame.code);
            if code == AUTH_FAILURE_CLOSE_CODE {
                CloseKind::AuthFailure
            } else if NORMAL_CLOSE_CODES.contains(&code) {
                CloseKind::Normal
            } else {
                CloseKind::Abnormal
            }
        }
        None => CloseKind::Abnormal,
    }
}

/// A 401/403 handshake rejection is an authentication failure, not a
/// transient transport error.
fn is_auth_rejection(err: &tungstenite::Error) -> bool {
    match err {
        tungstenite::Error::Http(resp) => {
            let code = resp.status().as_u16();
            code == 401 || code == 403
        }
        _ => false,
    }
}
