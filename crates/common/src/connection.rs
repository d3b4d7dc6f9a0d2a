//! WebSocket connection manager with reconnection and keep-alive.
//!
//! One connection per client session. The transport handle is owned
//! exclusively by the connection task spawned here; every other component
//! interacts through the cloneable manager: `send` plus the state
//! subscription. Transport failures never surface to callers, they drive
//! the state machine through `Reconnecting`.

use crate::backoff::Backoff;
use crate::error::{Error, Result};
use crate::handler::SocketHandler;
use futures::{SinkExt, StreamExt};
use metrics::counter;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, timeout};
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::{frame::coding::CloseCode, CloseFrame, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

/// Configuration for the connection manager.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Deadline for a single connect attempt.
    pub connect_timeout: Duration,
    /// Initial delay before a reconnection attempt.
    pub reconnect_delay: Duration,
    /// Maximum reconnection delay (for exponential backoff).
    pub max_reconnect_delay: Duration,
    /// Jitter fraction applied to each reconnect delay.
    pub reconnect_jitter: f64,
    /// How long a connection must stay Open before the backoff resets.
    pub stability_window: Duration,
    /// Interval between keep-alive ping frames.
    pub ping_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
            reconnect_jitter: 0.2,
            stability_window: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// Connection lifecycle states observable through `subscribe_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

struct Inner {
    config: ConnectionConfig,
    state_tx: watch::Sender<ConnectionState>,
    closed_tx: watch::Sender<bool>,
    outbound_tx: RwLock<Option<mpsc::Sender<String>>>,
}

impl Inner {
    /// State writes race with `close()`; Closed always wins.
    fn set_state(&self, state: ConnectionState) {
        if *self.closed_tx.borrow() {
            return;
        }
        self.state_tx.send_replace(state);
    }

    fn mark_closed(&self) {
        let was_closed = self.closed_tx.send_replace(true);
        if !was_closed {
            self.state_tx.send_replace(ConnectionState::Closed);
        }
    }
}

/// Manages the single WebSocket connection for a session.
///
/// Cloning yields another handle to the same connection.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        let (closed_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                config,
                state_tx,
                closed_tx,
                outbound_tx: RwLock::new(None),
            }),
        }
    }

    /// Establish the connection, spawning the connection task.
    ///
    /// No-op unless the state is Idle: an Open, Connecting, or
    /// Reconnecting connection is left alone, and Closed is terminal.
    pub fn connect<H: SocketHandler>(&self, url: &str, handler: H) -> Result<()> {
        let url = url::Url::parse(url)?;
        let mut outbound = self.inner.outbound_tx.write().unwrap();
        let state = *self.inner.state_tx.borrow();
        if state != ConnectionState::Idle {
            debug!("connect ignored in state {:?}", state);
            return Ok(());
        }
        let (tx, rx) = mpsc::channel(64);
        *outbound = Some(tx);
        let handler: Arc<dyn SocketHandler> = Arc::new(handler);
        tokio::spawn(run(self.inner.clone(), url.to_string(), handler, rx));
        Ok(())
    }

    /// Send an outbound envelope `{event, data}`.
    ///
    /// Rejected with [`Error::NotConnected`] when the state is not Open.
    /// There is no implicit buffering; the caller decides whether to
    /// queue or drop.
    pub fn send(&self, event: &str, data: Value) -> Result<()> {
        if self.state() != ConnectionState::Open {
            return Err(Error::NotConnected);
        }
        let frame = serde_json::json!({ "event": event, "data": data }).to_string();
        let outbound = self.inner.outbound_tx.read().unwrap();
        match outbound.as_ref() {
            Some(tx) => tx.try_send(frame).map_err(|_| Error::ChannelSend),
            None => Err(Error::NotConnected),
        }
    }

    /// Close the connection. Terminal: cancels any pending reconnect and
    /// no automatic reconnection follows.
    pub fn close(&self) {
        self.inner.mark_closed();
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Subscribe to state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }
}

enum DriveEnd {
    /// The session ended deliberately: explicit close, manager dropped,
    /// or a normal-closure frame from the server.
    Finished,
    /// The transport dropped unexpectedly; reconnect.
    Lost(Error),
}

async fn run(
    inner: Arc<Inner>,
    url: String,
    handler: Arc<dyn SocketHandler>,
    mut outbound_rx: mpsc::Receiver<String>,
) {
    let config = inner.config.clone();
    let mut backoff = Backoff::new(
        config.reconnect_delay,
        config.max_reconnect_delay,
        config.reconnect_jitter,
    );
    let mut closed_rx = inner.closed_tx.subscribe();

    loop {
        if *closed_rx.borrow() {
            return;
        }
        inner.set_state(ConnectionState::Connecting);
        debug!("Connecting to {}", url);

        let attempt = timeout(config.connect_timeout, connect_async(url.as_str()));
        let connected = tokio::select! {
            res = attempt => res,
            _ = closed_rx.changed() => {
                debug!("Connect attempt cancelled by close");
                return;
            }
        };

        match connected {
            Ok(Ok((stream, response))) => {
                counter!("realtime_connects_total").increment(1);
                info!("WebSocket connected (status {:?})", response.status());
                inner.set_state(ConnectionState::Open);
                handler.on_open().await;
                let opened_at = Instant::now();

                match drive(stream, &handler, &mut outbound_rx, &mut closed_rx, &config).await {
                    DriveEnd::Finished => {
                        inner.mark_closed();
                        return;
                    }
                    DriveEnd::Lost(e) => {
                        counter!("realtime_disconnects_total").increment(1);
                        warn!("WebSocket connection lost: {:?}", e);
                        handler.on_disconnect().await;
                        if opened_at.elapsed() >= config.stability_window {
                            backoff.reset();
                        }
                        // Frames accepted before the drop are not replayed
                        // on the next connection.
                        while outbound_rx.try_recv().is_ok() {}
                    }
                }
            }
            Ok(Err(e)) => {
                warn!("WebSocket connect failed: {:?}", e);
            }
            Err(_) => {
                warn!("WebSocket connect timed out after {:?}", config.connect_timeout);
            }
        }

        if *closed_rx.borrow() {
            return;
        }
        inner.set_state(ConnectionState::Reconnecting);
        let delay = backoff.next_delay();
        debug!("Reconnecting in {:?}", delay);
        tokio::select! {
            _ = sleep(delay) => {}
            _ = closed_rx.changed() => {
                debug!("Reconnect cancelled by close");
                return;
            }
        }
    }
}

async fn drive(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    handler: &Arc<dyn SocketHandler>,
    outbound_rx: &mut mpsc::Receiver<String>,
    closed_rx: &mut watch::Receiver<bool>,
    config: &ConnectionConfig,
) -> DriveEnd {
    let (mut write, mut read) = stream.split();
    let mut ping_interval = interval(config.ping_interval);
    ping_interval.reset(); // Don't fire immediately

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        counter!("realtime_frames_received_total").increment(1);
                        handler.on_frame(&text).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            return DriveEnd::Lost(Error::WebSocket(e));
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        let normal = frame
                            .as_ref()
                            .map(|f| f.code == CloseCode::Normal)
                            .unwrap_or(false);
                        if normal {
                            info!("Server closed the connection normally");
                            return DriveEnd::Finished;
                        }
                        warn!("Server closed the connection: {:?}", frame);
                        return DriveEnd::Lost(Error::ConnectionClosed);
                    }
                    Some(Ok(_)) => {
                        // Binary and raw frames are not part of the protocol
                    }
                    Some(Err(e)) => return DriveEnd::Lost(Error::WebSocket(e)),
                    None => return DriveEnd::Lost(Error::ConnectionClosed),
                }
            }

            frame = outbound_rx.recv() => {
                match frame {
                    Some(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            return DriveEnd::Lost(Error::WebSocket(e));
                        }
                        counter!("realtime_frames_sent_total").increment(1);
                    }
                    None => {
                        info!("Connection manager dropped; closing");
                        let _ = write.send(Message::Close(None)).await;
                        return DriveEnd::Finished;
                    }
                }
            }

            _ = closed_rx.changed() => {
                info!("Closing connection");
                let close_frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "session closed".into(),
                };
                let _ = write.send(Message::Close(Some(close_frame))).await;
                return DriveEnd::Finished;
            }

            _ = ping_interval.tick() => {
                if let Err(e) = write.send(Message::Ping(Vec::new())).await {
                    return DriveEnd::Lost(Error::WebSocket(e));
                }
            }
        }
    }
}
