//! WebSocket connection management
//!
//! Holds the single socket a client may own, the reader task that turns
//! inbound frames into [`ClientEvent::Message`]s, and the reconnect task
//! that runs after the socket closes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ReconnectConfig;
use crate::error::Result;
use crate::events::ClientEvent;
use crate::io::{SocketConnector, SocketPair, SocketReader, SocketWriter};

/// Internal socket state
#[derive(Debug, Clone, Default)]
pub(crate) struct SocketState {
    pub connected: bool,
    pub connecting: bool,
    pub reconnecting: bool,
    /// Reconnect attempts since the last explicit connect
    pub attempts: u32,
}

/// Shared state for the socket, cloned into the reader and reconnect tasks
#[derive(Clone)]
pub(crate) struct SharedSocketState {
    pub state: Arc<RwLock<SocketState>>,
    pub writer: Arc<Mutex<Option<Box<dyn SocketWriter>>>>,
    pub reader_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub reconnect_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub event_sender: broadcast::Sender<ClientEvent>,
    /// Set while the owner wants a socket; cleared by an explicit close
    pub active: Arc<AtomicBool>,
    pub connector: Arc<dyn SocketConnector>,
    pub url: String,
    pub reconnect: ReconnectConfig,
}

impl SharedSocketState {
    pub fn new(
        url: String,
        reconnect: ReconnectConfig,
        connector: Arc<dyn SocketConnector>,
        event_sender: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(SocketState::default())),
            writer: Arc::new(Mutex::new(None)),
            reader_handle: Arc::new(Mutex::new(None)),
            reconnect_handle: Arc::new(Mutex::new(None)),
            event_sender,
            active: Arc::new(AtomicBool::new(false)),
            connector,
            url,
            reconnect,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    pub async fn is_reconnecting(&self) -> bool {
        self.state.read().await.reconnecting
    }

    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.read().await.attempts
    }

    fn should_reconnect(&self) -> bool {
        self.reconnect.enabled && self.active.load(Ordering::SeqCst)
    }

    /// Open the socket unless one is already open or opening
    ///
    /// A failed attempt counts as a close: the error is returned and a
    /// reconnect is scheduled.
    pub async fn open(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if state.connected || state.connecting {
                debug!("WebSocket already open, ignoring connect request");
                return Ok(());
            }
            state.connecting = true;
            state.reconnecting = false;
            state.attempts = 0;
        }
        self.active.store(true, Ordering::SeqCst);
        self.cancel_reconnect().await;

        debug!("Connecting WebSocket to {}", self.url);
        match self.connector.connect(&self.url).await {
            Ok(pair) => {
                self.install(pair).await;
                Ok(())
            }
            Err(e) => {
                self.state.write().await.connecting = false;
                warn!("WebSocket connection to {} failed: {}", self.url, e);
                let _ = self.event_sender.send(ClientEvent::Disconnected {
                    reason: e.message(),
                });
                self.schedule_reconnect().await;
                Err(e)
            }
        }
    }

    /// Close the socket without triggering a reconnect
    pub async fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.cancel_reconnect().await;

        if let Some(handle) = self.reader_handle.lock().await.take() {
            handle.abort();
        }

        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.close().await {
                debug!("Error closing WebSocket: {}", e);
            }
        }

        let was_connected = {
            let mut state = self.state.write().await;
            let was_connected = state.connected;
            *state = SocketState::default();
            was_connected
        };

        if was_connected {
            info!("WebSocket closed by client");
            let _ = self.event_sender.send(ClientEvent::Disconnected {
                reason: "Closed by client".to_string(),
            });
        }
    }

    /// Adopt a freshly opened socket; returns false if one was already live
    async fn install(&self, pair: SocketPair) -> bool {
        let SocketPair { reader, mut writer } = pair;
        {
            let mut state = self.state.write().await;
            state.connecting = false;
            if state.connected {
                drop(state);
                debug!("Discarding surplus WebSocket connection");
                let _ = writer.close().await;
                return false;
            }
            state.connected = true;
            state.reconnecting = false;
        }

        *self.writer.lock().await = Some(writer);
        {
            let mut handle = self.reader_handle.lock().await;
            *handle = Some(spawn_reader_task(reader, self.clone()));
        }

        info!("WebSocket connected to {}", self.url);
        let _ = self.event_sender.send(ClientEvent::Connected);
        true
    }

    async fn handle_close(&self, reason: String) {
        self.state.write().await.connected = false;

        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.close().await;
        }

        warn!("WebSocket disconnected: {}", reason);
        let _ = self.event_sender.send(ClientEvent::Disconnected { reason });

        self.schedule_reconnect().await;
    }

    async fn schedule_reconnect(&self) {
        if !self.should_reconnect() {
            debug!("Reconnect not wanted, leaving WebSocket closed");
            return;
        }
        // Spawn under the lock so a close raised by the new socket cannot
        // store its task before this one is recorded.
        let mut guard = self.reconnect_handle.lock().await;
        let handle = spawn_reconnect_task(self.clone());
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }

    async fn cancel_reconnect(&self) {
        if let Some(handle) = self.reconnect_handle.lock().await.take() {
            handle.abort();
        }
        self.state.write().await.reconnecting = false;
    }
}

/// Spawn a reconnect task
///
/// Each attempt waits `interval_ms` first. A failed attempt counts like a
/// close and moves on to the next attempt until `max_attempts` is used up,
/// at which point [`ClientEvent::ReconnectFailed`] is published.
pub(crate) fn spawn_reconnect_task(shared: SharedSocketState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let max_attempts = shared.reconnect.max_attempts;
        let interval = Duration::from_millis(shared.reconnect.interval_ms);

        loop {
            if !shared.should_reconnect() {
                debug!("Reconnect cancelled");
                shared.state.write().await.reconnecting = false;
                return;
            }

            let attempt = {
                let mut state = shared.state.write().await;
                if state.connected {
                    state.reconnecting = false;
                    return;
                }
                if state.attempts >= max_attempts {
                    state.reconnecting = false;
                    None
                } else {
                    state.attempts += 1;
                    state.reconnecting = true;
                    Some(state.attempts)
                }
            };

            let Some(attempt) = attempt else {
                warn!(
                    "WebSocket reconnection failed: max attempts ({}) exceeded",
                    max_attempts
                );
                let _ = shared.event_sender.send(ClientEvent::ReconnectFailed {
                    reason: format!("Max reconnect attempts ({}) exceeded", max_attempts),
                });
                return;
            };

            info!(
                "Reconnecting WebSocket (attempt {}/{})",
                attempt, max_attempts
            );
            let _ = shared.event_sender.send(ClientEvent::Reconnecting {
                attempt,
                max_attempts,
            });

            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }

            match shared.connector.connect(&shared.url).await {
                Ok(mut pair) => {
                    if !shared.should_reconnect() {
                        let _ = pair.writer.close().await;
                        shared.state.write().await.reconnecting = false;
                        return;
                    }
                    shared.install(pair).await;
                    return;
                }
                Err(e) => {
                    debug!("Reconnect attempt {} failed: {}", attempt, e);
                    let _ = shared.event_sender.send(ClientEvent::Disconnected {
                        reason: e.message(),
                    });
                }
            }
        }
    })
}

/// Spawn a reader task that publishes inbound JSON frames
pub(crate) fn spawn_reader_task(
    mut reader: Box<dyn SocketReader>,
    shared: SharedSocketState,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reason = loop {
            match reader.next_text().await {
                Ok(None) => break "Connection closed by remote".to_string(),
                Ok(Some(text)) => {
                    if text.is_empty() {
                        continue;
                    }
                    debug!("WebSocket message: {}", text);
                    match serde_json::from_str::<serde_json::Value>(&text) {
                        Ok(value) => {
                            let _ = shared.event_sender.send(ClientEvent::Message(value));
                        }
                        Err(e) => debug!("Ignoring non-JSON WebSocket message: {}", e),
                    }
                }
                Err(e) => break format!("Read error: {}", e),
            }
        };

        shared.handle_close(reason).await;
    })
}
