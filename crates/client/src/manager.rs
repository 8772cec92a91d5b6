//! Connection manager for the monitoring WebSocket.
//!
//! [`MonitoringClient`] owns one logical connection to the monitoring
//! backend. [`connect`](MonitoringClient::connect) spawns a session task
//! (connect -> process frames -> close); abnormal closes schedule a
//! reconnect with bounded exponential backoff. Every inbound frame is
//! parsed, keep-alive acknowledgements are dropped, and the resulting
//! event is dispatched to subscribers and then applied to the cache
//! before the next frame is read.
//!
//! Sessions and reconnect timers are tracked by an epoch counter plus a
//! [`CancellationToken`] each. [`disconnect`](MonitoringClient::disconnect)
//! bumps the epoch and cancels both under the control lock, so a timer
//! that is already due can no longer start a connection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::cache::CacheStore;
use crate::config::ClientConfig;
use crate::dispatcher::{EventDispatcher, Subscription};
use crate::events::MonitoringEvent;
use crate::heartbeat::{self, Heartbeat};
use crate::messages::{parse_frame, Inbound};
use crate::reconnect::Backoff;
use crate::sync::CacheSynchronizer;
use crate::transport::{close_code, Connector, Transport, TransportFrame};
use crate::websocket::WsConnector;

/// Observable state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or automatic recovery gave up.
    Idle,
    /// A transport is being opened.
    Connecting,
    /// The transport is open and frames are flowing.
    Open,
    /// An intentional close is in progress.
    Closing,
    /// The transport is closed and no reconnect is pending.
    Closed,
    /// Waiting for the backoff delay before the next attempt.
    Reconnecting,
}

/// Handle to a monitoring connection.
///
/// Cloning is cheap and every clone controls the same connection.
/// `connect` spawns onto the current tokio runtime.
#[derive(Clone)]
pub struct MonitoringClient {
    shared: Arc<Shared>,
}

struct Shared {
    url: String,
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    dispatcher: EventDispatcher,
    synchronizer: CacheSynchronizer,
    control: Mutex<Control>,
    state_tx: watch::Sender<ConnectionState>,
}

/// Mutable connection bookkeeping, guarded by `Shared::control`.
struct Control {
    state: ConnectionState,
    backoff: Backoff,
    /// Incremented whenever a session starts or the client disconnects.
    epoch: u64,
    session: Option<CancellationToken>,
    reconnect_timer: Option<CancellationToken>,
}

/// How a session's frame loop ended.
enum SessionEnd {
    Cancelled,
    Closed { code: u16, reason: String },
    Failed(String),
}

impl MonitoringClient {
    /// Create a client that opens transports through `connector` and
    /// mirrors state into `cache`.
    pub fn new(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        let control = Control {
            state: ConnectionState::Idle,
            backoff: Backoff::new(config.reconnect.clone()),
            epoch: 0,
            session: None,
            reconnect_timer: None,
        };

        Self {
            shared: Arc::new(Shared {
                url: config.endpoint_url(),
                config,
                connector,
                dispatcher: EventDispatcher::new(),
                synchronizer: CacheSynchronizer::new(cache),
                control: Mutex::new(control),
                state_tx,
            }),
        }
    }

    /// Create a client backed by a real WebSocket connection.
    pub fn with_websocket(config: ClientConfig, cache: Arc<dyn CacheStore>) -> Self {
        Self::new(config, Arc::new(WsConnector), cache)
    }

    /// WebSocket URL this client connects to.
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        self.shared.synchronizer.store()
    }

    /// Register an event callback. See [`EventDispatcher::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MonitoringEvent) + Send + Sync + 'static,
    {
        self.shared.dispatcher.subscribe(callback)
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Reconnect attempts made since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lock_control().backoff.attempts()
    }

    /// Open the connection.
    ///
    /// A no-op while already connecting or open. Calling it while a
    /// reconnect is pending skips the remaining delay. Calling it after
    /// automatic recovery gave up starts over with a fresh attempt budget.
    pub fn connect(&self) {
        let mut control = self.shared.lock_control();
        match control.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                tracing::debug!(state = ?control.state, "Connect ignored, connection already active");
                return;
            }
            ConnectionState::Idle => control.backoff.reset(),
            ConnectionState::Closing | ConnectionState::Closed | ConnectionState::Reconnecting => {}
        }

        if let Some(timer) = control.reconnect_timer.take() {
            timer.cancel();
        }
        Shared::start_session(&self.shared, &mut control);
    }

    /// Close the connection on purpose.
    ///
    /// Cancels any pending reconnect and resets the attempt counter.
    /// Safe to call in every state, any number of times.
    pub fn disconnect(&self) {
        let mut control = self.shared.lock_control();
        control.epoch += 1;
        control.backoff.reset();

        if let Some(timer) = control.reconnect_timer.take() {
            tracing::debug!("Pending reconnect cancelled");
            timer.cancel();
        }

        match control.session.take() {
            Some(session) => {
                session.cancel();
                self.shared.set_state(&mut control, ConnectionState::Closing);
            }
            None if control.state != ConnectionState::Idle => {
                self.shared.set_state(&mut control, ConnectionState::Closed);
            }
            None => {}
        }
        tracing::info!("Monitoring client disconnected");
    }
}

impl Shared {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        // No code panics while holding the lock; recover rather than
        // propagate poison into every caller.
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, control: &mut Control, state: ConnectionState) {
        control.state = state;
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: &MonitoringEvent) {
        self.dispatcher.dispatch(event);
    }

    /// Begin a new connection attempt. Caller holds the control lock.
    fn start_session(shared: &Arc<Self>, control: &mut Control) {
        control.epoch += 1;
        let epoch = control.epoch;
        let cancel = CancellationToken::new();
        control.session = Some(cancel.clone());
        shared.set_state(control, ConnectionState::Connecting);

        tracing::info!(url = %shared.url, epoch, "Connecting to monitoring backend");
        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            shared.run_session(epoch, cancel).await;
        });
    }

    async fn run_session(self: Arc<Self>, epoch: u64, cancel: CancellationToken) {
        // A session cancelled before it opened never emitted `Connected`,
        // so it ends without a `Disconnected` event.
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.finish_closing();
                return;
            }
            result = self.connector.connect(&self.url) => result,
        };

        let mut transport = match connected {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!(error = %e, "Monitoring connection failed");
                self.on_failure(epoch, e.to_string(), false);
                return;
            }
        };

        if !self.mark_open(epoch) {
            transport.close().await;
            self.finish_closing();
            return;
        }
        tracing::info!(url = %self.url, "Monitoring connection established");
        self.emit(&MonitoringEvent::Connected);

        match self.pump(transport.as_mut(), &cancel).await {
            SessionEnd::Cancelled => {
                transport.close().await;
                self.finish_closing();
                self.emit(&MonitoringEvent::Disconnected {
                    code: close_code::NORMAL,
                    reason: "client disconnect".into(),
                });
            }
            SessionEnd::Closed { code, reason } => self.on_closed(epoch, code, reason),
            SessionEnd::Failed(message) => {
                tracing::error!(error = %message, "Monitoring transport error");
                self.on_failure(epoch, message, true);
            }
        }
    }

    /// Transition to `Open` unless the session was superseded.
    fn mark_open(&self, epoch: u64) -> bool {
        let mut control = self.lock_control();
        if control.epoch != epoch {
            return false;
        }
        control.backoff.reset();
        self.set_state(&mut control, ConnectionState::Open);
        true
    }

    /// Read frames until the session ends, sending keep-alives meanwhile.
    async fn pump(&self, transport: &mut dyn Transport, cancel: &CancellationToken) -> SessionEnd {
        let mut heartbeat = Heartbeat::new(self.config.heartbeat_interval);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                frame = transport.recv() => match frame {
                    Some(Ok(TransportFrame::Text(text))) => self.handle_text(&text),
                    Some(Ok(TransportFrame::Closed { code, reason })) => {
                        return SessionEnd::Closed { code, reason };
                    }
                    Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
                    None => {
                        return SessionEnd::Closed {
                            code: close_code::ABNORMAL,
                            reason: String::new(),
                        };
                    }
                },
                _ = heartbeat.tick() => {
                    tracing::trace!("Sending keep-alive");
                    if let Err(e) = transport.send_text(heartbeat::ping_frame()).await {
                        return SessionEnd::Failed(e.to_string());
                    }
                }
            }
        }
    }

    /// Classify one text frame, then dispatch it and update the cache.
    fn handle_text(&self, text: &str) {
        match parse_frame(text) {
            Ok(Inbound::Ack) => tracing::trace!("Keep-alive acknowledged"),
            Ok(Inbound::Event(event)) => {
                tracing::debug!(event_type = event.event_type(), "Monitoring event received");
                self.emit(&event);
                self.synchronizer.apply(&event);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    raw_message = %text,
                    "Failed to parse monitoring frame",
                );
            }
        }
    }

    /// The peer closed the transport.
    fn on_closed(self: &Arc<Self>, epoch: u64, code: u16, reason: String) {
        if !self.end_session(epoch) {
            self.finish_closing();
            return;
        }
        tracing::info!(code, reason = %reason, "Monitoring connection closed");
        self.emit(&MonitoringEvent::Disconnected { code, reason });

        if code != close_code::NORMAL {
            self.schedule_reconnect(epoch);
        }
    }

    /// The transport failed to open or broke while open.
    fn on_failure(self: &Arc<Self>, epoch: u64, message: String, was_open: bool) {
        if !self.end_session(epoch) {
            self.finish_closing();
            return;
        }
        self.emit(&MonitoringEvent::Error {
            message: message.clone(),
        });
        if was_open {
            self.emit(&MonitoringEvent::Disconnected {
                code: close_code::ABNORMAL,
                reason: message,
            });
        }
        self.schedule_reconnect(epoch);
    }

    /// Clear the session slot if `epoch` is still current.
    fn end_session(&self, epoch: u64) -> bool {
        let mut control = self.lock_control();
        if control.epoch != epoch {
            return false;
        }
        control.session = None;
        self.set_state(&mut control, ConnectionState::Closed);
        true
    }

    /// Move from `Closing` to `Closed` once an intentional close is done.
    ///
    /// Every path out of a cancelled or superseded session calls this; it
    /// leaves any other state alone, including a newer session's.
    fn finish_closing(&self) {
        let mut control = self.lock_control();
        if control.state == ConnectionState::Closing && control.session.is_none() {
            self.set_state(&mut control, ConnectionState::Closed);
        }
    }

    /// Schedule the next reconnect attempt, or give up.
    fn schedule_reconnect(self: &Arc<Self>, epoch: u64) {
        let (event, timer) = {
            let mut control = self.lock_control();
            if control.epoch != epoch || control.session.is_some() {
                return;
            }
            match control.backoff.next_attempt() {
                None => {
                    self.set_state(&mut control, ConnectionState::Idle);
                    let attempts = control.backoff.attempts();
                    (MonitoringEvent::ReconnectFailed { attempts }, None)
                }
                Some((attempt, delay)) => {
                    let timer = CancellationToken::new();
                    control.reconnect_timer = Some(timer.clone());
                    self.set_state(&mut control, ConnectionState::Reconnecting);
                    (
                        MonitoringEvent::Reconnecting { attempt, delay },
                        Some((timer, delay)),
                    )
                }
            }
        };

        match &event {
            MonitoringEvent::Reconnecting { attempt, delay } => tracing::info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Scheduling monitoring reconnect",
            ),
            _ => tracing::warn!("Maximum reconnection attempts reached"),
        }
        self.emit(&event);

        let Some((timer, delay)) = timer else {
            return;
        };
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(delay) => shared.fire_reconnect(epoch, &timer),
            }
        });
    }

    /// Reconnect timer expired. Starts a session unless the timer was
    /// cancelled or superseded in the meantime.
    fn fire_reconnect(self: &Arc<Self>, epoch: u64, timer: &CancellationToken) {
        let mut control = self.lock_control();
        if timer.is_cancelled() || control.epoch != epoch {
            return;
        }
        control.reconnect_timer = None;
        Self::start_session(self, &mut control);
    }
}
