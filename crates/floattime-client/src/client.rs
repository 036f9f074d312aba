//! Main Ontime client implementation

use floattime_core::{EventRef, TimerData};
use floattime_transport::{ws_url, TransportSender, WebSocketConfig, WebSocketTransport};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::builder::OntimeClientBuilder;
use crate::error::{ClientError, Result};
use crate::probe;
use crate::sender::CommandSender;
use crate::session::{self, Session, SharedCallback};
use crate::state::ConnectionState;

/// Consumer callback type.
///
/// Called once per normalized snapshot, in wire order, on the session task.
/// It must return quickly; hand slow work off to another task.
pub type UpdateCallback = Arc<dyn Fn(TimerData) + Send + Sync>;

/// Client settings fixed at build time
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Send a `poll` as soon as the socket opens
    pub poll_on_connect: bool,
    /// How long `stop()` waits for the session task before aborting it
    pub stop_timeout: Duration,
    /// Timeout for the HTTP reachability check
    pub probe_timeout: Duration,
    /// Socket settings
    pub websocket: WebSocketConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_on_connect: true,
            stop_timeout: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(2),
            websocket: WebSocketConfig::default(),
        }
    }
}

struct Running {
    url: String,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Client for one Ontime server at a time.
///
/// Owned by whoever composes the application; there is no global instance.
/// The single registered consumer receives every snapshot, not a copy per
/// subscriber.
pub struct OntimeClient {
    config: ClientConfig,
    transport: WebSocketTransport,
    commands: CommandSender,
    on_update: SharedCallback,
    state: Arc<watch::Sender<ConnectionState>>,
    running: Mutex<Option<Running>>,
}

impl OntimeClient {
    /// Create a client with default settings
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            transport: WebSocketTransport::with_config(config.websocket.clone()),
            config,
            commands: CommandSender::new(),
            on_update: Arc::new(RwLock::new(None)),
            state: Arc::new(state),
            running: Mutex::new(None),
        }
    }

    /// Create a builder
    pub fn builder() -> OntimeClientBuilder {
        OntimeClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register the consumer, replacing any earlier one
    pub fn on_update<F>(&self, callback: F)
    where
        F: Fn(TimerData) + Send + Sync + 'static,
    {
        self.set_update_callback(Arc::new(callback));
    }

    pub(crate) fn set_update_callback(&self, callback: UpdateCallback) {
        *self.on_update.write() = Some(callback);
    }

    /// Connect to a server in the background.
    ///
    /// `url` is what a user would type (`http://host:4001`); the socket
    /// endpoint is derived from it. Returns once the session task is
    /// spawned, before the connection is up. Starting again with the same
    /// URL while running does nothing; a different URL replaces the session.
    pub async fn start(&self, url: &str) -> Result<()> {
        let endpoint = ws_url(url)?;

        {
            let running = self.running.lock();
            if let Some(running) = running.as_ref() {
                if running.url == endpoint && !running.task.is_finished() {
                    debug!("Already running against {}", endpoint);
                    return Ok(());
                }
            }
        }

        self.stop().await;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let session = Session {
            url: endpoint.clone(),
            transport: self.transport.clone(),
            poll_on_connect: self.config.poll_on_connect,
            commands: self.commands.clone(),
            state: self.state.clone(),
            on_update: self.on_update.clone(),
        };

        // Visible before the task gets scheduled
        self.state.send_replace(ConnectionState::Connecting);
        let task = tokio::spawn(session::run(session, shutdown_rx));

        *self.running.lock() = Some(Running {
            url: endpoint,
            shutdown,
            task,
        });

        Ok(())
    }

    /// Stop the session and close the socket.
    ///
    /// Waits at most the configured stop timeout for the session task, then
    /// aborts it. Safe to call when already stopped.
    pub async fn stop(&self) {
        let running = self.running.lock().take();
        let Some(Running {
            url,
            shutdown,
            mut task,
        }) = running
        else {
            return;
        };

        info!("Stopping session for {}", url);
        let _ = shutdown.send(());

        if tokio::time::timeout(self.config.stop_timeout, &mut task)
            .await
            .is_err()
        {
            warn!(
                "Session for {} did not stop within {:?}, aborting",
                url, self.config.stop_timeout
            );
            task.abort();
            if let Some(sender) = self.commands.detach() {
                let _ = sender.close().await;
            }
            self.commands.set_current_event(None);
            self.state.send_replace(ConnectionState::Closed);
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected() && self.commands.is_connected()
    }

    /// Watch connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Wait until the session is connected.
    ///
    /// Fails fast if the session closes or was never started.
    pub async fn wait_until_connected(&self, max_wait: Duration) -> Result<()> {
        let mut states = self.state.subscribe();

        let wait = async move {
            loop {
                let state = *states.borrow_and_update();
                match state {
                    ConnectionState::Connected => return Ok(()),
                    ConnectionState::Idle => return Err(ClientError::NotConnected),
                    ConnectionState::Closed => {
                        return Err(ClientError::ConnectionFailed(
                            "connection closed".to_string(),
                        ))
                    }
                    ConnectionState::Connecting => {}
                }
                if states.changed().await.is_err() {
                    return Err(ClientError::NotConnected);
                }
            }
        };

        tokio::time::timeout(max_wait, wait)
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    /// WebSocket endpoint of the current session
    pub fn url(&self) -> Option<String> {
        self.running.lock().as_ref().map(|running| running.url.clone())
    }

    /// Command handle that can be moved to other tasks or threads
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Loaded event as last reported by the server
    pub fn current_event(&self) -> Option<EventRef> {
        self.commands.current_event()
    }

    /// Check whether a server answers HTTP at all
    pub async fn probe(&self, url: &str) -> bool {
        probe::probe(url, self.config.probe_timeout).await
    }

    // === Controls ===

    pub fn start_timer(&self) -> bool {
        self.commands.start_timer()
    }

    pub fn pause_timer(&self) -> bool {
        self.commands.pause_timer()
    }

    pub fn reload_timer(&self) -> bool {
        self.commands.reload_timer()
    }

    pub fn load_next(&self) -> bool {
        self.commands.load_next()
    }

    pub fn load_previous(&self) -> bool {
        self.commands.load_previous()
    }

    pub fn add_time(&self, ms: u64) -> bool {
        self.commands.add_time(ms)
    }

    pub fn remove_time(&self, ms: u64) -> bool {
        self.commands.remove_time(ms)
    }

    pub fn nudge_time(&self, delta_ms: i64) -> bool {
        self.commands.nudge_time(delta_ms)
    }

    pub fn change_event_duration(&self, delta_ms: i64) -> bool {
        self.commands.change_event_duration(delta_ms)
    }

    pub fn set_event_duration(&self, event_id: &str, duration_ms: i64) -> bool {
        self.commands.set_event_duration(event_id, duration_ms)
    }

    pub fn set_blackout(&self, on: bool) -> bool {
        self.commands.set_blackout(on)
    }

    pub fn set_blink(&self, on: bool) -> bool {
        self.commands.set_blink(on)
    }
}

impl Default for OntimeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OntimeClient {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            let _ = running.shutdown.send(());
        }
    }
}
