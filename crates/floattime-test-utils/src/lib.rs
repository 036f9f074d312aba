//! Common test helpers and utilities for FloatTime tests
//!
//! This crate provides:
//! - Condition-based waiting (no hardcoded sleeps)
//! - A mock Ontime server and HTTP responder with RAII cleanup
//! - A collector for delivered timer snapshots

use floattime_core::TimerData;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;

/// Default test timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default condition check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Condition-Based Waiting
// ============================================================================

/// Wait for a condition with timeout - condition-based, not time-based
pub async fn wait_for<F, Fut>(check: F, interval: Duration, max_wait: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if check().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

/// Wait for an atomic counter to reach a target value
pub async fn wait_for_count(counter: &AtomicU32, target: u32, max_wait: Duration) -> bool {
    wait_for(
        move || async move { counter.load(Ordering::SeqCst) >= target },
        DEFAULT_CHECK_INTERVAL,
        max_wait,
    )
    .await
}

// ============================================================================
// Mock Ontime server - RAII wrapper with proper cleanup
// ============================================================================

#[derive(Debug, Clone)]
enum ServerFrame {
    Text(String),
    Close,
}

/// A WebSocket server that records what clients send and lets tests push
/// frames to every connected client. Stops on drop.
pub struct MockOntime {
    port: u16,
    frames: broadcast::Sender<ServerFrame>,
    received: Arc<Mutex<Vec<String>>>,
    paths: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicU32>,
    received_count: Arc<AtomicU32>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockOntime {
    /// Bind to a free local port and start accepting clients
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let port = listener.local_addr().expect("No local addr").port();

        let (frames, _) = broadcast::channel(256);
        let received = Arc::new(Mutex::new(Vec::new()));
        let paths = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicU32::new(0));
        let received_count = Arc::new(AtomicU32::new(0));

        let handle = {
            let frames = frames.clone();
            let received = received.clone();
            let paths = paths.clone();
            let connections = connections.clone();
            let received_count = received_count.clone();

            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve_client(
                        stream,
                        frames.subscribe(),
                        received.clone(),
                        received_count.clone(),
                        paths.clone(),
                    ));
                }
            })
        };

        Self {
            port,
            frames,
            received,
            paths,
            connections,
            received_count,
            handle: Some(handle),
        }
    }

    /// Server URL as a user would configure it
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// WebSocket endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Push a JSON frame to every connected client
    pub fn push(&self, frame: Value) {
        self.push_text(&frame.to_string());
    }

    /// Push a raw text frame to every connected client
    pub fn push_text(&self, text: &str) {
        let _ = self.frames.send(ServerFrame::Text(text.to_string()));
    }

    /// Close every connected client
    pub fn close_clients(&self) {
        let _ = self.frames.send(ServerFrame::Close);
    }

    /// Accepted TCP connections so far
    pub fn connections(&self) -> u32 {
        self.connections.load(Ordering::SeqCst)
    }

    /// Request paths of completed WebSocket handshakes
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }

    /// Text frames received from clients
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Received frames that parse as JSON
    pub fn received_json(&self) -> Vec<Value> {
        self.received
            .lock()
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    /// Received frames carrying the given tag
    pub fn received_tags(&self, tag: &str) -> Vec<Value> {
        self.received_json()
            .into_iter()
            .filter(|frame| frame.get("tag").and_then(Value::as_str) == Some(tag))
            .collect()
    }

    /// Wait until at least `n` frames have been received
    pub async fn wait_for_received(&self, n: u32, max_wait: Duration) -> bool {
        wait_for_count(&self.received_count, n, max_wait).await
    }

    /// Wait until at least `n` clients have connected
    pub async fn wait_for_connections(&self, n: u32, max_wait: Duration) -> bool {
        wait_for_count(&self.connections, n, max_wait).await
    }

    /// Stop the server explicitly (also happens on drop)
    pub fn stop(&mut self) {
        self.close_clients();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for MockOntime {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn serve_client(
    stream: TcpStream,
    mut frames: broadcast::Receiver<ServerFrame>,
    received: Arc<Mutex<Vec<String>>>,
    received_count: Arc<AtomicU32>,
    paths: Arc<Mutex<Vec<String>>>,
) {
    let record_path = paths.clone();
    let ws_stream = match tokio_tungstenite::accept_hdr_async(
        stream,
        move |req: &Request, response: Response| {
            record_path.lock().push(req.uri().path().to_string());
            Ok(response)
        },
    )
    .await
    {
        Ok(ws_stream) => ws_stream,
        Err(_) => return,
    };

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    received.lock().push(text);
                    received_count.fetch_add(1, Ordering::SeqCst);
                }
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            frame = frames.recv() => match frame {
                Ok(ServerFrame::Text(text)) => {
                    if write.send(WsMessage::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(ServerFrame::Close) => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

// ============================================================================
// Mock HTTP responder - for reachability checks
// ============================================================================

/// Answers every HTTP request with a fixed status code. Stops on drop.
pub struct MockHttp {
    port: u16,
    requests: Arc<AtomicU32>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockHttp {
    pub async fn start(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock http server");
        let port = listener.local_addr().expect("No local addr").port();
        let requests = Arc::new(AtomicU32::new(0));

        let counter = requests.clone();
        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    use tokio::io::{AsyncReadExt, AsyncWriteExt};

                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }

                    let response = format!(
                        "HTTP/1.1 {} Mock\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        status
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            port,
            requests,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Requests answered so far
    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockHttp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Test Collectors - for verifying delivered snapshots
// ============================================================================

/// Collector for delivered [`TimerData`] with thread-safe access
#[derive(Clone)]
pub struct TimerCollector {
    values: Arc<Mutex<Vec<TimerData>>>,
    count: Arc<AtomicU32>,
}

impl TimerCollector {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
            count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Create a consumer callback
    pub fn callback(&self) -> impl Fn(TimerData) + Send + Sync + 'static {
        let values = self.values.clone();
        let count = self.count.clone();

        move |data| {
            values.lock().push(data);
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Get the count of received snapshots
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait for at least n snapshots to be received
    pub async fn wait_for_count(&self, n: u32, max_wait: Duration) -> bool {
        wait_for_count(&self.count, n, max_wait).await
    }

    /// Get all collected snapshots
    pub fn values(&self) -> Vec<TimerData> {
        self.values.lock().clone()
    }

    /// Get the last snapshot received
    pub fn last(&self) -> Option<TimerData> {
        self.values.lock().last().cloned()
    }

    /// Clear all collected snapshots
    pub fn clear(&self) {
        self.values.lock().clear();
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Default for TimerCollector {
    fn default() -> Self {
        Self::new()
    }
}
