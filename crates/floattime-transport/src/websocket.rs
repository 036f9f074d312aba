//! WebSocket transport implementation

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{debug, error, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{Transport, TransportEvent, TransportReceiver, TransportSender};

/// WebSocket configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Upper bound on the opening handshake
    pub connect_timeout: Duration,
    /// Outbound frames buffered ahead of the socket
    pub send_queue: usize,
    /// Inbound events buffered ahead of the consumer
    pub event_queue: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            send_queue: 100,
            event_queue: 100,
        }
    }
}

/// WebSocket transport
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport {
    config: WebSocketConfig,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WebSocketConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }
}

/// WebSocket sender
pub struct WebSocketSender {
    tx: mpsc::Sender<WsMessage>,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for WebSocketSender {
    fn try_send(&self, text: String) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        self.tx.try_send(WsMessage::Text(text)).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => TransportError::ConnectionClosed,
            mpsc::error::TrySendError::Full(_) => {
                TransportError::SendFailed("send queue full".to_string())
            }
        })
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        let _ = self.tx.send(WsMessage::Close(None)).await;
        *self.connected.lock() = false;
        Ok(())
    }
}

/// WebSocket receiver
pub struct WebSocketReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for WebSocketReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    type Sender = WebSocketSender;
    type Receiver = WebSocketReceiver;

    async fn connect(&self, url: &str) -> Result<(Self::Sender, Self::Receiver)> {
        info!("Connecting to WebSocket: {}", url);

        let (ws_stream, response) =
            tokio::time::timeout(self.config.connect_timeout, connect_async(url))
                .await
                .map_err(|_| TransportError::Timeout)?
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        debug!("WebSocket connected, response: {:?}", response.status());

        // Split the WebSocket stream
        let (write, read) = ws_stream.split();

        // Create channels
        let (send_tx, mut send_rx) = mpsc::channel::<WsMessage>(self.config.send_queue);
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(self.config.event_queue);

        let connected = Arc::new(Mutex::new(true));
        let connected_write = connected.clone();
        let connected_read = connected.clone();

        // Spawn writer task
        tokio::spawn(async move {
            let mut write = write;
            while let Some(msg) = send_rx.recv().await {
                let closing = matches!(msg, WsMessage::Close(_));
                if let Err(e) = write.send(msg).await {
                    error!("WebSocket write error: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            *connected_write.lock() = false;
        });

        // Spawn reader task
        tokio::spawn(async move {
            let mut read = read;

            let _ = event_tx.send(TransportEvent::Connected).await;

            while let Some(result) = read.next().await {
                match result {
                    Ok(msg) => match msg {
                        WsMessage::Text(text) => {
                            if event_tx.send(TransportEvent::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        WsMessage::Binary(data) => match String::from_utf8(data) {
                            Ok(text) => {
                                if event_tx.send(TransportEvent::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Dropping non-UTF-8 binary frame: {}", e);
                                let _ = event_tx
                                    .send(TransportEvent::Error(format!("invalid utf-8 frame: {}", e)))
                                    .await;
                            }
                        },
                        WsMessage::Ping(_) => {
                            // Pong is handled automatically by tungstenite
                            debug!("Received ping");
                        }
                        WsMessage::Pong(_) => {
                            debug!("Received pong");
                        }
                        WsMessage::Close(frame) => {
                            let reason = frame.map(|f| f.reason.to_string());
                            info!("WebSocket closed: {:?}", reason);
                            *connected_read.lock() = false;
                            let _ = event_tx
                                .send(TransportEvent::Disconnected { reason })
                                .await;
                            break;
                        }
                        WsMessage::Frame(_) => {}
                    },
                    Err(e) => {
                        error!("WebSocket read error: {}", e);
                        *connected_read.lock() = false;
                        let _ = event_tx
                            .send(TransportEvent::Disconnected {
                                reason: Some(e.to_string()),
                            })
                            .await;
                        break;
                    }
                }
            }

            *connected_read.lock() = false;
        });

        let sender = WebSocketSender {
            tx: send_tx,
            connected,
        };

        let receiver = WebSocketReceiver { rx: event_rx };

        Ok((sender, receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_config() {
        let config = WebSocketConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.send_queue, 100);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let transport = WebSocketTransport::with_config(WebSocketConfig {
            connect_timeout: Duration::from_secs(2),
            ..Default::default()
        });

        let result = transport.connect("ws://127.0.0.1:1/ws").await;
        assert!(matches!(
            result,
            Err(TransportError::ConnectionFailed(_)) | Err(TransportError::Timeout)
        ));
    }
}
