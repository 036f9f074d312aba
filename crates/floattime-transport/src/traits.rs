//! Transport trait definitions

use async_trait::async_trait;

use crate::error::Result;

/// Events that can occur on a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established
    Connected,
    /// Connection closed (clean or error)
    Disconnected { reason: Option<String> },
    /// Text frame received
    Text(String),
    /// Error occurred
    Error(String),
}

/// Trait for sending frames
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Queue a text frame without waiting for the socket
    fn try_send(&self, text: String) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Close the connection
    async fn close(&self) -> Result<()>;
}

/// Trait for receiving frames
#[async_trait]
pub trait TransportReceiver: Send {
    /// Receive the next event
    async fn recv(&mut self) -> Option<TransportEvent>;
}

/// Main transport trait
#[async_trait]
pub trait Transport: Send + Sync {
    /// The sender type for this transport
    type Sender: TransportSender;
    /// The receiver type for this transport
    type Receiver: TransportReceiver;

    /// Connect to a streaming endpoint
    async fn connect(&self, url: &str) -> Result<(Self::Sender, Self::Receiver)>;
}
