//! FloatTime Transport Layer
//!
//! Streaming connection to an Ontime server. The server speaks JSON text
//! frames over a WebSocket at `/ws`.

pub mod error;
pub mod traits;
pub mod endpoint;
pub mod websocket;

pub use error::{Result, TransportError};
pub use traits::{Transport, TransportEvent, TransportReceiver, TransportSender};
pub use endpoint::{http_url, ws_url};
pub use websocket::{WebSocketConfig, WebSocketReceiver, WebSocketSender, WebSocketTransport};
