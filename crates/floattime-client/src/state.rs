//! Connection lifecycle

use std::fmt;

/// Where a client is in its connection lifecycle.
///
/// `Idle → Connecting → Connected → Closed`. A closed client may be started
/// again; there is no automatic reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never started
    #[default]
    Idle,
    Connecting,
    Connected,
    /// Stopped, failed to connect, or dropped by the server
    Closed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
