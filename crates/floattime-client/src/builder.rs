//! Client builder pattern

use floattime_core::TimerData;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ClientConfig, OntimeClient, UpdateCallback};
use crate::Result;

/// Builder for [`OntimeClient`]
pub struct OntimeClientBuilder {
    config: ClientConfig,
    on_update: Option<UpdateCallback>,
}

impl OntimeClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            on_update: None,
        }
    }

    /// Register the consumer callback
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(TimerData) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(callback));
        self
    }

    /// Enable/disable the `poll` request sent when the socket opens
    pub fn poll_on_connect(mut self, enabled: bool) -> Self {
        self.config.poll_on_connect = enabled;
        self
    }

    /// Set how long `stop()` waits before aborting the session
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.config.stop_timeout = timeout;
        self
    }

    /// Set the reachability check timeout
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Set the WebSocket handshake timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.websocket.connect_timeout = timeout;
        self
    }

    /// Set the outbound command queue capacity
    pub fn send_queue(mut self, capacity: usize) -> Self {
        self.config.websocket.send_queue = capacity.max(1);
        self
    }

    /// Build without connecting
    pub fn build(self) -> OntimeClient {
        let client = OntimeClient::with_config(self.config);
        if let Some(callback) = self.on_update {
            client.set_update_callback(callback);
        }
        client
    }

    /// Build and start connecting to `url`
    pub async fn start(self, url: &str) -> Result<OntimeClient> {
        let client = self.build();
        client.start(url).await?;
        Ok(client)
    }
}

impl Default for OntimeClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_settings() {
        let client = OntimeClientBuilder::new()
            .poll_on_connect(false)
            .stop_timeout(Duration::from_millis(250))
            .probe_timeout(Duration::from_millis(500))
            .connect_timeout(Duration::from_secs(3))
            .send_queue(0)
            .build();

        let config = client.config();
        assert!(!config.poll_on_connect);
        assert_eq!(config.stop_timeout, Duration::from_millis(250));
        assert_eq!(config.probe_timeout, Duration::from_millis(500));
        assert_eq!(config.websocket.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.websocket.send_queue, 1);
    }
}
