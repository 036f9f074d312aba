//! HTTP reachability check
//!
//! Best-effort check usable before opening the socket. Any response below
//! 500 counts as reachable; errors and timeouts count as unreachable.

use floattime_transport::http_url;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;

/// Status code returned by the server root
pub async fn probe_status(server_url: &str, timeout: Duration) -> Result<u16> {
    let url = http_url(server_url)?;
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let status = client.get(&url).send().await?.status();
    debug!("Probe {} -> {}", url, status);
    Ok(status.as_u16())
}

/// Check whether the server answers HTTP
pub async fn probe(server_url: &str, timeout: Duration) -> bool {
    match probe_status(server_url, timeout).await {
        Ok(status) => status < 500,
        Err(e) => {
            debug!("Probe of {} failed: {}", server_url, e);
            false
        }
    }
}

/// Blocking variant of [`probe`].
///
/// Must not be called from inside an async runtime; use [`probe`] there.
pub fn probe_blocking(server_url: &str, timeout: Duration) -> bool {
    let result = http_url(server_url)
        .map_err(crate::ClientError::from)
        .and_then(|url| {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()?;
            let status = client.get(&url).send()?.status();
            debug!("Probe {} -> {}", url, status);
            Ok(status.as_u16())
        });

    match result {
        Ok(status) => status < 500,
        Err(e) => {
            debug!("Probe of {} failed: {}", server_url, e);
            false
        }
    }
}
