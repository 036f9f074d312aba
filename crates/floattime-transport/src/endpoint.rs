//! Server URL derivation
//!
//! Users configure the server the way they reach it in a browser
//! (`http://host:4001`). The socket lives at `ws://host:4001/ws`.

use floattime_core::WS_PATH;
use url::Url;

use crate::error::{Result, TransportError};

/// WebSocket endpoint for a configured server URL.
///
/// `http` maps to `ws` and `https` to `wss`; `ws`/`wss` pass through. A
/// trailing `/` is dropped and `/ws` appended unless already present. A URL
/// without a scheme is taken as `http`.
pub fn ws_url(server_url: &str) -> Result<String> {
    let mut url = parse(server_url)?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| TransportError::InvalidUrl(server_url.to_string()))?;

    let path = url.path().trim_end_matches('/').to_string();
    if path.ends_with(WS_PATH) {
        url.set_path(&path);
    } else {
        url.set_path(&format!("{}{}", path, WS_PATH));
    }

    Ok(url.to_string())
}

/// HTTP root for a configured server URL, for reachability checks
pub fn http_url(server_url: &str) -> Result<String> {
    let mut url = parse(server_url)?;

    let scheme = match url.scheme() {
        "http" | "ws" => "http",
        "https" | "wss" => "https",
        other => {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| TransportError::InvalidUrl(server_url.to_string()))?;

    let path = url.path().trim_end_matches('/');
    let root = path.strip_suffix(WS_PATH).unwrap_or(path).to_string();
    url.set_path(if root.is_empty() { "/" } else { &root });

    Ok(url.to_string())
}

fn parse(server_url: &str) -> Result<Url> {
    let trimmed = server_url.trim();
    if trimmed.is_empty() {
        return Err(TransportError::InvalidUrl("empty url".to_string()));
    }

    let url = if trimmed.contains("://") {
        Url::parse(trimmed)?
    } else {
        Url::parse(&format!("http://{}", trimmed))?
    };

    if url.host_str().map_or(true, str::is_empty) {
        return Err(TransportError::InvalidUrl(format!("missing host: {}", trimmed)));
    }

    Ok(url)
}
