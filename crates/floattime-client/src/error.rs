//! Client error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("timeout")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] floattime_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] floattime_transport::TransportError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("client error: {0}")]
    Other(String),
}
