//! Error types for FloatTime core

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    /// Frame text was not valid JSON
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Command could not be serialized
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Frame decoded but is not a JSON object
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::DecodeError(e.to_string())
    }
}
