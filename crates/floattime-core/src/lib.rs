//! FloatTime Core
//!
//! Types and pure logic shared by the FloatTime client for Ontime show-control
//! servers.
//!
//! This crate provides:
//! - The normalized timer snapshot ([`TimerData`], [`TimerType`], [`Urgency`])
//! - Inbound frame unwrapping ([`Frame`])
//! - Outbound control commands ([`Command`])
//! - Payload normalization with per-session caching ([`Normalizer`])
//! - Display formatting ([`format_time`])

pub mod command;
pub mod error;
pub mod format;
pub mod frame;
pub mod normalize;
pub mod timer;

mod fields;

pub use command::Command;
pub use error::{Error, Result};
pub use format::{format_time, format_timer, PLACEHOLDER};
pub use frame::Frame;
pub use normalize::{EventRef, Normalizer};
pub use timer::{TimerData, TimerType, Urgency};

/// Default Ontime server URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:4001";

/// Path of the Ontime WebSocket endpoint
pub const WS_PATH: &str = "/ws";
