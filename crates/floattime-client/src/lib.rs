//! FloatTime Client Library
//!
//! Async client for Ontime show-control servers. Connects over WebSocket,
//! normalizes every inbound frame into a [`TimerData`] snapshot and hands it
//! to a single registered consumer. Control commands are best-effort.
//!
//! # Example
//!
//! ```ignore
//! use floattime_client::OntimeClient;
//!
//! #[tokio::main]
//! async fn main() -> floattime_client::Result<()> {
//!     let client = OntimeClient::builder()
//!         .on_update(|data| println!("{} {}", data.title, floattime_core::format_timer(data.timer_ms)))
//!         .start("http://localhost:4001")
//!         .await?;
//!
//!     client.wait_until_connected(std::time::Duration::from_secs(5)).await?;
//!     client.start_timer();
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     client.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! [`TimerData`]: floattime_core::TimerData

pub mod builder;
pub mod client;
pub mod error;
pub mod probe;
pub mod sender;
pub mod state;

mod session;

pub use builder::OntimeClientBuilder;
pub use client::{ClientConfig, OntimeClient, UpdateCallback};
pub use error::{ClientError, Result};
pub use probe::{probe, probe_blocking, probe_status};
pub use sender::CommandSender;
pub use state::ConnectionState;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::OntimeClientBuilder;
    pub use crate::client::OntimeClient;
    pub use crate::error::{ClientError, Result};
    pub use crate::state::ConnectionState;
    pub use floattime_core::{format_time, format_timer, TimerData, TimerType, Urgency};
}
