//! Outbound control commands
//!
//! Commands are best-effort: every method returns `true` when the frame was
//! queued on a live socket and `false` otherwise. Nothing here raises.

use floattime_core::{Command, EventRef};
use floattime_transport::{TransportSender, WebSocketSender};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, warn};

/// Handle for sending control commands to the connected server.
///
/// Cheap to clone; all clones share the same link. Sends from any thread are
/// serialized on one lock.
#[derive(Clone, Default)]
pub struct CommandSender {
    link: Arc<Mutex<Option<WebSocketSender>>>,
    current_event: Arc<RwLock<Option<EventRef>>>,
}

impl CommandSender {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&self, sender: WebSocketSender) {
        *self.link.lock() = Some(sender);
    }

    pub(crate) fn detach(&self) -> Option<WebSocketSender> {
        self.link.lock().take()
    }

    pub(crate) fn set_current_event(&self, event: Option<EventRef>) {
        *self.current_event.write() = event;
    }

    /// Currently loaded event as last reported by the server
    pub fn current_event(&self) -> Option<EventRef> {
        self.current_event.read().clone()
    }

    /// Check if a live socket is attached
    pub fn is_connected(&self) -> bool {
        self.link
            .lock()
            .as_ref()
            .map_or(false, |sender| sender.is_connected())
    }

    /// Encode and queue a command
    pub fn send(&self, command: &Command) -> bool {
        let text = match command.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to encode {} command: {}", command.tag(), e);
                return false;
            }
        };

        let link = self.link.lock();
        let Some(sender) = link.as_ref() else {
            debug!("Not connected, dropping {} command", command.tag());
            return false;
        };

        match sender.try_send(text) {
            Ok(()) => {
                debug!("Sent {} command", command.tag());
                true
            }
            Err(e) => {
                warn!("Failed to send {} command: {}", command.tag(), e);
                false
            }
        }
    }

    /// Start the loaded event
    pub fn start_timer(&self) -> bool {
        self.send(&Command::Start)
    }

    /// Pause the running timer
    pub fn pause_timer(&self) -> bool {
        self.send(&Command::Pause)
    }

    /// Reload the current event
    pub fn reload_timer(&self) -> bool {
        self.send(&Command::Reload)
    }

    pub fn load_next(&self) -> bool {
        self.send(&Command::LoadNext)
    }

    pub fn load_previous(&self) -> bool {
        self.send(&Command::LoadPrevious)
    }

    /// Add time to the running timer (e.g. 60000 for +1 minute)
    pub fn add_time(&self, ms: u64) -> bool {
        self.send(&Command::AddTime(ms))
    }

    /// Remove time from the running timer
    pub fn remove_time(&self, ms: u64) -> bool {
        self.send(&Command::RemoveTime(ms))
    }

    /// Add or remove time depending on the sign of `delta_ms`
    pub fn nudge_time(&self, delta_ms: i64) -> bool {
        if delta_ms >= 0 {
            self.add_time(delta_ms.unsigned_abs())
        } else {
            self.remove_time(delta_ms.unsigned_abs())
        }
    }

    /// Change the current event's duration by `delta_ms`.
    ///
    /// Needs the id and duration of the loaded event from an earlier update;
    /// without them nothing is sent. The new duration never goes below zero.
    pub fn change_event_duration(&self, delta_ms: i64) -> bool {
        let Some(event) = self.current_event() else {
            debug!("No current event, not changing duration");
            return false;
        };
        let Some(duration) = event.duration else {
            debug!("Current event {} has no known duration", event.id);
            return false;
        };

        let duration = duration.saturating_add(delta_ms).max(0);
        self.set_event_duration(&event.id, duration)
    }

    /// Set an explicit event's duration
    pub fn set_event_duration(&self, event_id: &str, duration_ms: i64) -> bool {
        self.send(&Command::ChangeDuration {
            event_id: event_id.to_string(),
            duration: duration_ms,
        })
    }

    pub fn set_blackout(&self, on: bool) -> bool {
        self.send(&Command::SetBlackout(on))
    }

    pub fn set_blink(&self, on: bool) -> bool {
        self.send(&Command::SetBlink(on))
    }
}
