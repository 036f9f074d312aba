//! Per-connection worker
//!
//! One task per active connection. It owns the socket receiver and the
//! normalizer cache, so the cache is only ever touched from this task;
//! consumers get immutable snapshots.

use floattime_core::{Command, Frame, Normalizer, TimerData};
use floattime_transport::{
    Transport, TransportEvent, TransportReceiver, TransportSender, WebSocketTransport,
};
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, trace, warn};

use crate::client::UpdateCallback;
use crate::sender::CommandSender;
use crate::state::ConnectionState;

pub(crate) type SharedCallback = Arc<RwLock<Option<UpdateCallback>>>;

pub(crate) struct Session {
    pub url: String,
    pub transport: WebSocketTransport,
    pub poll_on_connect: bool,
    pub commands: CommandSender,
    pub state: Arc<watch::Sender<ConnectionState>>,
    pub on_update: SharedCallback,
}

/// Connect, then deliver updates until shutdown or disconnect
pub(crate) async fn run(session: Session, mut shutdown: oneshot::Receiver<()>) {
    let Session {
        url,
        transport,
        poll_on_connect,
        commands,
        state,
        on_update,
    } = session;

    state.send_replace(ConnectionState::Connecting);
    info!("Connecting to {}", url);

    // A dropped shutdown sender counts as a stop request
    let connected = tokio::select! {
        _ = &mut shutdown => {
            debug!("Stopped before connecting to {}", url);
            state.send_replace(ConnectionState::Closed);
            return;
        }
        result = transport.connect(&url) => result,
    };

    let mut receiver = match connected {
        Ok((sender, receiver)) => {
            commands.attach(sender);
            receiver
        }
        Err(e) => {
            error!("Failed to connect to {}: {}", url, e);
            state.send_replace(ConnectionState::Closed);
            return;
        }
    };

    if poll_on_connect && !commands.send(&Command::Poll) {
        warn!("Initial poll was not sent");
    }
    state.send_replace(ConnectionState::Connected);
    info!("Connected to {}", url);

    let mut normalizer = Normalizer::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("Shutdown requested");
                break;
            }
            event = receiver.recv() => match event {
                Some(TransportEvent::Text(text)) => {
                    handle_text(&text, &mut normalizer, &commands, &on_update);
                }
                Some(TransportEvent::Connected) => {
                    debug!("Transport ready");
                }
                Some(TransportEvent::Error(e)) => {
                    warn!("Transport error: {}", e);
                }
                Some(TransportEvent::Disconnected { reason }) => {
                    info!("Disconnected: {:?}", reason);
                    break;
                }
                None => {
                    info!("Connection closed");
                    break;
                }
            },
        }
    }

    if let Some(sender) = commands.detach() {
        let _ = sender.close().await;
    }
    commands.set_current_event(None);
    state.send_replace(ConnectionState::Closed);
    info!("Session for {} closed", url);
}

fn handle_text(
    text: &str,
    normalizer: &mut Normalizer,
    commands: &CommandSender,
    on_update: &SharedCallback,
) {
    let frame = match Frame::decode(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Dropping frame: {}", e);
            return;
        }
    };

    if let Some(name) = frame.name() {
        trace!("Frame {}", name);
    }

    let update = normalizer.normalize(frame.payload());
    commands.set_current_event(normalizer.current_event().cloned());

    if let Some(data) = update {
        // Clone out so registration never waits on a running callback
        let callback = on_update.read().clone();
        if let Some(callback) = callback {
            deliver(&callback, data);
        }
    }
}

pub(crate) fn deliver(callback: &UpdateCallback, data: TimerData) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(data))) {
        error!("Update callback panicked: {}", panic_message(payload.as_ref()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
