//! Reporter event system for link and delivery notifications.
//!
//! Events are broadcast for observability; the pipeline itself never
//! depends on anyone listening.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use geolink_types::Report;

/// Events emitted by the reporting service.
///
/// All events are serializable for logging and IPC. This enum is
/// marked `#[non_exhaustive]` to allow adding new event types in
/// future versions without breaking downstream code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ReporterEvent {
    /// The link reached the connected state.
    LinkConnected,
    /// The link dropped to the disconnected state.
    LinkDisconnected { reason: String },
    /// A reconnect timer was armed.
    ReconnectScheduled { delay: Duration },
    /// A report was accepted by the transport.
    ReportSent { report: Report },
    /// A report was buffered because the link was down.
    ReportQueued { report: Report, queued: usize },
    /// A queue flush completed after reconnection.
    QueueDrained { sent: usize, remaining: usize },
}

/// Sender for reporter events.
pub type EventSender = broadcast::Sender<ReporterEvent>;

/// Receiver for reporter events.
pub type EventReceiver = broadcast::Receiver<ReporterEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    broadcast::channel(capacity)
}

/// Create a default event channel with capacity 100.
pub fn default_event_channel() -> (EventSender, EventReceiver) {
    event_channel(100)
}
