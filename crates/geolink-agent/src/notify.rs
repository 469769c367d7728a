//! Session lifecycle notifications.
//!
//! A [`SessionNotifier`] is told when the reporting session starts and
//! ends. The default implementation logs; a platform integration could
//! surface a persistent notification or status icon instead.

use tracing::info;

/// Observer for reporting session lifecycle.
pub trait SessionNotifier: Send {
    /// Called once when the session starts, before any report is sent.
    fn session_started(&self, device_id: &str, endpoint: &str);

    /// Called once after the session has fully stopped.
    fn session_ended(&self);
}

/// A [`SessionNotifier`] that writes to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl SessionNotifier for LogNotifier {
    fn session_started(&self, device_id: &str, endpoint: &str) {
        info!(%device_id, %endpoint, "location reporting session started");
    }

    fn session_ended(&self) {
        info!("location reporting session ended");
    }
}
