//! WebSocket link lifecycle management.
//!
//! [`LinkManager`] owns the connection state machine: it connects,
//! sends encoded reports, detects transport failure or close, and arms
//! a fixed-interval reconnect timer. Failures are never fatal; the
//! link retries indefinitely until [`close`](LinkManager::close) is
//! called.
//!
//! The manager is single-owner: one event loop drives it through
//! [`next_event`](LinkManager::next_event), which serializes all state
//! transitions with respect to sends.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use geolink_types::Report;

use crate::config::ReporterConfig;
use crate::error::Result;
use crate::events::{EventSender, ReporterEvent};
use crate::transport::{Transport, TransportEvent, TransportLink};

/// Connection state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection and no connect attempt in flight.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The transport is open and accepting writes.
    Connected,
}

/// Link events surfaced to the owning event loop.
///
/// Reconnect timing is internal to the manager; by the time an event
/// is returned the corresponding state transition has already
/// happened, so the caller only reacts (drain on [`Open`](Self::Open),
/// log the rest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link reached the connected state.
    Open,
    /// Inbound text frame.
    Message(String),
    /// The peer closed the connection.
    Closed { code: Option<u16>, reason: String },
    /// The connect attempt or the established transport failed.
    Failed(String),
}

/// Outcome of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The transport accepted the write.
    Sent,
    /// The report could not be encoded. It has been logged and must
    /// be dropped; queueing it would head-block every future flush.
    Invalid,
    /// The link is not connected, or the write dropped it. The caller
    /// should queue the report for the next connection.
    Offline,
}

type PendingOpen = oneshot::Receiver<Result<Box<dyn TransportLink>>>;

/// Owns the WebSocket connection lifecycle.
pub struct LinkManager {
    transport: Arc<dyn Transport>,
    endpoint: String,
    retry_interval: Duration,
    state: LinkState,
    link: Option<Box<dyn TransportLink>>,
    pending_open: Option<PendingOpen>,
    reconnect_at: Option<Instant>,
    events: Option<EventSender>,
}

impl LinkManager {
    /// Create a link manager for the configured endpoint.
    pub fn new(transport: Arc<dyn Transport>, config: &ReporterConfig) -> Self {
        Self {
            transport,
            endpoint: config.endpoint.clone(),
            retry_interval: config.retry_interval,
            state: LinkState::Disconnected,
            link: None,
            pending_open: None,
            reconnect_at: None,
            events: None,
        }
    }

    /// Attach an event sender for connection notifications.
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Whether the link is connected.
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Whether a reconnect timer is currently armed.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_at.is_some()
    }

    /// Start a connect attempt.
    ///
    /// No-op unless the link is disconnected. The attempt runs off the
    /// event loop; its outcome surfaces as an [`LinkEvent::Open`] or
    /// [`LinkEvent::Failed`] from [`next_event`](Self::next_event).
    pub fn connect(&mut self) {
        if self.state != LinkState::Disconnected {
            return;
        }
        self.state = LinkState::Connecting;
        info!(endpoint = %self.endpoint, "connecting");

        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            let result = transport.connect(&endpoint).await;
            if let Err(result) = tx.send(result) {
                // The manager was closed while we were connecting;
                // discard the connection instead of leaking it.
                if let Ok(mut link) = result {
                    link.close().await;
                }
            }
        });
        self.pending_open = Some(rx);
    }

    /// Send a report over the link.
    ///
    /// [`SendOutcome::Offline`] means the report was not delivered and
    /// should be queued; a rejected write drops the link and arms the
    /// reconnect timer before returning it. An unencodable report is
    /// reported as [`SendOutcome::Invalid`] and the link stays up. No
    /// retry happens here.
    pub async fn send(&mut self, report: &Report) -> SendOutcome {
        if self.state != LinkState::Connected {
            return SendOutcome::Offline;
        }
        let Some(link) = self.link.as_mut() else {
            return SendOutcome::Offline;
        };
        let payload = match report.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "dropping unencodable report");
                return SendOutcome::Invalid;
            }
        };
        match link.send_text(payload).await {
            Ok(()) => SendOutcome::Sent,
            Err(e) => {
                self.drop_link(format!("send rejected: {e}"));
                SendOutcome::Offline
            }
        }
    }

    /// Wait for the next link event.
    ///
    /// Also drives the reconnect timer: when the retry interval
    /// elapses a new connect attempt starts internally and this call
    /// keeps waiting for its outcome. If the link is fully idle
    /// (closed, no timer) the future never resolves, which lets the
    /// owning loop park this branch of its `select!`.
    ///
    /// Cancel-safe: dropping the returned future loses no events.
    pub async fn next_event(&mut self) -> LinkEvent {
        loop {
            if let Some(rx) = &mut self.pending_open {
                let result = rx.await;
                self.pending_open = None;
                return match result {
                    Ok(Ok(link)) => {
                        self.link = Some(link);
                        self.state = LinkState::Connected;
                        info!("link established");
                        self.emit(ReporterEvent::LinkConnected);
                        LinkEvent::Open
                    }
                    Ok(Err(e)) => self.fail(format!("connect failed: {e}")),
                    Err(_) => self.fail("connect task dropped".to_string()),
                };
            }

            if let Some(link) = self.link.as_mut() {
                match link.next_event().await {
                    TransportEvent::Message(text) => return LinkEvent::Message(text),
                    TransportEvent::Closed { code, reason } => {
                        self.link = None;
                        let _ = self.fail(format!("closed by peer: {reason}"));
                        return LinkEvent::Closed { code, reason };
                    }
                    TransportEvent::Failed(reason) => {
                        self.link = None;
                        return self.fail(reason);
                    }
                }
            }

            if let Some(deadline) = self.reconnect_at {
                sleep_until(deadline).await;
                self.reconnect_at = None;
                debug!("retry interval elapsed");
                self.connect();
                continue;
            }

            futures::future::pending::<()>().await;
        }
    }

    /// Close the link and release the transport.
    ///
    /// Transitions unconditionally to [`LinkState::Disconnected`],
    /// cancels any pending reconnect timer and in-flight connect, and
    /// closes the transport with code 1000. Safe to call from any
    /// state, any number of times.
    pub async fn close(&mut self) {
        self.reconnect_at = None;
        // Dropping the receiver makes the connect task discard its
        // result, so no connection survives shutdown.
        self.pending_open = None;
        if let Some(mut link) = self.link.take() {
            link.close().await;
            info!("link closed");
        }
        self.state = LinkState::Disconnected;
    }

    /// Record a transport failure: disconnect and arm the retry timer.
    fn fail(&mut self, reason: String) -> LinkEvent {
        warn!(%reason, "link failure");
        self.link = None;
        self.state = LinkState::Disconnected;
        self.schedule_reconnect();
        self.emit(ReporterEvent::LinkDisconnected {
            reason: reason.clone(),
        });
        LinkEvent::Failed(reason)
    }

    fn drop_link(&mut self, reason: String) {
        let _ = self.fail(reason);
    }

    /// Arm the one-shot reconnect timer; a no-op while one is pending.
    fn schedule_reconnect(&mut self) {
        if self.reconnect_at.is_some() {
            return;
        }
        self.reconnect_at = Some(Instant::now() + self.retry_interval);
        info!(delay = ?self.retry_interval, "reconnect scheduled");
        self.emit(ReporterEvent::ReconnectScheduled {
            delay: self.retry_interval,
        });
    }

    fn emit(&self, event: ReporterEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use geolink_types::LocationFix;

    fn manager(transport: &MockTransport) -> LinkManager {
        let config = ReporterConfig::default();
        LinkManager::new(Arc::new(transport.clone()), &config)
    }

    fn report() -> Report {
        Report::from_fix(&LocationFix::new(1.0, 2.0, 5.0, 3.0), "dev")
    }

    #[tokio::test]
    async fn test_close_before_connect_is_safe() {
        let transport = MockTransport::new();
        let mut link = manager(&transport);

        link.close().await;
        link.close().await;

        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(!link.reconnect_pending());
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_offline() {
        let transport = MockTransport::new();
        let mut link = manager(&transport);

        assert_eq!(link.send(&report()).await, SendOutcome::Offline);
        assert!(transport.sent_frames().is_empty());
    }

    #[tokio::test]
    async fn test_connect_then_send() {
        let transport = MockTransport::new();
        let mut link = manager(&transport);

        link.connect();
        assert_eq!(link.state(), LinkState::Connecting);
        assert_eq!(link.next_event().await, LinkEvent::Open);
        assert_eq!(link.state(), LinkState::Connected);

        assert_eq!(link.send(&report()).await, SendOutcome::Sent);
        assert_eq!(transport.sent_frames().len(), 1);
        assert!(transport.sent_frames()[0].contains("\"imei\":\"dev\""));
    }

    #[tokio::test]
    async fn test_connect_while_connecting_is_noop() {
        let transport = MockTransport::new();
        let mut link = manager(&transport);

        link.connect();
        link.connect();
        assert_eq!(link.next_event().await, LinkEvent::Open);
        assert_eq!(transport.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_arms_reconnect_timer() {
        let transport = MockTransport::new();
        transport.fail_next_connects(1);
        let mut link = manager(&transport);

        link.connect();
        let event = link.next_event().await;
        assert!(matches!(event, LinkEvent::Failed(_)));
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(link.reconnect_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_timer_fires_after_retry_interval() {
        let transport = MockTransport::new();
        transport.fail_next_connects(1);
        let mut link = manager(&transport);

        link.connect();
        assert!(matches!(link.next_event().await, LinkEvent::Failed(_)));

        let before = Instant::now();
        // Paused time auto-advances to the timer deadline.
        assert_eq!(link.next_event().await, LinkEvent::Open);
        assert!(Instant::now() - before >= Duration::from_secs(15));
        assert_eq!(transport.connect_attempts(), 2);
    }

    #[tokio::test]
    async fn test_send_failure_drops_link() {
        let transport = MockTransport::new();
        let mut link = manager(&transport);

        link.connect();
        assert_eq!(link.next_event().await, LinkEvent::Open);

        transport.fail_sends_after(0);
        assert_eq!(link.send(&report()).await, SendOutcome::Offline);
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(link.reconnect_pending());
    }

    #[tokio::test]
    async fn test_transport_failure_event() {
        let transport = MockTransport::new();
        let mut link = manager(&transport);

        link.connect();
        assert_eq!(link.next_event().await, LinkEvent::Open);

        transport.inject(TransportEvent::Failed("socket reset".to_string()));
        let event = link.next_event().await;
        assert_eq!(event, LinkEvent::Failed("socket reset".to_string()));
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(link.reconnect_pending());
    }

    #[tokio::test]
    async fn test_close_cancels_reconnect_timer() {
        let transport = MockTransport::new();
        transport.fail_next_connects(1);
        let mut link = manager(&transport);

        link.connect();
        assert!(matches!(link.next_event().await, LinkEvent::Failed(_)));
        assert!(link.reconnect_pending());

        link.close().await;
        assert!(!link.reconnect_pending());
        assert_eq!(link.state(), LinkState::Disconnected);
    }

    #[tokio::test]
    async fn test_close_while_connected_closes_transport() {
        let transport = MockTransport::new();
        let mut link = manager(&transport);

        link.connect();
        assert_eq!(link.next_event().await, LinkEvent::Open);

        link.close().await;
        assert_eq!(link.state(), LinkState::Disconnected);
        assert_eq!(transport.closed_links(), 1);
    }

    #[tokio::test]
    async fn test_inbound_message_surfaces() {
        let transport = MockTransport::new();
        let mut link = manager(&transport);

        link.connect();
        assert_eq!(link.next_event().await, LinkEvent::Open);

        transport.inject(TransportEvent::Message("ack".to_string()));
        assert_eq!(
            link.next_event().await,
            LinkEvent::Message("ack".to_string())
        );
        // Inbound traffic does not disturb the connection.
        assert_eq!(link.state(), LinkState::Connected);
    }
}
