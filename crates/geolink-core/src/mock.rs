//! Mock transport and fix source for testing.
//!
//! These mocks let the whole pipeline run without a network or a
//! platform location provider:
//!
//! - **Failure injection**: script connect refusals and rejected sends
//! - **Event injection**: push close/failure/message events into the
//!   live link
//! - **Capture**: every frame accepted by the transport is recorded

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use geolink_types::{FixRequest, LocationFix};

use crate::error::{Error, Result};
use crate::source::{FixSink, FixSource};
use crate::transport::{Transport, TransportEvent, TransportLink};

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TransportState {
    connect_attempts: u32,
    connect_failures_remaining: u32,
    /// Number of sends to accept before rejecting; `None` accepts all.
    sends_before_failure: Option<u32>,
    sent: Vec<String>,
    closed_links: u32,
    /// Injector into the most recently opened link.
    event_tx: Option<mpsc::UnboundedSender<TransportEvent>>,
}

/// An in-memory [`Transport`] with scripted behavior.
///
/// Clones share state, so a clone kept by the test observes frames
/// sent through the clone handed to the link manager.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    /// Create a mock transport that accepts every connect and send.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Refuse the next `n` connect attempts.
    pub fn fail_next_connects(&self, n: u32) {
        self.lock().connect_failures_remaining = n;
    }

    /// Accept the next `n` sends, then reject every send after that.
    pub fn fail_sends_after(&self, n: u32) {
        self.lock().sends_before_failure = Some(n);
    }

    /// Accept all sends again.
    pub fn allow_sends(&self) {
        self.lock().sends_before_failure = None;
    }

    /// Push a transport event into the currently open link.
    pub fn inject(&self, event: TransportEvent) {
        if let Some(tx) = &self.lock().event_tx {
            let _ = tx.send(event);
        }
    }

    /// Frames accepted so far, in send order.
    pub fn sent_frames(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Total connect attempts, including refused ones.
    pub fn connect_attempts(&self) -> u32 {
        self.lock().connect_attempts
    }

    /// Number of links closed via [`TransportLink::close`].
    pub fn closed_links(&self) -> u32 {
        self.lock().closed_links
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _endpoint: &str) -> Result<Box<dyn TransportLink>> {
        let mut state = self.lock();
        state.connect_attempts += 1;
        if state.connect_failures_remaining > 0 {
            state.connect_failures_remaining -= 1;
            return Err(Error::Io(std::io::Error::other("mock connect refused")));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.event_tx = Some(tx);
        Ok(Box::new(MockLink {
            state: Arc::clone(&self.state),
            events: rx,
        }))
    }
}

struct MockLink {
    state: Arc<Mutex<TransportState>>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl MockLink {
    fn lock(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TransportLink for MockLink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        let mut state = self.lock();
        match state.sends_before_failure {
            Some(0) => Err(Error::Io(std::io::Error::other("mock send rejected"))),
            Some(ref mut n) => {
                *n -= 1;
                state.sent.push(text);
                Ok(())
            }
            None => {
                state.sent.push(text);
                Ok(())
            }
        }
    }

    async fn next_event(&mut self) -> TransportEvent {
        match self.events.recv().await {
            Some(event) => event,
            // Injector replaced by a newer link; stay quiet forever.
            None => futures::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.lock().closed_links += 1;
    }
}

// ---------------------------------------------------------------------------
// MockFixSource
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SourceState {
    configured: Vec<FixRequest>,
    sink: Option<FixSink>,
    started: bool,
}

/// A [`FixSource`] whose fixes are emitted manually by the test.
#[derive(Debug, Default)]
pub struct MockFixSource {
    state: Arc<Mutex<SourceState>>,
}

/// Handle for driving a [`MockFixSource`] from outside the service.
#[derive(Debug, Clone)]
pub struct MockFixHandle {
    state: Arc<Mutex<SourceState>>,
}

impl MockFixSource {
    /// Create a mock fix source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for emitting fixes and inspecting configuration calls.
    pub fn handle(&self) -> MockFixHandle {
        MockFixHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FixSource for MockFixSource {
    fn configure(&mut self, request: FixRequest) {
        self.lock().configured.push(request);
    }

    fn start(&mut self, sink: FixSink) -> Result<()> {
        let mut state = self.lock();
        if state.started {
            return Err(Error::fix_source("already started"));
        }
        state.started = true;
        state.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        state.started = false;
        state.sink = None;
    }
}

impl MockFixHandle {
    fn lock(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Emit a fix into the running service.
    ///
    /// Returns `false` if the source is stopped or the service went
    /// away.
    pub async fn emit(&self, fix: LocationFix) -> bool {
        let sink = self.lock().sink.clone();
        match sink {
            Some(sink) => sink.send(fix).await.is_ok(),
            None => false,
        }
    }

    /// Every cadence the service has configured, in call order.
    pub fn configured(&self) -> Vec<FixRequest> {
        self.lock().configured.clone()
    }

    /// Whether the source has been started and not yet stopped.
    pub fn is_started(&self) -> bool {
        self.lock().started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_scripted_connect_failures() {
        let transport = MockTransport::new();
        transport.fail_next_connects(2);

        assert!(transport.connect("ws://test").await.is_err());
        assert!(transport.connect("ws://test").await.is_err());
        assert!(transport.connect("ws://test").await.is_ok());
        assert_eq!(transport.connect_attempts(), 3);
    }

    #[tokio::test]
    async fn test_mock_transport_records_frames() {
        let transport = MockTransport::new();
        let mut link = transport.connect("ws://test").await.unwrap();

        link.send_text("one".to_string()).await.unwrap();
        link.send_text("two".to_string()).await.unwrap();
        assert_eq!(transport.sent_frames(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_mock_transport_send_failure_budget() {
        let transport = MockTransport::new();
        transport.fail_sends_after(1);
        let mut link = transport.connect("ws://test").await.unwrap();

        assert!(link.send_text("one".to_string()).await.is_ok());
        assert!(link.send_text("two".to_string()).await.is_err());
        assert_eq!(transport.sent_frames(), vec!["one"]);
    }

    #[tokio::test]
    async fn test_mock_transport_event_injection() {
        let transport = MockTransport::new();
        let mut link = transport.connect("ws://test").await.unwrap();

        transport.inject(TransportEvent::Message("hello".to_string()));
        assert_eq!(
            link.next_event().await,
            TransportEvent::Message("hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_mock_fix_source_lifecycle() {
        let mut source = MockFixSource::new();
        let handle = source.handle();
        let (tx, mut rx) = mpsc::channel(4);

        assert!(!handle.is_started());
        source.start(tx).unwrap();
        assert!(handle.is_started());

        let fix = LocationFix::new(1.0, 2.0, 5.0, 3.0);
        assert!(handle.emit(fix).await);
        assert_eq!(rx.recv().await.unwrap(), fix);

        source.stop();
        assert!(!handle.is_started());
        assert!(!handle.emit(fix).await);
    }

    #[tokio::test]
    async fn test_mock_fix_source_double_start() {
        let mut source = MockFixSource::new();
        let (tx, _rx) = mpsc::channel(4);
        source.start(tx.clone()).unwrap();
        assert!(source.start(tx).is_err());
    }
}
