//! The long-running reporting service.
//!
//! [`ReportingService`] wires the pipeline together: fixes flow from
//! the [`FixSource`] through the accuracy controller and the report
//! encoder to the [`LinkManager`], with the [`PendingQueue`] buffering
//! anything the link cannot deliver.
//!
//! A single event loop serializes fix handling, link events, and
//! shutdown, giving single-writer discipline over the link state and
//! the queue.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use geolink_types::{AccuracyProfile, LocationFix, Report};

use crate::accuracy::AccuracyController;
use crate::config::ReporterConfig;
use crate::error::Result;
use crate::events::{EventReceiver, EventSender, ReporterEvent, default_event_channel};
use crate::link::{LinkEvent, LinkManager, LinkState, SendOutcome};
use crate::queue::PendingQueue;
use crate::source::FixSource;
use crate::transport::Transport;

/// Buffer size for the fix delivery channel.
const FIX_BUFFER: usize = 16;

enum Step {
    Shutdown,
    Fix(Option<LocationFix>),
    Link(LinkEvent),
}

/// Orchestrates fix acquisition, encoding, and delivery.
pub struct ReportingService<S: FixSource> {
    config: Arc<ReporterConfig>,
    device_id: String,
    source: S,
    link: LinkManager,
    queue: PendingQueue,
    controller: AccuracyController,
    profile: AccuracyProfile,
    events: EventSender,
    shutdown: CancellationToken,
}

impl<S: FixSource> ReportingService<S> {
    /// Create a service from its collaborators.
    ///
    /// The device identifier is captured once here; pass the sentinel
    /// `"unknown"` (or an empty string) when none is available.
    pub fn new(
        config: Arc<ReporterConfig>,
        device_id: impl Into<String>,
        source: S,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (events, _) = default_event_channel();
        let link = LinkManager::new(Arc::clone(&transport), &config).with_events(events.clone());
        let controller = AccuracyController::new(config.accuracy_threshold_m);
        Self {
            config,
            device_id: device_id.into(),
            source,
            link,
            queue: PendingQueue::new(),
            controller,
            profile: AccuracyProfile::default(),
            events,
            shutdown: CancellationToken::new(),
        }
    }

    /// Subscribe to reporter events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Token that stops the service when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Current link state.
    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Number of reports waiting for delivery.
    pub fn queued_reports(&self) -> usize {
        self.queue.len()
    }

    /// Run the service until the cancellation token fires.
    ///
    /// Wires the components, connects the link, starts the fix source,
    /// and drives the event loop. On exit the source is stopped and
    /// the link closed, in that order, unconditionally.
    pub async fn run(&mut self) -> Result<()> {
        let mut fix_rx = self.start().await?;
        let shutdown = self.shutdown.clone();

        loop {
            let step = tokio::select! {
                _ = shutdown.cancelled() => Step::Shutdown,
                fix = fix_rx.recv() => Step::Fix(fix),
                event = self.link.next_event() => Step::Link(event),
            };
            match step {
                Step::Shutdown => break,
                Step::Fix(Some(fix)) => self.handle_fix(fix).await,
                Step::Fix(None) => {
                    warn!("fix source dropped its sink, shutting down");
                    break;
                }
                Step::Link(event) => self.handle_link_event(event).await,
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Wire the components and begin acquisition.
    async fn start(&mut self) -> Result<mpsc::Receiver<LocationFix>> {
        self.config.validate()?;
        info!(
            endpoint = %self.config.endpoint,
            device_id = %self.device_id,
            "starting reporting service"
        );

        self.link.connect();
        self.source.configure(self.config.request_for(self.profile));

        let (fix_tx, fix_rx) = mpsc::channel(FIX_BUFFER);
        if let Err(e) = self.source.start(fix_tx) {
            // Keep the release path symmetric even on a failed start.
            self.link.close().await;
            return Err(e);
        }
        Ok(fix_rx)
    }

    /// Stop acquisition, then release the link. Both steps always run.
    async fn stop(&mut self) {
        self.source.stop();
        self.link.close().await;
        info!(queued = self.queue.len(), "reporting service stopped");
    }

    async fn handle_fix(&mut self, fix: LocationFix) {
        // Feed the accuracy of this fix back into the request cadence
        // for the next one.
        let profile = self.controller.next_profile(&fix);
        if profile != self.profile {
            info!(?profile, accuracy_m = fix.accuracy_m, "accuracy profile changed");
            self.profile = profile;
        }
        self.source.configure(self.config.request_for(profile));

        let report = Report::from_fix(&fix, &self.device_id);
        match self.link.send(&report).await {
            SendOutcome::Sent => {
                debug!(
                    latitude = report.latitude,
                    longitude = report.longitude,
                    speed_kmh = report.speed_kmh,
                    "report sent"
                );
                self.emit(ReporterEvent::ReportSent { report });
            }
            // Already logged by the link manager; queueing an
            // unencodable report would head-block the drain.
            SendOutcome::Invalid => {}
            SendOutcome::Offline => {
                // The link manager already owns reconnect scheduling;
                // we only buffer.
                self.queue.enqueue(report.clone());
                debug!(queued = self.queue.len(), "link down, report buffered");
                self.emit(ReporterEvent::ReportQueued {
                    report,
                    queued: self.queue.len(),
                });
            }
        }
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Open => self.drain_queue().await,
            LinkEvent::Message(text) => {
                // No inbound protocol is defined; log and move on.
                debug!(%text, "inbound frame ignored");
            }
            LinkEvent::Closed { code, reason } => {
                debug!(?code, %reason, "link closed by peer");
            }
            LinkEvent::Failed(reason) => {
                debug!(%reason, "link failed, retry pending");
            }
        }
    }

    /// Flush buffered reports in FIFO order.
    ///
    /// Aborts at the first rejected send; the remainder stays queued
    /// for the next successful connection.
    async fn drain_queue(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let mut sent = 0;
        while let Some(report) = self.queue.front() {
            match self.link.send(report).await {
                SendOutcome::Sent => {
                    self.queue.pop_front();
                    sent += 1;
                }
                SendOutcome::Invalid => {
                    self.queue.pop_front();
                }
                SendOutcome::Offline => break,
            }
        }
        info!(sent, remaining = self.queue.len(), "pending queue drained");
        self.emit(ReporterEvent::QueueDrained {
            sent,
            remaining: self.queue.len(),
        });
    }

    fn emit(&self, event: ReporterEvent) {
        let _ = self.events.send(event);
    }
}
