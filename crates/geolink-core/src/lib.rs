//! Location reporting pipeline with a resilient WebSocket link.
//!
//! This crate implements the device-side core of GeoLink: it takes
//! periodic location fixes from a [`FixSource`], adapts the fix
//! request profile to the observed accuracy, encodes fixes into JSON
//! reports, and delivers them over a persistent WebSocket connection
//! that reconnects forever on a fixed interval. Reports produced while
//! the link is down are buffered in FIFO order and flushed on the next
//! successful connection.
//!
//! # Architecture
//!
//! - [`ReportingService`]: the long-running orchestrator; one event
//!   loop serializes fixes, link events, and shutdown
//! - [`LinkManager`]: the connection state machine with fixed-interval
//!   retry
//! - [`PendingQueue`]: FIFO buffer of undelivered reports
//! - [`AccuracyController`]: accuracy-threshold profile selection
//! - [`Transport`]: seam between the pipeline and tokio-tungstenite,
//!   mockable for tests
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use geolink_core::{ReporterConfig, ReportingService, WsTransport};
//! use geolink_core::mock::MockFixSource;
//!
//! # async fn example() -> geolink_core::Result<()> {
//! let config = Arc::new(ReporterConfig::new("wss://tracker.example.com/report"));
//! let source = MockFixSource::new();
//! let mut service =
//!     ReportingService::new(config, "355420071234567", source, Arc::new(WsTransport::new()));
//!
//! let stop = service.cancellation_token();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     stop.cancel();
//! });
//! service.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod accuracy;
pub mod config;
pub mod error;
pub mod events;
pub mod link;
pub mod mock;
pub mod queue;
pub mod service;
pub mod source;
pub mod transport;

pub use accuracy::AccuracyController;
pub use config::{DEFAULT_ACCURACY_THRESHOLD_M, DEFAULT_RETRY_INTERVAL, ReporterConfig};
pub use error::{Error, Result};
pub use events::{EventReceiver, EventSender, ReporterEvent, event_channel};
pub use link::{LinkEvent, LinkManager, LinkState, SendOutcome};
pub use queue::PendingQueue;
pub use service::ReportingService;
pub use source::{FixSink, FixSource};
pub use transport::{NORMAL_CLOSURE, Transport, TransportEvent, TransportLink, WsTransport};

// Re-export the shared types for convenience.
pub use geolink_types::{AccuracyProfile, FixRequest, LocationFix, Report, UNKNOWN_DEVICE_ID};
