//! Fix source abstraction.
//!
//! The platform location provider is a black box that emits periodic
//! position samples. Implementations push fixes into an injected
//! channel sink rather than reaching into the owning service, so the
//! service and the provider stay decoupled.

use tokio::sync::mpsc;

use geolink_types::{FixRequest, LocationFix};

use crate::error::Result;

/// Sink that fix sources deliver samples into.
pub type FixSink = mpsc::Sender<LocationFix>;

/// A periodic provider of location fixes.
///
/// Implementations include the agent's simulated walk source and
/// [`crate::mock::MockFixSource`] for tests; real deployments wrap the
/// platform's location services.
pub trait FixSource: Send {
    /// Update the active request cadence.
    ///
    /// Takes effect from the next scheduled fix onward; an in-flight
    /// request is not required to honor the new cadence.
    fn configure(&mut self, request: FixRequest);

    /// Begin emitting fixes asynchronously into `sink` until
    /// [`stop`](Self::stop) is called.
    fn start(&mut self, sink: FixSink) -> Result<()>;

    /// Stop emitting fixes. Safe to call when not started.
    fn stop(&mut self);
}
