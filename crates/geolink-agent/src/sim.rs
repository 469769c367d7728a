//! Simulated fix provider.
//!
//! [`RandomWalkSource`] emits fixes along a random walk from an origin
//! coordinate, with randomized accuracy and speed. It honors cadence
//! reconfiguration mid-flight, so the accuracy feedback loop can be
//! observed end to end without GPS hardware.
//!
//! The walker emits strictly periodically on `FixRequest::interval`.
//! `min_update_interval` only bounds providers that can deliver
//! opportunistic updates between scheduled fixes; a periodic emitter
//! with `interval >= min_update_interval` (enforced by config
//! validation) satisfies it trivially, so it is not consulted here.

use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use geolink_core::{Error, FixSink, FixSource, Result};
use geolink_types::{FixRequest, LocationFix};

/// Maximum per-step displacement in decimal degrees (roughly 50 m).
const MAX_STEP_DEG: f64 = 0.0005;
/// Simulated speed range in m/s.
const SPEED_RANGE_MPS: std::ops::Range<f64> = 0.0..25.0;
/// Simulated accuracy range in meters; wide enough to cross the
/// default 50 m profile threshold in both directions.
const ACCURACY_RANGE_M: std::ops::Range<f32> = 3.0..120.0;

/// A [`FixSource`] that wanders randomly from an origin.
pub struct RandomWalkSource {
    origin: (f64, f64),
    request_tx: watch::Sender<FixRequest>,
    cancel: Option<CancellationToken>,
}

impl RandomWalkSource {
    /// Create a source starting at the given coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        let initial = FixRequest::new(Duration::from_secs(10), Duration::from_secs(5));
        let (request_tx, _) = watch::channel(initial);
        Self {
            origin: (latitude, longitude),
            request_tx,
            cancel: None,
        }
    }
}

impl FixSource for RandomWalkSource {
    fn configure(&mut self, request: FixRequest) {
        // Wakes the walker if it is mid-sleep on the old cadence.
        let _ = self.request_tx.send(request);
    }

    fn start(&mut self, sink: FixSink) -> Result<()> {
        if self.cancel.is_some() {
            return Err(Error::fix_source("already started"));
        }
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());

        let mut request_rx = self.request_tx.subscribe();
        let (mut latitude, mut longitude) = self.origin;
        tokio::spawn(async move {
            loop {
                let interval = request_rx.borrow_and_update().interval;
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                    changed = request_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        // Restart the sleep on the new cadence.
                        continue;
                    }
                }

                let (step_lat, step_lon, speed_mps, accuracy_m) = {
                    let mut rng = rand::rng();
                    (
                        rng.random_range(-MAX_STEP_DEG..MAX_STEP_DEG),
                        rng.random_range(-MAX_STEP_DEG..MAX_STEP_DEG),
                        rng.random_range(SPEED_RANGE_MPS),
                        rng.random_range(ACCURACY_RANGE_M),
                    )
                };
                latitude += step_lat;
                longitude += step_lon;

                let fix = LocationFix::new(latitude, longitude, accuracy_m, speed_mps);
                if sink.send(fix).await.is_err() {
                    debug!("fix sink closed, stopping walker");
                    break;
                }
            }
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}
