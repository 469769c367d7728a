//! Reporter configuration.
//!
//! All tunables of the pipeline live in a single immutable
//! [`ReporterConfig`] constructed once at startup and shared by
//! reference; components never consult ambient globals.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use geolink_types::{AccuracyProfile, FixRequest};

use crate::error::{Error, Result};

/// Default fixed delay between reconnect attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(15);

/// Default accuracy cutoff (meters) between the two request profiles.
pub const DEFAULT_ACCURACY_THRESHOLD_M: f32 = 50.0;

/// Configuration for the reporting pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// WebSocket endpoint URL (`ws://` or `wss://`).
    pub endpoint: String,
    /// Fixed delay between reconnect attempts.
    pub retry_interval: Duration,
    /// Accuracy cutoff in meters: fixes worse than this switch the
    /// source to the balanced-power profile.
    pub accuracy_threshold_m: f32,
    /// Request cadence while in the high-accuracy profile.
    pub high_accuracy: FixRequest,
    /// Request cadence while in the balanced-power profile.
    pub balanced_power: FixRequest,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:9001".to_string(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            accuracy_threshold_m: DEFAULT_ACCURACY_THRESHOLD_M,
            high_accuracy: FixRequest::new(Duration::from_secs(10), Duration::from_secs(5)),
            balanced_power: FixRequest::new(Duration::from_secs(30), Duration::from_secs(15)),
        }
    }
}

impl ReporterConfig {
    /// Create a config for the given endpoint with default tunables.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the reconnect retry interval.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the accuracy threshold in meters.
    #[must_use]
    pub fn accuracy_threshold_m(mut self, threshold: f32) -> Self {
        self.accuracy_threshold_m = threshold;
        self
    }

    /// Request cadence for the given profile.
    pub fn request_for(&self, profile: AccuracyProfile) -> FixRequest {
        match profile {
            AccuracyProfile::HighAccuracy => self.high_accuracy,
            AccuracyProfile::BalancedPower => self.balanced_power,
        }
    }

    /// Validate the configuration and return an error if invalid.
    ///
    /// Checks that:
    /// - `endpoint` is a `ws://` or `wss://` URL
    /// - `retry_interval` is > 0
    /// - `accuracy_threshold_m` is > 0 and finite
    /// - both cadences have `min_update_interval <= interval` and
    ///   non-zero intervals
    pub fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with("ws://") && !self.endpoint.starts_with("wss://") {
            return Err(Error::invalid_config(format!(
                "endpoint '{}' must be a ws:// or wss:// URL",
                self.endpoint
            )));
        }
        if self.retry_interval.is_zero() {
            return Err(Error::invalid_config("retry_interval must be > 0"));
        }
        if !self.accuracy_threshold_m.is_finite() || self.accuracy_threshold_m <= 0.0 {
            return Err(Error::invalid_config(
                "accuracy_threshold_m must be a positive number",
            ));
        }
        for (name, request) in [
            ("high_accuracy", &self.high_accuracy),
            ("balanced_power", &self.balanced_power),
        ] {
            if request.interval.is_zero() {
                return Err(Error::invalid_config(format!(
                    "{name}.interval must be > 0"
                )));
            }
            if request.min_update_interval > request.interval {
                return Err(Error::invalid_config(format!(
                    "{name}.min_update_interval must be <= {name}.interval"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(ReporterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_tunables() {
        let config = ReporterConfig::default();
        assert_eq!(config.retry_interval, Duration::from_secs(15));
        assert_eq!(config.accuracy_threshold_m, 50.0);
    }

    #[test]
    fn test_rejects_non_websocket_endpoint() {
        let config = ReporterConfig::new("http://example.com");
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_retry_interval() {
        let config = ReporterConfig::default().retry_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_cadence() {
        let mut config = ReporterConfig::default();
        config.high_accuracy =
            FixRequest::new(Duration::from_secs(5), Duration::from_secs(10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_for_profile() {
        let config = ReporterConfig::default();
        assert_eq!(
            config.request_for(AccuracyProfile::HighAccuracy),
            config.high_accuracy
        );
        assert_eq!(
            config.request_for(AccuracyProfile::BalancedPower),
            config.balanced_power
        );
    }
}
