//! Core data types for the location reporting pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Sentinel device identifier used when no real identifier is available.
pub const UNKNOWN_DEVICE_ID: &str = "unknown";

/// Conversion factor from meters/second to kilometers/hour.
const MPS_TO_KMH: f64 = 3.6;

/// A single location sample as delivered by the platform fix provider.
///
/// A fix is immutable once produced; the capture timestamp is taken
/// when the fix is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Estimated horizontal accuracy radius in meters.
    pub accuracy_m: f32,
    /// Ground speed in meters per second.
    pub speed_mps: f64,
    /// When the fix was captured.
    #[serde(with = "time::serde::rfc3339")]
    pub captured_at: OffsetDateTime,
}

impl LocationFix {
    /// Create a fix captured now.
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f32, speed_mps: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            speed_mps,
            captured_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Power/accuracy profile driving the fix provider's request cadence.
///
/// Exactly one profile is active at a time; it is selected per fix by
/// the accuracy controller based on the latest fix's reported accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyProfile {
    /// Prioritize fix accuracy over battery use.
    #[default]
    HighAccuracy,
    /// Trade accuracy for battery when recent fixes are poor anyway.
    BalancedPower,
}

/// Request cadence handed to the fix provider for a given profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRequest {
    /// Desired interval between fixes.
    pub interval: Duration,
    /// Minimum interval the provider may deliver updates at.
    pub min_update_interval: Duration,
}

impl FixRequest {
    /// Create a new fix request cadence.
    pub fn new(interval: Duration, min_update_interval: Duration) -> Self {
        Self {
            interval,
            min_update_interval,
        }
    }
}

/// An encoded location report ready for delivery.
///
/// Serializes to the wire schema expected by the server:
/// `{"latitude": .., "longitude": .., "speed": .., "imei": ..}` with
/// speed in kilometers per hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Ground speed in kilometers per hour.
    #[serde(rename = "speed")]
    pub speed_kmh: f64,
    /// Device identifier, or [`UNKNOWN_DEVICE_ID`] if unavailable.
    #[serde(rename = "imei")]
    pub device_id: String,
}

impl Report {
    /// Derive a report from a fix and a device identifier.
    ///
    /// Speed is converted from m/s to km/h. An empty identifier is
    /// replaced with [`UNKNOWN_DEVICE_ID`]; this never fails.
    pub fn from_fix(fix: &LocationFix, device_id: &str) -> Self {
        let device_id = if device_id.is_empty() {
            UNKNOWN_DEVICE_ID.to_string()
        } else {
            device_id.to_string()
        };

        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            speed_kmh: fix.speed_mps * MPS_TO_KMH,
            device_id,
        }
    }

    /// Encode the report as the JSON text frame sent to the server.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(speed_mps: f64) -> LocationFix {
        LocationFix::new(-23.5505, -46.6333, 8.5, speed_mps)
    }

    #[test]
    fn test_speed_conversion() {
        let report = Report::from_fix(&fix(10.0), "abc123");
        assert!((report.speed_kmh - 36.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_speed() {
        let report = Report::from_fix(&fix(0.0), "abc123");
        assert_eq!(report.speed_kmh, 0.0);
    }

    #[test]
    fn test_empty_device_id_maps_to_sentinel() {
        let report = Report::from_fix(&fix(1.0), "");
        assert_eq!(report.device_id, UNKNOWN_DEVICE_ID);
    }

    #[test]
    fn test_wire_schema() {
        let report = Report {
            latitude: 1.5,
            longitude: -2.5,
            speed_kmh: 36.0,
            device_id: "abc123".to_string(),
        };
        let json = report.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"latitude":1.5,"longitude":-2.5,"speed":36.0,"imei":"abc123"}"#
        );
    }

    #[test]
    fn test_wire_schema_round_trip() {
        let json = r#"{"latitude":10.0,"longitude":20.0,"speed":5.0,"imei":"unknown"}"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.device_id, "unknown");
        assert_eq!(report.speed_kmh, 5.0);
    }

    #[test]
    fn test_accuracy_profile_default() {
        assert_eq!(AccuracyProfile::default(), AccuracyProfile::HighAccuracy);
    }
}
