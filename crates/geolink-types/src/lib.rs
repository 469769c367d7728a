//! Platform-agnostic types for the GeoLink location reporter.
//!
//! This crate provides the shared data types used by the reporting
//! pipeline (`geolink-core`) and by platform integrations that supply
//! location fixes.
//!
//! # Example
//!
//! ```
//! use geolink_types::{LocationFix, Report};
//!
//! let fix = LocationFix::new(-23.5505, -46.6333, 12.0, 10.0);
//! let report = Report::from_fix(&fix, "device-1234");
//! assert_eq!(report.speed_kmh, 36.0);
//! ```

pub mod types;

pub use types::{AccuracyProfile, FixRequest, LocationFix, Report, UNKNOWN_DEVICE_ID};
