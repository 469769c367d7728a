//! Device identity resolution.
//!
//! The server keys reports by a device identifier. The agent resolves
//! one from, in order: the configuration, the `GEOLINK_DEVICE_ID`
//! environment variable, the machine id, and finally the `"unknown"`
//! sentinel.

use std::path::Path;

use tracing::{debug, warn};

use geolink_types::UNKNOWN_DEVICE_ID;

/// Environment variable consulted when no identifier is configured.
pub const DEVICE_ID_ENV: &str = "GEOLINK_DEVICE_ID";

const MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Resolve the device identifier to report under.
///
/// Never fails; the sentinel is returned when nothing else is
/// available.
pub fn resolve_device_id(configured: Option<&str>) -> String {
    if let Some(id) = configured
        && !id.is_empty()
    {
        debug!(device_id = %id, "using configured device id");
        return id.to_string();
    }
    if let Ok(id) = std::env::var(DEVICE_ID_ENV)
        && !id.is_empty()
    {
        debug!(device_id = %id, "using device id from {}", DEVICE_ID_ENV);
        return id;
    }
    if let Some(id) = machine_id(Path::new(MACHINE_ID_PATH)) {
        debug!(device_id = %id, "using machine id");
        return id;
    }
    warn!("no device identifier available, reporting as '{UNKNOWN_DEVICE_ID}'");
    UNKNOWN_DEVICE_ID.to_string()
}

fn machine_id(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let id = raw.trim();
    (!id.is_empty()).then(|| id.to_string())
}
