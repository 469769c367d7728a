//! Accuracy-driven profile selection.
//!
//! Each incoming fix carries an accuracy estimate; the controller maps
//! it to the request profile the fix source should use for the next
//! cycle. Fixes worse than the threshold downgrade the source to the
//! balanced-power profile until accuracy recovers.

use geolink_types::{AccuracyProfile, LocationFix};

/// Selects the next request profile from the latest fix's accuracy.
///
/// [`next_profile`](AccuracyController::next_profile) is a pure
/// function of the fix and the configured threshold; the controller
/// holds no other state.
#[derive(Debug, Clone, Copy)]
pub struct AccuracyController {
    threshold_m: f32,
}

impl AccuracyController {
    /// Create a controller with the given accuracy threshold in meters.
    pub fn new(threshold_m: f32) -> Self {
        Self { threshold_m }
    }

    /// The configured threshold in meters.
    pub fn threshold_m(&self) -> f32 {
        self.threshold_m
    }

    /// Profile to request for the fix after this one.
    ///
    /// Accuracy numerically greater than the threshold (a *worse* fix)
    /// selects [`AccuracyProfile::BalancedPower`]; accuracy at or
    /// better than the threshold selects
    /// [`AccuracyProfile::HighAccuracy`].
    pub fn next_profile(&self, fix: &LocationFix) -> AccuracyProfile {
        if fix.accuracy_m > self.threshold_m {
            AccuracyProfile::BalancedPower
        } else {
            AccuracyProfile::HighAccuracy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix_with_accuracy(accuracy_m: f32) -> LocationFix {
        LocationFix::new(0.0, 0.0, accuracy_m, 0.0)
    }

    #[test]
    fn test_accuracy_at_threshold_stays_high() {
        let controller = AccuracyController::new(50.0);
        assert_eq!(
            controller.next_profile(&fix_with_accuracy(50.0)),
            AccuracyProfile::HighAccuracy
        );
    }

    #[test]
    fn test_accuracy_above_threshold_downgrades() {
        let controller = AccuracyController::new(50.0);
        assert_eq!(
            controller.next_profile(&fix_with_accuracy(50.1)),
            AccuracyProfile::BalancedPower
        );
    }

    #[test]
    fn test_good_accuracy_selects_high() {
        let controller = AccuracyController::new(50.0);
        assert_eq!(
            controller.next_profile(&fix_with_accuracy(10.0)),
            AccuracyProfile::HighAccuracy
        );
    }

    #[test]
    fn test_custom_threshold() {
        let controller = AccuracyController::new(20.0);
        assert_eq!(
            controller.next_profile(&fix_with_accuracy(30.0)),
            AccuracyProfile::BalancedPower
        );
        assert_eq!(
            controller.next_profile(&fix_with_accuracy(15.0)),
            AccuracyProfile::HighAccuracy
        );
    }
}
