//! # Update request configuration.
//!
//! [`LocationParams`] bundles the three knobs a session hands to its
//! provider: an [`Accuracy`] tier, a minimum update interval, and a minimum
//! update distance. The value is immutable; build custom ones with
//! [`LocationParams::builder`] or pick a preset:
//!
//! - [`LocationParams::NAVIGATION`] — high accuracy, 500 ms, 0 m
//! - [`LocationParams::BEST_EFFORT`] — medium accuracy, 2500 ms, 150 m
//! - [`LocationParams::LAZY`] — low accuracy, 5000 ms, 500 m
//!
//! Interval and distance are the only power/accuracy trade-off the engine
//! knows about; there is no timeout concept.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use geovisor::{Accuracy, LocationParams};
//!
//! let params = LocationParams::builder()
//!     .accuracy(Accuracy::High)
//!     .interval(Duration::from_millis(1000))
//!     .distance(25.0)
//!     .build();
//!
//! assert_eq!(params.accuracy(), Accuracy::High);
//! assert_ne!(params, LocationParams::NAVIGATION);
//! ```

use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Requested positioning accuracy tier.
///
/// Drivers translate the tier into whatever their platform understands
/// (fine/coarse criteria, priority constants, power budgets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accuracy {
    /// Best available fix, highest power draw.
    High,
    /// Balanced power and accuracy (default).
    Medium,
    /// Coarse fixes, low power.
    Low,
    /// Passive-only: whatever other consumers already produce.
    Lowest,
}

/// Immutable update request configuration.
///
/// Equality and hashing are structural over the three fields; `distance`
/// participates by bit pattern so params are usable as map keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationParams {
    accuracy: Accuracy,
    interval: Duration,
    distance: f32,
}

impl LocationParams {
    /// Turn-by-turn preset: high accuracy, 500 ms interval, no distance gate.
    pub const NAVIGATION: LocationParams = LocationParams {
        accuracy: Accuracy::High,
        interval: Duration::from_millis(500),
        distance: 0.0,
    };

    /// Balanced preset: medium accuracy, 2500 ms interval, 150 m distance.
    pub const BEST_EFFORT: LocationParams = LocationParams {
        accuracy: Accuracy::Medium,
        interval: Duration::from_millis(2500),
        distance: 150.0,
    };

    /// Power-saving preset: low accuracy, 5000 ms interval, 500 m distance.
    pub const LAZY: LocationParams = LocationParams {
        accuracy: Accuracy::Low,
        interval: Duration::from_millis(5000),
        distance: 500.0,
    };

    /// Starts building a custom configuration.
    pub fn builder() -> LocationParamsBuilder {
        LocationParamsBuilder::default()
    }

    /// Returns the requested accuracy tier.
    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }

    /// Returns the minimum interval between updates.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the minimum distance between updates, in meters.
    pub fn distance(&self) -> f32 {
        self.distance
    }
}

impl Eq for LocationParams {}

impl Hash for LocationParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.accuracy.hash(state);
        self.interval.hash(state);
        self.distance.to_bits().hash(state);
    }
}

/// Staged construction for [`LocationParams`].
///
/// Defaults: medium accuracy, zero interval, zero distance.
#[derive(Debug, Clone)]
pub struct LocationParamsBuilder {
    accuracy: Accuracy,
    interval: Duration,
    distance: f32,
}

impl Default for LocationParamsBuilder {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::Medium,
            interval: Duration::ZERO,
            distance: 0.0,
        }
    }
}

impl LocationParamsBuilder {
    /// Sets the accuracy tier.
    pub fn accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets the minimum interval between updates.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the minimum distance between updates, in meters.
    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    /// Builds the immutable configuration value.
    pub fn build(self) -> LocationParams {
        LocationParams {
            accuracy: self.accuracy,
            interval: self.interval,
            distance: self.distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(params: &LocationParams) -> u64 {
        let mut h = DefaultHasher::new();
        params.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_presets() {
        assert_eq!(LocationParams::NAVIGATION.accuracy(), Accuracy::High);
        assert_eq!(
            LocationParams::NAVIGATION.interval(),
            Duration::from_millis(500)
        );
        assert_eq!(LocationParams::NAVIGATION.distance(), 0.0);

        assert_eq!(LocationParams::BEST_EFFORT.accuracy(), Accuracy::Medium);
        assert_eq!(
            LocationParams::BEST_EFFORT.interval(),
            Duration::from_millis(2500)
        );
        assert_eq!(LocationParams::BEST_EFFORT.distance(), 150.0);

        assert_eq!(LocationParams::LAZY.accuracy(), Accuracy::Low);
        assert_eq!(
            LocationParams::LAZY.interval(),
            Duration::from_millis(5000)
        );
        assert_eq!(LocationParams::LAZY.distance(), 500.0);
    }

    #[test]
    fn test_builder_defaults() {
        let params = LocationParams::builder().build();
        assert_eq!(params.accuracy(), Accuracy::Medium);
        assert_eq!(params.interval(), Duration::ZERO);
        assert_eq!(params.distance(), 0.0);
    }

    #[test]
    fn test_structural_equality() {
        let a = LocationParams::builder()
            .accuracy(Accuracy::Low)
            .interval(Duration::from_millis(5000))
            .distance(500.0)
            .build();
        assert_eq!(a, LocationParams::LAZY);
        assert_eq!(hash_of(&a), hash_of(&LocationParams::LAZY));
    }

    #[test]
    fn test_distance_distinguishes() {
        let a = LocationParams::builder().distance(1.0).build();
        let b = LocationParams::builder().distance(2.0).build();
        assert_ne!(a, b);
        assert_ne!(hash_of(&a), hash_of(&b));
    }
}
