//! # Positional reading snapshot.
//!
//! A [`Reading`] is an immutable fix produced by a provider: coordinates,
//! quality metadata, and a wall-clock timestamp. Readings are plain values —
//! providers hand them to the listener and the cache, and nobody owns one
//! beyond the scope of a callback or a cache slot.

use std::sync::Arc;

/// A single positional fix.
///
/// Built in the `new(..).with_*(..)` style:
///
/// ```
/// use geovisor::Reading;
///
/// let fix = Reading::new("gps")
///     .with_latitude(37.4219999)
///     .with_longitude(-122.0840575)
///     .with_accuracy(5.0)
///     .with_time(1_690_000_000_000);
///
/// assert_eq!(fix.source.as_ref(), "gps");
/// assert_eq!(fix.latitude, 37.4219999);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Identifier of the source that produced the fix.
    pub source: Arc<str>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Estimated horizontal accuracy radius, in meters.
    pub accuracy: f32,
    /// Altitude above the reference ellipsoid, in meters.
    pub altitude: f64,
    /// Ground speed, in meters per second.
    pub speed: f32,
    /// Bearing, in degrees clockwise from north.
    pub bearing: f32,
    /// Wall-clock timestamp of the fix, in milliseconds.
    pub time: i64,
}

impl Reading {
    /// Creates a zeroed reading attributed to the given source.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            latitude: 0.0,
            longitude: 0.0,
            accuracy: 0.0,
            altitude: 0.0,
            speed: 0.0,
            bearing: 0.0,
            time: 0,
        }
    }

    /// Sets the latitude, in degrees.
    #[inline]
    pub fn with_latitude(mut self, latitude: f64) -> Self {
        self.latitude = latitude;
        self
    }

    /// Sets the longitude, in degrees.
    #[inline]
    pub fn with_longitude(mut self, longitude: f64) -> Self {
        self.longitude = longitude;
        self
    }

    /// Sets the horizontal accuracy radius, in meters.
    #[inline]
    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets the altitude, in meters.
    #[inline]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// Sets the ground speed, in meters per second.
    #[inline]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the bearing, in degrees.
    #[inline]
    pub fn with_bearing(mut self, bearing: f32) -> Self {
        self.bearing = bearing;
        self
    }

    /// Sets the wall-clock timestamp, in milliseconds.
    #[inline]
    pub fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }
}
