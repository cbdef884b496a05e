//! # Availability query surface.
//!
//! The engine never inspects platform settings itself; it consumes a
//! [`SourceProbe`] — the host's capability query interface — and wraps it in
//! [`SourceState`], the read-only helper surface sessions expose through
//! [`Session::state`](crate::Session::state).
//!
//! One `SourceState` exists per [`AppContext`](crate::AppContext): it is
//! constructed lazily on the first query and reused for the context's
//! lifetime, never rebuilt.

use std::sync::Arc;

/// Well-known source name: satellite positioning.
pub const SOURCE_GPS: &str = "gps";
/// Well-known source name: network (cell/wifi) positioning.
pub const SOURCE_NETWORK: &str = "network";
/// Well-known source name: passive updates produced for other consumers.
pub const SOURCE_PASSIVE: &str = "passive";

/// Capability query interface supplied by the host.
///
/// All queries are read-only and expected to be cheap; the engine calls them
/// on the control path before subscribing to a driver.
pub trait SourceProbe: Send + Sync + 'static {
    /// Whether the location capability has been granted to the application.
    fn permission_granted(&self) -> bool;

    /// Whether location services are globally enabled on the device.
    fn location_services_enabled(&self) -> bool;

    /// Whether the given named source (`"gps"`, `"network"`, `"passive"`) is
    /// enabled.
    fn source_enabled(&self, source: &str) -> bool;
}

/// Fixed-answer probe, the default for hosts without capability gating and
/// the workhorse for tests.
///
/// # Example
/// ```
/// use geovisor::{SourceProbe, StaticProbe};
///
/// let probe = StaticProbe::allow_all();
/// assert!(probe.permission_granted());
///
/// let denied = StaticProbe::new(false, true, &["gps"]);
/// assert!(!denied.permission_granted());
/// assert!(denied.source_enabled("gps"));
/// assert!(!denied.source_enabled("network"));
/// ```
#[derive(Debug, Clone)]
pub struct StaticProbe {
    permission: bool,
    services: bool,
    sources: Vec<String>,
}

impl StaticProbe {
    /// Creates a probe with explicit answers and an enabled-source list.
    pub fn new(permission: bool, services: bool, sources: &[&str]) -> Self {
        Self {
            permission,
            services,
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Probe that grants everything and enables every source.
    pub fn allow_all() -> Self {
        Self::new(true, true, &[SOURCE_GPS, SOURCE_NETWORK, SOURCE_PASSIVE])
    }

    /// Probe that denies everything.
    pub fn deny_all() -> Self {
        Self::new(false, false, &[])
    }
}

impl SourceProbe for StaticProbe {
    fn permission_granted(&self) -> bool {
        self.permission
    }

    fn location_services_enabled(&self) -> bool {
        self.services
    }

    fn source_enabled(&self, source: &str) -> bool {
        self.sources.iter().any(|s| s == source)
    }
}

/// Read-only availability surface over the host's [`SourceProbe`].
pub struct SourceState {
    probe: Arc<dyn SourceProbe>,
}

impl SourceState {
    pub(crate) fn new(probe: Arc<dyn SourceProbe>) -> Self {
        Self { probe }
    }

    /// Indicates if the location capability has been granted.
    pub fn permission_granted(&self) -> bool {
        self.probe.permission_granted()
    }

    /// Indicates if location services are enabled for the device.
    pub fn location_services_enabled(&self) -> bool {
        self.probe.location_services_enabled()
    }

    /// Indicates if any *active* source (satellite or network) is enabled.
    pub fn any_source_available(&self) -> bool {
        self.gps_available() || self.network_available()
    }

    /// Indicates if satellite positioning is enabled.
    pub fn gps_available(&self) -> bool {
        self.probe.source_enabled(SOURCE_GPS)
    }

    /// Indicates if network positioning is enabled.
    pub fn network_available(&self) -> bool {
        self.probe.source_enabled(SOURCE_NETWORK)
    }

    /// Indicates if the passive source is enabled.
    pub fn passive_available(&self) -> bool {
        self.probe.source_enabled(SOURCE_PASSIVE)
    }

    /// Indicates if the given named source is enabled.
    pub fn source_enabled(&self, source: &str) -> bool {
        self.probe.source_enabled(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_source_ignores_passive() {
        let state = SourceState::new(Arc::new(StaticProbe::new(
            true,
            true,
            &[SOURCE_PASSIVE],
        )));
        assert!(state.passive_available());
        assert!(!state.any_source_available());
    }

    #[test]
    fn test_named_source_query() {
        let state = SourceState::new(Arc::new(StaticProbe::new(
            true,
            true,
            &[SOURCE_NETWORK],
        )));
        assert!(state.source_enabled(SOURCE_NETWORK));
        assert!(!state.source_enabled(SOURCE_GPS));
    }
}
