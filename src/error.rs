//! Error types reported by location providers.
//!
//! [`LocationError`] covers the conditions a provider can hit while serving
//! a session:
//!
//! - [`LocationError::NoPermission`] — the capability was never granted.
//! - [`LocationError::SourceDisabled`] — the backing source is switched off.
//! - [`LocationError::NoActiveProvider`] — the fallback chain is exhausted.
//!
//! The first two are delivered to the session listener through
//! [`UpdateListener::on_failed`](crate::UpdateListener::on_failed) and are
//! recoverable: the user can grant the permission or enable the source and
//! retry. Chain exhaustion is terminal for a coordinator — it is logged once
//! and subsequent reads report absence instead of erroring.

use thiserror::Error;

/// # Errors surfaced by location providers.
///
/// Providers never panic on these; they report them per attempted operation
/// (`start`/`stop`/`last_reading`) through the listener's failure channel.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    /// The location capability has not been granted to the host application.
    #[error("location permission not granted")]
    NoPermission,

    /// Location sources are disabled for the device or the named source is off.
    #[error("location source not enabled")]
    SourceDisabled,

    /// The fallback chain has been exhausted; nothing is left to try.
    #[error("no active provider remains in the fallback chain")]
    NoActiveProvider,
}

impl LocationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use geovisor::LocationError;
    ///
    /// assert_eq!(LocationError::NoPermission.as_label(), "no_permission");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LocationError::NoPermission => "no_permission",
            LocationError::SourceDisabled => "source_disabled",
            LocationError::NoActiveProvider => "no_active_provider",
        }
    }

    /// Indicates whether the caller may remedy the condition and retry.
    ///
    /// Returns `true` for [`LocationError::NoPermission`] and
    /// [`LocationError::SourceDisabled`]; chain exhaustion is permanent for
    /// the coordinator that reports it.
    ///
    /// # Example
    /// ```
    /// use geovisor::LocationError;
    ///
    /// assert!(LocationError::SourceDisabled.is_recoverable());
    /// assert!(!LocationError::NoActiveProvider.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LocationError::NoPermission | LocationError::SourceDisabled
        )
    }
}
