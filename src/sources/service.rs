//! # Connectable service driver seam.
//!
//! [`ServiceSource`] is the handle to a push-based geolocation service that
//! has a connection concept (a vendor client, a remote daemon). Unlike
//! [`PositionSource`](crate::PositionSource), a request against it can fail
//! with a [`ServiceFault`] — the trigger for the health-signal path that
//! drives fallback.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::reading::Reading;
use crate::sources::UpdateRequest;

/// Failure of a service-backed subscription request.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ServiceFault {
    /// The service is not reachable (missing runtime, bad credentials).
    #[error("service unavailable: {reason}")]
    Unavailable {
        /// Driver-supplied detail.
        reason: String,
    },

    /// The service rejected the subscription request.
    #[error("service rejected request: {reason}")]
    Rejected {
        /// Driver-supplied detail.
        reason: String,
    },
}

/// # Push-based geolocation service driver.
///
/// The same callback-driven shape as [`PositionSource`](crate::PositionSource),
/// but request failures are explicit so the provider can raise health
/// signals. A driver must fail a request with exactly one fault; it must not
/// return an empty channel to signal an error.
#[async_trait]
pub trait ServiceSource: Send + Sync + 'static {
    /// Returns a stable, human-readable service name.
    fn name(&self) -> &str;

    /// Issues a subscription request against the backing service.
    ///
    /// Returns the reading channel, or the fault that prevented the
    /// subscription. Must not block waiting for the first fix.
    async fn request_updates(
        &self,
        request: UpdateRequest,
    ) -> Result<mpsc::Receiver<Reading>, ServiceFault>;

    /// Removes the active subscription, if any. Must be idempotent.
    async fn remove_updates(&self);
}
