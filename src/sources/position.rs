//! # Platform position driver seam.
//!
//! [`PositionSource`] is the opaque handle to whatever actually produces
//! fixes on the platform (a GPS/network stack, a simulator, a replay file).
//! The engine never performs sensor I/O itself — it subscribes, pumps the
//! returned channel, and unsubscribes. Drivers receive the full
//! [`UpdateRequest`] and interpret the accuracy tier, interval, and distance
//! thresholds themselves.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::LocationParams;
use crate::reading::Reading;

/// Parameters of one subscription request, as handed to a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdateRequest {
    /// Accuracy / interval / distance configuration.
    pub params: LocationParams,
    /// Request exactly one delivery, then terminate the subscription.
    pub one_shot: bool,
}

/// # Platform driver producing positional readings.
///
/// Delivery is callback-driven: [`start_updates`](PositionSource::start_updates)
/// returns immediately with a channel the driver feeds until the
/// subscription ends. The engine pumps that channel; it never polls.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio::sync::mpsc;
/// use geovisor::{PositionSource, Reading, UpdateRequest};
///
/// struct Replay;
///
/// #[async_trait]
/// impl PositionSource for Replay {
///     fn name(&self) -> &str { "replay" }
///
///     async fn start_updates(&self, _request: UpdateRequest) -> Option<mpsc::Receiver<Reading>> {
///         let (tx, rx) = mpsc::channel(8);
///         tokio::spawn(async move {
///             let _ = tx.send(Reading::new("replay").with_latitude(1.0)).await;
///         });
///         Some(rx)
///     }
///
///     async fn stop_updates(&self) {}
///
///     async fn current(&self) -> Option<Reading> { None }
/// }
/// ```
#[async_trait]
pub trait PositionSource: Send + Sync + 'static {
    /// Returns a stable, human-readable driver name.
    fn name(&self) -> &str;

    /// Issues a subscription request.
    ///
    /// Returns the reading channel, or `None` when the driver cannot serve
    /// the request at all (no hardware, not supported). The call must not
    /// block waiting for the first fix.
    async fn start_updates(&self, request: UpdateRequest) -> Option<mpsc::Receiver<Reading>>;

    /// Tears down the active subscription, if any. Must be idempotent.
    async fn stop_updates(&self);

    /// Returns the driver's own most recent fix, if it keeps one.
    async fn current(&self) -> Option<Reading>;
}
