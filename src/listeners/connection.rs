//! # Health-signal contract for service-backed providers.
//!
//! Providers whose backing service has a connection concept report its
//! health through a [`ConnectionListener`]: exactly one event per connection
//! attempt outcome. `connected` is informational; `suspended` and `failed`
//! are the triggers the fallback machinery reacts to. Local-only providers
//! never emit these.

use async_trait::async_trait;

/// Shared handle to a connection listener.
pub type ConnectionListenerRef = std::sync::Arc<dyn ConnectionListener>;

/// # Receiver of service connection events.
///
/// Implementations must not assume a delivery thread; events arrive
/// asynchronously whenever the backing service reports them. A `connected`
/// event is never emitted twice without an intervening suspend or failure.
#[async_trait]
pub trait ConnectionListener: Send + Sync + 'static {
    /// The connection to the backing service was established.
    async fn on_connected(&self);

    /// The connection was interrupted (network failure, temporary outage).
    async fn on_suspended(&self);

    /// The connection attempt failed (missing runtime, bad credentials).
    async fn on_failed(&self);
}
