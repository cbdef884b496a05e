//! # Service-backed provider extension.
//!
//! [`ServiceProvider`] extends the provider contract for sources that sit on
//! a connectable third-party service. Such providers own a
//! [`ConnectionListener`](crate::ConnectionListener) slot; the fallback
//! builder wraps whatever is registered there in a relay so connection
//! failures advance the chain.

use crate::listeners::ConnectionListenerRef;
use crate::providers::LocationProvider;

/// Shared handle to a service-backed provider.
pub type ServiceProviderRef = std::sync::Arc<dyn ServiceProvider>;

/// # Provider backed by a connectable service.
///
/// Implementations must invoke the registered listener's events when the
/// connection to the backing service succeeds, is interrupted, or fails —
/// exactly one event per connection attempt outcome.
pub trait ServiceProvider: LocationProvider {
    /// Returns the currently registered connection listener, if any.
    fn connection_listener(&self) -> Option<ConnectionListenerRef>;

    /// Registers the listener used for callbacks from the backing service.
    ///
    /// Replaces any previously registered listener; decorators capture the
    /// previous one and forward to it.
    fn set_connection_listener(&self, listener: ConnectionListenerRef);
}
