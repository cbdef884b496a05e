//! # Provider capability contract.
//!
//! [`LocationProvider`] is the interface every backend source implements:
//! initialize against a context, start continuous or one-shot delivery,
//! stop, and fetch the last cached reading. The fallback coordinator
//! implements the same contract, so callers are fallback-agnostic.
//!
//! The common handle type is [`ProviderRef`], an `Arc<dyn LocationProvider>`
//! suitable for sharing across the engine.

use async_trait::async_trait;
use futures::FutureExt;
use tracing::warn;

use crate::config::LocationParams;
use crate::context::AppContext;
use crate::error::LocationError;
use crate::listeners::ListenerRef;
use crate::reading::Reading;

/// Shared handle to a provider object.
pub type ProviderRef = std::sync::Arc<dyn LocationProvider>;

/// # Backend source of positional readings.
///
/// ## Rules
/// - `init` must be safe to call more than once; double-starting an already
///   running subscription without an intervening `stop` is a logic error the
///   implementation logs, never a panic.
/// - `start` with `one_shot = true` requests exactly one delivery, then the
///   subscription auto-terminates; with `one_shot = false` delivery is
///   continuous and honors the configuration's interval/distance gates.
/// - Unsatisfied preconditions (capability not granted, source disabled)
///   are reported through the listener's failure channel, never as a silent
///   absent reading.
/// - `start`/`stop` return as soon as the subscription request is issued;
///   delivery is fully callback-driven.
#[async_trait]
pub trait LocationProvider: Send + Sync + 'static {
    /// Binds the provider to its host context and cache setting.
    async fn init(&self, ctx: &AppContext, cache_enabled: bool);

    /// Issues a subscription with the given configuration.
    async fn start(&self, listener: Option<ListenerRef>, params: LocationParams, one_shot: bool);

    /// Tears down the active subscription. Unconditional and safe to call
    /// even if nothing was ever started.
    async fn stop(&self);

    /// Returns the most recent known reading, live or cached.
    async fn last_reading(&self) -> Option<Reading>;
}

/// Delivers a reading to the listener, isolating listener panics so a
/// misbehaving callback cannot kill the delivery pump.
pub(crate) async fn deliver(listener: &Option<ListenerRef>, reading: Option<Reading>) {
    let Some(listener) = listener else {
        return;
    };
    let fut = listener.on_update(reading);
    if std::panic::AssertUnwindSafe(fut).catch_unwind().await.is_err() {
        warn!("update listener panicked; dropping callback");
    }
}

/// Reports a failure through the listener's failure channel, if one is
/// registered.
pub(crate) async fn notify_failed(listener: &Option<ListenerRef>, error: LocationError) {
    let Some(listener) = listener else {
        return;
    };
    let fut = listener.on_failed(error);
    if std::panic::AssertUnwindSafe(fut).catch_unwind().await.is_err() {
        warn!("update listener panicked; dropping failure report");
    }
}
