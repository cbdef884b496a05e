//! # Session controller: the user-facing entry point.
//!
//! [`Locator`] binds one provider per host context and hands out [`Session`]
//! handles with a fluent configuration surface. The binding table is
//! process-wide: the first `location` call for a context wins, later calls
//! reuse the existing binding, and [`Session::stop`] releases it so a later
//! call constructs a fresh one. Contexts are held weakly — a dropped
//! context's entry is pruned on the next table access.
//!
//! ## Example
//! ```no_run
//! use geovisor::{AppContext, ListenerFn, LocationParams, Locator};
//!
//! # async fn run() {
//! let ctx = AppContext::builder().data_dir("/var/lib/app").build();
//! let session = Locator::with(ctx)
//!     .location()
//!     .await
//!     .config(LocationParams::NAVIGATION)
//!     .one_shot();
//!
//! session
//!     .start(ListenerFn::arc(|outcome| async move {
//!         println!("{outcome:?}");
//!     }))
//!     .await;
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError, Weak};

use tracing::debug;

use crate::config::LocationParams;
use crate::context::{AppContext, ContextId, ContextInner};
use crate::listeners::ListenerRef;
use crate::providers::{FallbackBuilder, LocationProvider, ProviderRef};
use crate::reading::Reading;
use crate::state::SourceState;
use crate::store::ReadingStore;

struct Binding {
    ctx: Weak<ContextInner>,
    provider: ProviderRef,
}

/// Process-wide context binding table.
fn bindings() -> &'static Mutex<HashMap<ContextId, Binding>> {
    static BINDINGS: OnceLock<Mutex<HashMap<ContextId, Binding>>> = OnceLock::new();
    BINDINGS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Binds `provider` to the context unless a binding already exists; either
/// way returns the bound provider. Dead-context entries are pruned first.
fn bind(ctx: &AppContext, provider: ProviderRef) -> ProviderRef {
    let mut map = bindings().lock().unwrap_or_else(PoisonError::into_inner);
    map.retain(|_, binding| binding.ctx.strong_count() > 0);
    map.entry(ctx.id())
        .or_insert_with(|| Binding {
            ctx: ctx.downgrade(),
            provider,
        })
        .provider
        .clone()
}

fn unbind(id: ContextId) {
    let mut map = bindings().lock().unwrap_or_else(PoisonError::into_inner);
    if map.remove(&id).is_some() {
        debug!(?id, "context binding released");
    }
}

/// Entry point for obtaining location sessions.
pub struct Locator {
    ctx: AppContext,
    cache_enabled: bool,
    default_initialize: bool,
}

impl Locator {
    /// Creates a locator with caching and auto-initialization enabled.
    pub fn with(ctx: AppContext) -> Self {
        Self::new(ctx, true, true)
    }

    /// Creates a locator with explicit settings.
    ///
    /// With `default_initialize = false` the caller initializes the bound
    /// provider itself before starting the session.
    pub fn new(ctx: AppContext, cache_enabled: bool, default_initialize: bool) -> Self {
        Self {
            ctx,
            cache_enabled,
            default_initialize,
        }
    }

    /// Opens a session against the default provider: a fallback chain that
    /// prefers the push service and falls back to the platform driver.
    pub async fn location(&self) -> Session {
        let provider = FallbackBuilder::new()
            .with_push_provider()
            .with_system_provider()
            .build();
        self.location_with(provider).await
    }

    /// Opens a session against the given provider.
    ///
    /// The first call for a context binds its provider; subsequent calls
    /// for the same context reuse the existing binding and ignore the
    /// argument.
    pub async fn location_with(&self, provider: ProviderRef) -> Session {
        let bound = bind(&self.ctx, provider);
        if self.default_initialize {
            bound.init(&self.ctx, self.cache_enabled).await;
        }
        Session {
            ctx: self.ctx.clone(),
            provider: Some(bound),
            params: LocationParams::BEST_EFFORT,
            one_shot: false,
            cache_enabled: self.cache_enabled,
        }
    }
}

/// One configured location session against a bound provider.
pub struct Session {
    ctx: AppContext,
    provider: Option<ProviderRef>,
    params: LocationParams,
    one_shot: bool,
    cache_enabled: bool,
}

impl Session {
    /// Sets the update configuration. Defaults to
    /// [`LocationParams::BEST_EFFORT`].
    pub fn config(mut self, params: LocationParams) -> Self {
        self.params = params;
        self
    }

    /// Requests exactly one reading, then the subscription auto-terminates.
    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    /// Requests continuous delivery (the default).
    pub fn continuous(mut self) -> Self {
        self.one_shot = false;
        self
    }

    /// Returns the availability surface for this session's context.
    pub fn state(&self) -> std::sync::Arc<SourceState> {
        self.ctx.state()
    }

    /// Returns the most recent known reading from the bound provider.
    pub async fn last_reading(&self) -> Option<Reading> {
        match &self.provider {
            Some(provider) => provider.last_reading().await,
            None => None,
        }
    }

    /// Starts delivery to the given listener.
    ///
    /// Runtime conditions (missing grant, disabled source) are reported to
    /// the listener, never panicked on.
    ///
    /// # Panics
    /// Panics if no provider is bound — starting an unconfigured session is
    /// a programmer error, unlike the recoverable runtime failures above.
    pub async fn start(&self, listener: ListenerRef) {
        let Some(provider) = &self.provider else {
            panic!("a location provider must be bound before start");
        };
        provider.start(Some(listener), self.params, self.one_shot).await;
    }

    /// Stops delivery, clears this context's cached readings, and releases
    /// the context binding so a later `location` call binds afresh.
    pub async fn stop(&self) {
        if let Some(provider) = &self.provider {
            provider.stop().await;
        }
        if self.cache_enabled {
            ReadingStore::new(self.ctx.pref_table()).clear();
        }
        unbind(self.ctx.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fallback::tests::{MockProvider, noop_listener, provider_ref};
    use crate::providers::push::tests::FakeService;
    use crate::providers::system::tests::{FakeSource, RecListener, wait_until};
    use crate::state::StaticProbe;
    use crate::store::Store;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_same_context_reuses_binding() {
        let ctx = AppContext::builder().build();
        let locator = Locator::with(ctx);
        let (a, b) = (MockProvider::arc(), MockProvider::arc());

        let _first = locator.location_with(provider_ref(&a)).await;
        let _second = locator.location_with(provider_ref(&b)).await;

        assert_eq!(a.init_calls.load(Ordering::SeqCst), 2);
        assert_eq!(b.init_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_releases_binding_for_fresh_construction() {
        let ctx = AppContext::builder().build();
        let locator = Locator::with(ctx);
        let (a, b) = (MockProvider::arc(), MockProvider::arc());

        let session = locator.location_with(provider_ref(&a)).await;
        session.stop().await;
        let _fresh = locator.location_with(provider_ref(&b)).await;

        assert_eq!(a.stop_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_forwards_recorded_configuration() {
        let ctx = AppContext::builder().build();
        let locator = Locator::with(ctx);
        let provider = MockProvider::arc();

        let session = locator
            .location_with(provider_ref(&provider))
            .await
            .config(LocationParams::LAZY)
            .one_shot();
        session.start(noop_listener()).await;

        let starts = provider.starts.lock().unwrap();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].params, LocationParams::LAZY);
        assert!(starts[0].one_shot);
        assert!(starts[0].listener.is_some());
    }

    #[tokio::test]
    async fn test_stop_clears_cached_readings() {
        let ctx = AppContext::builder().build();
        let store = ReadingStore::new(ctx.pref_table());
        store.put("SYS", &Reading::new("gps").with_latitude(1.0).with_longitude(2.0));

        let locator = Locator::with(ctx.clone());
        let session = locator.location_with(provider_ref(&MockProvider::arc())).await;
        session.stop().await;

        assert_eq!(store.get("SYS"), None);
    }

    #[tokio::test]
    async fn test_default_chain_fails_over_to_platform_driver() {
        let fix = Reading::new("gps").with_latitude(52.52).with_longitude(13.405);
        let ctx = AppContext::builder()
            .probe(StaticProbe::allow_all())
            .service_source(FakeService::rejecting())
            .position_source(FakeSource::with_script(vec![fix.clone()]))
            .build();

        let listener = RecListener::arc();
        let session = Locator::with(ctx).location().await;
        session.start(listener.clone()).await;

        // The push service rejects the subscription, its failure signal
        // drives the fallback, and the platform driver serves the session.
        let l = listener.clone();
        wait_until(move || !l.updates.lock().unwrap().is_empty()).await;
        assert_eq!(
            listener.updates.lock().unwrap().as_slice(),
            [Some(fix.clone())]
        );

        // The cache write lands right after delivery; poll for it.
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while session.last_reading().await != Some(fix.clone()) {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("cached reading not visible in time");

        session.stop().await;
    }

    #[tokio::test]
    async fn test_state_surface_reflects_probe() {
        let ctx = AppContext::builder()
            .probe(StaticProbe::new(true, false, &[]))
            .build();
        let session = Locator::with(ctx)
            .location_with(provider_ref(&MockProvider::arc()))
            .await;

        assert!(!session.state().location_services_enabled());
        assert!(session.state().permission_granted());
        session.stop().await;
    }
}
