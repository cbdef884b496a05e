//! # Platform-driver provider.
//!
//! [`SystemProvider`] adapts the host's [`PositionSource`] driver to the
//! provider contract. It is the default chain member: always constructible,
//! no connection concept, no health signals.
//!
//! Before every operation it consults the context's availability surface;
//! an ungranted capability or disabled source is reported through the
//! listener's failure channel and the operation does nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::LocationParams;
use crate::context::AppContext;
use crate::error::LocationError;
use crate::listeners::ListenerRef;
use crate::providers::provider::{LocationProvider, deliver, notify_failed};
use crate::reading::Reading;
use crate::sources::{PositionSource, UpdateRequest};
use crate::store::{ReadingStore, Store};

/// Cache identity for readings produced by the platform driver.
const SYSTEM_STORE_ID: &str = "SYS";

struct PumpHandle {
    token: CancellationToken,
    _join: JoinHandle<()>,
}

impl PumpHandle {
    fn cancel(&self) {
        self.token.cancel();
    }
}

#[derive(Default)]
struct SystemInner {
    ctx: Option<AppContext>,
    source: Option<Arc<dyn PositionSource>>,
    store: Option<Arc<ReadingStore>>,
    listener: Option<ListenerRef>,
    pump: Option<PumpHandle>,
}

/// Provider over the platform position driver.
#[derive(Default)]
pub struct SystemProvider {
    inner: Mutex<SystemInner>,
}

impl SystemProvider {
    /// Creates an unbound provider; `init` binds it to a context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the context's capability gates, reporting the first violation
    /// through the listener. Returns `true` when the operation may proceed.
    async fn gates_pass(ctx: &AppContext, listener: &Option<ListenerRef>) -> bool {
        let state = ctx.state();
        if !state.permission_granted() {
            debug!("permission check failed; handle the location permission");
            notify_failed(listener, LocationError::NoPermission).await;
            return false;
        }
        if !state.any_source_available() {
            debug!("no active location source is enabled");
            notify_failed(listener, LocationError::SourceDisabled).await;
            return false;
        }
        true
    }
}

#[async_trait]
impl LocationProvider for SystemProvider {
    async fn init(&self, ctx: &AppContext, cache_enabled: bool) {
        let mut inner = self.inner.lock().await;
        if ctx.position_source().is_none() {
            debug!("context provides no position driver");
        }
        inner.source = ctx.position_source();
        inner.ctx = Some(ctx.clone());
        inner.store = if cache_enabled {
            Some(Arc::new(ReadingStore::new(ctx.pref_table())))
        } else {
            None
        };
    }

    async fn start(&self, listener: Option<ListenerRef>, params: LocationParams, one_shot: bool) {
        let (ctx, source, store) = {
            let mut inner = self.inner.lock().await;
            if listener.is_none() {
                debug!("starting a system subscription without a listener");
            }
            inner.listener = listener.clone();
            let Some(ctx) = inner.ctx.clone() else {
                warn!("system provider started before init");
                return;
            };
            (ctx, inner.source.clone(), inner.store.clone())
        };

        if !Self::gates_pass(&ctx, &listener).await {
            return;
        }
        let Some(source) = source else {
            warn!("no position driver to subscribe against");
            notify_failed(&listener, LocationError::SourceDisabled).await;
            return;
        };

        let request = UpdateRequest { params, one_shot };
        match source.start_updates(request).await {
            Some(rx) => {
                let token = CancellationToken::new();
                let join = tokio::spawn(pump(rx, listener, store, one_shot, token.clone()));
                let mut inner = self.inner.lock().await;
                if let Some(old) = inner.pump.replace(PumpHandle { token, _join: join }) {
                    warn!("location updates already started; superseding previous subscription");
                    old.cancel();
                }
            }
            None => {
                error!("position driver rejected the subscription request");
                notify_failed(&listener, LocationError::SourceDisabled).await;
            }
        }
    }

    async fn stop(&self) {
        let (ctx, source, listener) = {
            let inner = self.inner.lock().await;
            (inner.ctx.clone(), inner.source.clone(), inner.listener.clone())
        };
        if let Some(ctx) = &ctx {
            if !Self::gates_pass(ctx, &listener).await {
                return;
            }
        }
        if let Some(pump) = self.inner.lock().await.pump.take() {
            pump.cancel();
        }
        if let Some(source) = source {
            source.stop_updates().await;
        }
    }

    async fn last_reading(&self) -> Option<Reading> {
        let (ctx, source, store, listener) = {
            let inner = self.inner.lock().await;
            (
                inner.ctx.clone(),
                inner.source.clone(),
                inner.store.clone(),
                inner.listener.clone(),
            )
        };
        let ctx = ctx?;
        if !Self::gates_pass(&ctx, &listener).await {
            return None;
        }
        if let Some(source) = &source {
            if let Some(fix) = source.current().await {
                return Some(fix);
            }
        }
        store.as_ref().and_then(|s| s.get(SYSTEM_STORE_ID))
    }
}

/// Forwards driver readings to the listener and the cache until the
/// subscription ends.
///
/// A one-shot subscription terminates after the first delivery; if the
/// driver closes the channel without delivering, the listener receives an
/// empty fix so the one-shot request still completes.
async fn pump(
    mut rx: mpsc::Receiver<Reading>,
    listener: Option<ListenerRef>,
    store: Option<Arc<ReadingStore>>,
    one_shot: bool,
    token: CancellationToken,
) {
    let mut delivered = false;
    loop {
        let reading = tokio::select! {
            _ = token.cancelled() => return,
            maybe = rx.recv() => match maybe {
                Some(reading) => reading,
                None => break,
            },
        };
        deliver(&listener, Some(reading.clone())).await;
        delivered = true;
        if let Some(store) = &store {
            store.put(SYSTEM_STORE_ID, &reading);
            debug!(source = %reading.source, "reading cached");
        }
        if one_shot {
            return;
        }
    }
    if one_shot && !delivered {
        deliver(&listener, None).await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::LocationError;
    use crate::listeners::UpdateListener;
    use crate::state::StaticProbe;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Listener that records everything it receives.
    #[derive(Default)]
    pub(crate) struct RecListener {
        pub updates: StdMutex<Vec<Option<Reading>>>,
        pub failures: StdMutex<Vec<LocationError>>,
    }

    impl RecListener {
        pub fn arc() -> Arc<Self> {
            Arc::new(Self::default())
        }
    }

    #[async_trait]
    impl UpdateListener for RecListener {
        async fn on_update(&self, reading: Option<Reading>) {
            self.updates.lock().unwrap().push(reading);
        }

        async fn on_failed(&self, error: LocationError) {
            self.failures.lock().unwrap().push(error);
        }
    }

    /// Driver that replays a fixed script of readings.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub script: StdMutex<Vec<Reading>>,
        pub current: StdMutex<Option<Reading>>,
        pub stops: AtomicUsize,
        pub requests: StdMutex<Vec<UpdateRequest>>,
    }

    impl FakeSource {
        pub fn with_script(readings: Vec<Reading>) -> Arc<Self> {
            let source = Self::default();
            *source.script.lock().unwrap() = readings;
            Arc::new(source)
        }
    }

    #[async_trait]
    impl PositionSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        async fn start_updates(&self, request: UpdateRequest) -> Option<mpsc::Receiver<Reading>> {
            self.requests.lock().unwrap().push(request);
            let script = self.script.lock().unwrap().clone();
            let (tx, rx) = mpsc::channel(script.len().max(1));
            for reading in script {
                tx.try_send(reading).expect("script fits channel");
            }
            Some(rx)
        }

        async fn stop_updates(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        async fn current(&self) -> Option<Reading> {
            self.current.lock().unwrap().clone()
        }
    }

    pub(crate) async fn wait_until(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn ctx_with(source: Arc<FakeSource>, probe: StaticProbe) -> AppContext {
        AppContext::builder()
            .probe(probe)
            .position_source(source)
            .build()
    }

    #[tokio::test]
    async fn test_denied_permission_reports_no_permission() {
        let source = FakeSource::with_script(vec![Reading::new("gps")]);
        let ctx = ctx_with(source, StaticProbe::new(false, true, &["gps"]));
        let listener = RecListener::arc();

        let provider = SystemProvider::new();
        provider.init(&ctx, false).await;
        provider
            .start(Some(listener.clone()), LocationParams::BEST_EFFORT, false)
            .await;

        assert_eq!(
            listener.failures.lock().unwrap().as_slice(),
            [LocationError::NoPermission]
        );
        assert!(listener.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_source_reports_source_disabled() {
        let source = FakeSource::with_script(vec![Reading::new("gps")]);
        let ctx = ctx_with(source, StaticProbe::new(true, true, &[]));
        let listener = RecListener::arc();

        let provider = SystemProvider::new();
        provider.init(&ctx, false).await;
        provider
            .start(Some(listener.clone()), LocationParams::BEST_EFFORT, false)
            .await;

        assert_eq!(
            listener.failures.lock().unwrap().as_slice(),
            [LocationError::SourceDisabled]
        );
    }

    #[tokio::test]
    async fn test_continuous_updates_reach_listener_and_cache() {
        let first = Reading::new("gps").with_latitude(1.0).with_longitude(2.0);
        let second = Reading::new("gps").with_latitude(3.0).with_longitude(4.0);
        let source = FakeSource::with_script(vec![first.clone(), second.clone()]);
        let ctx = ctx_with(source, StaticProbe::allow_all());
        let listener = RecListener::arc();

        let provider = SystemProvider::new();
        provider.init(&ctx, true).await;
        provider
            .start(Some(listener.clone()), LocationParams::NAVIGATION, false)
            .await;

        let l = listener.clone();
        wait_until(move || l.updates.lock().unwrap().len() == 2).await;
        assert_eq!(
            listener.updates.lock().unwrap().as_slice(),
            [Some(first), Some(second.clone())]
        );

        // The cache write lands right after delivery; poll for it.
        let store = ReadingStore::new(ctx.pref_table());
        let expected = second.clone();
        wait_until(move || store.get(SYSTEM_STORE_ID) == Some(expected.clone())).await;
    }

    #[tokio::test]
    async fn test_one_shot_delivers_exactly_once() {
        let readings = vec![
            Reading::new("gps").with_latitude(1.0),
            Reading::new("gps").with_latitude(2.0),
            Reading::new("gps").with_latitude(3.0),
        ];
        let source = FakeSource::with_script(readings);
        let ctx = ctx_with(source.clone(), StaticProbe::allow_all());
        let listener = RecListener::arc();

        let provider = SystemProvider::new();
        provider.init(&ctx, false).await;
        provider
            .start(Some(listener.clone()), LocationParams::NAVIGATION, true)
            .await;

        let l = listener.clone();
        wait_until(move || !l.updates.lock().unwrap().is_empty()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(listener.updates.lock().unwrap().len(), 1);

        let requests = source.requests.lock().unwrap();
        assert!(requests[0].one_shot);
    }

    #[tokio::test]
    async fn test_one_shot_with_empty_stream_reports_empty_fix() {
        let source = FakeSource::with_script(Vec::new());
        let ctx = ctx_with(source, StaticProbe::allow_all());
        let listener = RecListener::arc();

        let provider = SystemProvider::new();
        provider.init(&ctx, false).await;
        provider
            .start(Some(listener.clone()), LocationParams::NAVIGATION, true)
            .await;

        let l = listener.clone();
        wait_until(move || !l.updates.lock().unwrap().is_empty()).await;
        assert_eq!(listener.updates.lock().unwrap().as_slice(), [None]);
    }

    #[tokio::test]
    async fn test_stop_notifies_driver() {
        let source = FakeSource::with_script(vec![Reading::new("gps")]);
        let ctx = ctx_with(source.clone(), StaticProbe::allow_all());

        let provider = SystemProvider::new();
        provider.init(&ctx, false).await;
        provider
            .start(None, LocationParams::BEST_EFFORT, false)
            .await;
        provider.stop().await;

        assert_eq!(source.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_reading_prefers_live_fix() {
        let live = Reading::new("gps").with_latitude(9.0).with_longitude(9.0);
        let source = FakeSource::with_script(Vec::new());
        *source.current.lock().unwrap() = Some(live.clone());
        let ctx = ctx_with(source, StaticProbe::allow_all());

        let provider = SystemProvider::new();
        provider.init(&ctx, true).await;
        assert_eq!(provider.last_reading().await, Some(live));
    }

    #[tokio::test]
    async fn test_last_reading_falls_back_to_cache() {
        let cached = Reading::new("gps").with_latitude(5.0).with_longitude(6.0);
        let source = FakeSource::with_script(Vec::new());
        let ctx = ctx_with(source, StaticProbe::allow_all());
        ReadingStore::new(ctx.pref_table()).put(SYSTEM_STORE_ID, &cached);

        let provider = SystemProvider::new();
        provider.init(&ctx, true).await;
        assert_eq!(provider.last_reading().await, Some(cached));
    }

    #[tokio::test]
    async fn test_stop_before_start_is_safe() {
        let provider = SystemProvider::new();
        provider.stop().await;
        assert!(provider.last_reading().await.is_none());
    }
}
