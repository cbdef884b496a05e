//! # Connectable-service provider.
//!
//! [`PushProvider`] adapts a push-based geolocation service — the context's
//! [`ServiceSource`] driver — to the provider contract. It is the canonical
//! [`ServiceProvider`]: connection outcomes are reported through the
//! registered [`ConnectionListener`](crate::ConnectionListener), which the
//! fallback builder wraps to drive failover.
//!
//! Health events are posted from spawned tasks, never inline on the control
//! path, so they serialize behind the coordinator's own operations instead
//! of re-entering them. Exactly one event is posted per connection attempt
//! outcome: `connected` on an accepted subscription, `failed` on a rejected
//! one, and `suspended` when a continuous stream ends without a local stop.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::LocationParams;
use crate::context::AppContext;
use crate::error::LocationError;
use crate::listeners::{ConnectionListenerRef, ListenerRef};
use crate::providers::provider::{LocationProvider, deliver, notify_failed};
use crate::providers::service::ServiceProvider;
use crate::reading::Reading;
use crate::sources::{ServiceSource, UpdateRequest};
use crate::store::{ReadingStore, Store};

/// Cache identity for readings produced by the push service.
const PUSH_STORE_ID: &str = "PUSH";

enum ConnEvent {
    Connected,
    Suspended,
    Failed,
}

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
struct PushInner {
    ctx: Option<AppContext>,
    client: Option<Arc<dyn ServiceSource>>,
    store: Option<Arc<ReadingStore>>,
    listener: Option<ListenerRef>,
    pump: Option<PumpHandle>,
    started: bool,
}

/// Provider over a connectable push-based geolocation service.
#[derive(Default)]
pub struct PushProvider {
    inner: Mutex<PushInner>,
    connection: StdMutex<Option<ConnectionListenerRef>>,
}

impl PushProvider {
    /// Creates an unbound provider; `init` binds it to a context.
    pub fn new() -> Self {
        Self::default()
    }

    fn connection_ref(&self) -> Option<ConnectionListenerRef> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Posts a connection event off the control path.
    fn post_connection_event(&self, event: ConnEvent) {
        let Some(listener) = self.connection_ref() else {
            return;
        };
        tokio::spawn(async move {
            match event {
                ConnEvent::Connected => listener.on_connected().await,
                ConnEvent::Suspended => listener.on_suspended().await,
                ConnEvent::Failed => listener.on_failed().await,
            }
        });
    }
}

#[async_trait]
impl LocationProvider for PushProvider {
    async fn init(&self, ctx: &AppContext, cache_enabled: bool) {
        let mut inner = self.inner.lock().await;
        inner.ctx = Some(ctx.clone());
        inner.store = if cache_enabled {
            Some(Arc::new(ReadingStore::new(ctx.pref_table())))
        } else {
            None
        };
        if inner.started {
            error!("location updates already started");
            return;
        }
        inner.client = ctx.service_source();
        if inner.client.is_none() {
            warn!("context provides no service driver");
        }
    }

    async fn start(&self, listener: Option<ListenerRef>, params: LocationParams, one_shot: bool) {
        let (ctx, client, store) = {
            let mut inner = self.inner.lock().await;
            if listener.is_none() {
                debug!("starting a service subscription without a listener");
            }
            inner.listener = listener.clone();
            let Some(ctx) = inner.ctx.clone() else {
                warn!("push provider started before init");
                return;
            };
            (ctx, inner.client.clone(), inner.store.clone())
        };

        let state = ctx.state();
        if !state.permission_granted() {
            debug!("permission check failed; handle the location permission");
            notify_failed(&listener, LocationError::NoPermission).await;
            return;
        }
        if !state.any_source_available() {
            debug!("no active location source is enabled");
            notify_failed(&listener, LocationError::SourceDisabled).await;
            return;
        }
        let Some(client) = client else {
            debug!("no service client bound; was init skipped?");
            return;
        };

        let request = UpdateRequest { params, one_shot };
        match client.request_updates(request).await {
            Ok(rx) => {
                // Connected is posted before the pump can observe the stream
                // ending, so outcomes arrive in connection order.
                self.post_connection_event(ConnEvent::Connected);
                let token = CancellationToken::new();
                let join = tokio::spawn(pump(
                    rx,
                    listener,
                    store,
                    one_shot,
                    token.clone(),
                    self.connection_ref(),
                ));
                let mut inner = self.inner.lock().await;
                inner.started = true;
                if let Some(old) = inner.pump.replace(PumpHandle { token, _join: join }) {
                    warn!("location updates already started; superseding previous subscription");
                    old.cancel();
                }
            }
            Err(fault) => {
                error!(%fault, "service subscription failed");
                self.post_connection_event(ConnEvent::Failed);
            }
        }
    }

    async fn stop(&self) {
        let (client, pump) = {
            let mut inner = self.inner.lock().await;
            inner.started = false;
            (inner.client.take(), inner.pump.take())
        };
        if let Some(pump) = pump {
            pump.cancel();
        }
        if let Some(client) = client {
            client.remove_updates().await;
        }
    }

    async fn last_reading(&self) -> Option<Reading> {
        let store = self.inner.lock().await.store.clone();
        store.and_then(|s| s.get(PUSH_STORE_ID))
    }
}

impl ServiceProvider for PushProvider {
    fn connection_listener(&self) -> Option<ConnectionListenerRef> {
        self.connection_ref()
    }

    fn set_connection_listener(&self, listener: ConnectionListenerRef) {
        *self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }
}

/// Forwards service readings to the listener and the cache.
///
/// When a continuous stream ends without a local stop, the connection
/// listener is told the service was suspended — the trigger for fallback.
async fn pump(
    mut rx: mpsc::Receiver<Reading>,
    listener: Option<ListenerRef>,
    store: Option<Arc<ReadingStore>>,
    one_shot: bool,
    token: CancellationToken,
    connection: Option<ConnectionListenerRef>,
) {
    loop {
        let reading = tokio::select! {
            _ = token.cancelled() => return,
            maybe = rx.recv() => match maybe {
                Some(reading) => reading,
                None => break,
            },
        };
        deliver(&listener, Some(reading.clone())).await;
        if let Some(store) = &store {
            store.put(PUSH_STORE_ID, &reading);
            debug!(source = %reading.source, "reading cached");
        }
        if one_shot {
            return;
        }
    }
    if !one_shot && !token.is_cancelled() {
        if let Some(connection) = connection {
            connection.on_suspended().await;
        }
    }
}
