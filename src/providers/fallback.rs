//! # Fallback coordinator: ordered provider chain with failover.
//!
//! [`FallbackProvider`] holds an ordered queue of providers and exposes the
//! provider contract itself, so callers never see the failover. The first
//! registered provider is tried first; when a service-backed provider's
//! connection fails, the relay wired by [`FallbackBuilder`] advances the
//! chain to the next provider and replays the recorded session against it.
//!
//! ## State machine
//! ```text
//! Idle ──init/first use──► Active ──chain exhausted──► Draining
//!
//! Idle:     no provider consumed yet; `current` is empty.
//! Active:   head popped, initialized, serving the session.
//! Draining: nothing left to try; reads report absence, fallback is a no-op.
//! ```
//!
//! ## Rules
//! - Fallback proceeds strictly in registration order; a provider is tried
//!   at most once per coordinator lifetime — no retry, no backoff.
//! - During fallback the old provider is stopped before the next one starts,
//!   so a superseded provider's readings never reach the listener.
//! - The caller-visible listener is recorded once and replayed; it is never
//!   re-registered.
//! - All operations serialize on one internal mutex (enqueue-and-drain);
//!   health signals are posted from provider tasks and drain behind it.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::LocationParams;
use crate::context::AppContext;
use crate::error::LocationError;
use crate::listeners::ListenerRef;
use crate::providers::relay::FallbackRelay;
use crate::providers::{LocationProvider, ProviderRef, ServiceProviderRef, SystemProvider};
use crate::reading::Reading;

/// Session parameters recorded at `start` and replayed on every fallback.
struct SessionRequest {
    listener: Option<ListenerRef>,
    params: LocationParams,
    one_shot: bool,
}

struct FallbackState {
    chain: VecDeque<ProviderRef>,
    current: Option<ProviderRef>,
    context: Option<AppContext>,
    cache_enabled: bool,
    session: Option<SessionRequest>,
    should_start: bool,
    draining: bool,
}

impl FallbackState {
    /// Returns the active provider, consuming the head of the chain on
    /// first use (Idle → Active).
    fn current(&mut self) -> Option<ProviderRef> {
        if self.current.is_none() {
            self.current = self.chain.pop_front();
        }
        self.current.clone()
    }
}

/// Coordinator over an ordered chain of providers.
///
/// Build one with [`FallbackBuilder`]; it implements [`LocationProvider`]
/// and is handed to a session like any single provider.
pub struct FallbackProvider {
    state: Mutex<FallbackState>,
}

impl FallbackProvider {
    fn from_chain(chain: VecDeque<ProviderRef>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FallbackState {
                chain,
                current: None,
                context: None,
                cache_enabled: false,
                session: None,
                should_start: false,
                draining: false,
            }),
        })
    }

    /// Returns the provider currently in use, consuming the chain head on
    /// first call.
    pub async fn current_provider(&self) -> Option<ProviderRef> {
        self.state.lock().await.current()
    }

    /// Returns how many providers are still waiting in the chain.
    pub async fn remaining_providers(&self) -> usize {
        self.state.lock().await.chain.len()
    }

    /// Advances to the next provider in the chain.
    ///
    /// Invoked by the health-signal relay after its staleness guard. Stops
    /// the current provider, initializes the next with the stored context,
    /// and — if a session was recorded — starts it with that exact session.
    /// With an empty chain the coordinator drains permanently: the failed
    /// provider is stopped, reads report absence, and further fallback
    /// requests are no-ops.
    pub async fn fallback(&self) {
        let mut state = self.state.lock().await;
        if state.draining {
            debug!("fallback requested while draining; ignoring");
            return;
        }
        match state.chain.pop_front() {
            Some(next) => {
                if let Some(old) = state.current.take() {
                    old.stop().await;
                }
                if let Some(ctx) = state.context.clone() {
                    next.init(&ctx, state.cache_enabled).await;
                }
                if state.should_start {
                    if let Some(session) = &state.session {
                        next.start(session.listener.clone(), session.params, session.one_shot)
                            .await;
                    }
                }
                info!(remaining = state.chain.len(), "fell back to next provider");
                state.current = Some(next);
            }
            None => {
                if let Some(old) = state.current.take() {
                    old.stop().await;
                }
                state.draining = true;
                warn!(
                    error = LocationError::NoActiveProvider.as_label(),
                    "fallback chain exhausted"
                );
            }
        }
    }
}

#[async_trait]
impl LocationProvider for FallbackProvider {
    async fn init(&self, ctx: &AppContext, cache_enabled: bool) {
        let mut state = self.state.lock().await;
        state.context = Some(ctx.clone());
        state.cache_enabled = cache_enabled;
        if let Some(current) = state.current() {
            current.init(ctx, cache_enabled).await;
        }
    }

    async fn start(&self, listener: Option<ListenerRef>, params: LocationParams, one_shot: bool) {
        let mut state = self.state.lock().await;
        state.should_start = true;
        state.session = Some(SessionRequest {
            listener: listener.clone(),
            params,
            one_shot,
        });
        if let Some(current) = state.current() {
            current.start(listener, params, one_shot).await;
        }
    }

    async fn stop(&self) {
        // Reads `current` as-is: stopping an Idle coordinator is a no-op and
        // must not consume the chain.
        let state = self.state.lock().await;
        let current = state.current.clone();
        drop(state);
        if let Some(current) = current {
            current.stop().await;
        }
    }

    async fn last_reading(&self) -> Option<Reading> {
        let mut state = self.state.lock().await;
        if state.draining {
            return None;
        }
        let current = state.current()?;
        drop(state);
        current.last_reading().await
    }
}

/// Chain entry kept until `build` so service providers can be wired last.
enum ChainEntry {
    Plain(ProviderRef),
    Service(ServiceProviderRef),
}

/// # Staged construction of a [`FallbackProvider`].
///
/// Registration order is the fallback priority order. Service-backed
/// providers are wrapped with the health-signal relay; plain providers do
/// not participate in failover signaling. An empty builder inserts the
/// default [`SystemProvider`].
///
/// # Example
/// ```
/// use geovisor::FallbackBuilder;
///
/// let provider = FallbackBuilder::new()
///     .with_push_provider()
///     .with_system_provider()
///     .build();
/// # let _ = provider;
/// ```
#[derive(Default)]
pub struct FallbackBuilder {
    entries: Vec<ChainEntry>,
}

impl FallbackBuilder {
    /// Starts an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider without fallback signaling.
    ///
    /// Such providers cannot trigger failover themselves; they only serve
    /// as fallback targets.
    pub fn with_provider(mut self, provider: ProviderRef) -> Self {
        self.entries.push(ChainEntry::Plain(provider));
        self
    }

    /// Adds a service-backed provider.
    ///
    /// When the provider reports that its underlying service is suspended
    /// or failed, the built coordinator falls back to the next provider in
    /// the list.
    pub fn with_service_provider(mut self, provider: ServiceProviderRef) -> Self {
        self.entries.push(ChainEntry::Service(provider));
        self
    }

    /// Adds the platform-driver provider ([`SystemProvider`]).
    pub fn with_system_provider(self) -> Self {
        self.with_provider(Arc::new(SystemProvider::new()))
    }

    /// Adds the connectable-service provider
    /// ([`PushProvider`](crate::PushProvider)).
    pub fn with_push_provider(self) -> Self {
        self.with_service_provider(Arc::new(crate::providers::PushProvider::new()))
    }

    /// Builds the coordinator.
    ///
    /// If no providers were registered, the default [`SystemProvider`] is
    /// inserted so the chain is never empty.
    pub fn build(self) -> Arc<FallbackProvider> {
        let mut entries = self.entries;
        if entries.is_empty() {
            entries.push(ChainEntry::Plain(Arc::new(SystemProvider::new())));
        }

        let chain: VecDeque<ProviderRef> = entries
            .iter()
            .map(|entry| -> ProviderRef {
                match entry {
                    ChainEntry::Plain(p) => p.clone(),
                    ChainEntry::Service(p) => p.clone(),
                }
            })
            .collect();
        let fallback = FallbackProvider::from_chain(chain);

        for entry in entries {
            if let ChainEntry::Service(service) = entry {
                let child: ProviderRef = service.clone();
                let relay = FallbackRelay::new(
                    Arc::downgrade(&fallback),
                    child,
                    service.connection_listener(),
                );
                service.set_connection_listener(Arc::new(relay));
            }
        }
        fallback
    }
}
