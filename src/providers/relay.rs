//! # Health-signal relay.
//!
//! [`FallbackRelay`] decorates one service-backed chain member's connection
//! listener. Every event is forwarded to the child's own listener first, so
//! provider-local bookkeeping still runs; `suspended` and `failed` then pass
//! a staleness guard before advancing the coordinator.
//!
//! The guard compares the reporting child against the coordinator's current
//! provider by reference identity (`Arc::ptr_eq`). A delayed or duplicate
//! event from a provider that has already been superseded therefore never
//! triggers a second fallback step.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::debug;

use crate::listeners::{ConnectionListener, ConnectionListenerRef};
use crate::providers::fallback::FallbackProvider;
use crate::providers::provider::ProviderRef;

/// Connection-listener decorator driving the coordinator's failover.
pub(crate) struct FallbackRelay {
    coordinator: Weak<FallbackProvider>,
    child: ProviderRef,
    inner: Option<ConnectionListenerRef>,
}

impl FallbackRelay {
    pub(crate) fn new(
        coordinator: Weak<FallbackProvider>,
        child: ProviderRef,
        inner: Option<ConnectionListenerRef>,
    ) -> Self {
        Self {
            coordinator,
            child,
            inner,
        }
    }

    async fn run_fallback(&self) {
        let Some(coordinator) = self.coordinator.upgrade() else {
            return;
        };
        let is_current = match coordinator.current_provider().await {
            Some(current) => Arc::ptr_eq(&current, &self.child),
            None => false,
        };
        if is_current {
            coordinator.fallback().await;
        } else {
            debug!("health signal from superseded provider; ignoring");
        }
    }
}

#[async_trait]
impl ConnectionListener for FallbackRelay {
    async fn on_connected(&self) {
        if let Some(inner) = &self.inner {
            inner.on_connected().await;
        }
    }

    async fn on_suspended(&self) {
        if let Some(inner) = &self.inner {
            inner.on_suspended().await;
        }
        self.run_fallback().await;
    }

    async fn on_failed(&self) {
        if let Some(inner) = &self.inner {
            inner.on_failed().await;
        }
        self.run_fallback().await;
    }
}
