//! # Host-context handle.
//!
//! [`AppContext`] is the application-scoped handle every provider receives
//! at `init`: it carries the capability probe, the opaque platform drivers,
//! and the data directory backing the reading cache. It is a cheap clone
//! (shared inner), identified by a process-unique [`ContextId`].
//!
//! Two lazily built collaborators live on the context and are never rebuilt
//! for its lifetime:
//! - the [`SourceState`] availability surface, constructed on first query;
//! - the shared [`PrefTable`], so every provider bound to this context
//!   persists into the same snapshot.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use crate::sources::{PositionSource, ServiceSource};
use crate::state::{SourceProbe, SourceState, StaticProbe};
use crate::store::PrefTable;

/// Global sequence counter for context identity.
static CONTEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Snapshot file name under the context's data directory.
const STORE_FILE: &str = "location_store.json";

/// Process-unique identity of an [`AppContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

pub(crate) struct ContextInner {
    id: ContextId,
    data_dir: Option<PathBuf>,
    probe: Arc<dyn SourceProbe>,
    position_source: Option<Arc<dyn PositionSource>>,
    service_source: Option<Arc<dyn ServiceSource>>,
    table: OnceLock<Arc<PrefTable>>,
    state: OnceLock<Arc<SourceState>>,
}

/// Application-scoped context handle.
///
/// # Example
/// ```
/// use geovisor::{AppContext, StaticProbe};
///
/// let ctx = AppContext::builder()
///     .probe(StaticProbe::allow_all())
///     .build();
///
/// assert!(ctx.state().location_services_enabled());
/// assert_eq!(ctx.id(), ctx.clone().id());
/// ```
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

impl AppContext {
    /// Starts building a context.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    /// Returns the context's process-unique identity.
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// Returns the availability surface, building it on first use.
    pub fn state(&self) -> Arc<SourceState> {
        self.inner
            .state
            .get_or_init(|| Arc::new(SourceState::new(self.inner.probe.clone())))
            .clone()
    }

    /// Returns the shared preference table, opening it on first use.
    ///
    /// With no data directory configured the table is in-memory and cached
    /// readings do not survive the process.
    pub fn pref_table(&self) -> Arc<PrefTable> {
        self.inner
            .table
            .get_or_init(|| {
                Arc::new(match &self.inner.data_dir {
                    Some(dir) => PrefTable::open(dir.join(STORE_FILE)),
                    None => PrefTable::in_memory(),
                })
            })
            .clone()
    }

    /// Returns the platform position driver, if the host supplied one.
    pub fn position_source(&self) -> Option<Arc<dyn PositionSource>> {
        self.inner.position_source.clone()
    }

    /// Returns the connectable service driver, if the host supplied one.
    pub fn service_source(&self) -> Option<Arc<dyn ServiceSource>> {
        self.inner.service_source.clone()
    }

    pub(crate) fn downgrade(&self) -> Weak<ContextInner> {
        Arc::downgrade(&self.inner)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("id", &self.inner.id)
            .field("data_dir", &self.inner.data_dir)
            .finish_non_exhaustive()
    }
}

/// Staged construction for [`AppContext`].
#[derive(Default)]
pub struct AppContextBuilder {
    data_dir: Option<PathBuf>,
    probe: Option<Arc<dyn SourceProbe>>,
    position_source: Option<Arc<dyn PositionSource>>,
    service_source: Option<Arc<dyn ServiceSource>>,
}

impl AppContextBuilder {
    /// Sets the directory holding the persisted reading cache.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the capability probe. Defaults to [`StaticProbe::allow_all`].
    pub fn probe(mut self, probe: impl SourceProbe) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Sets the capability probe from a shared handle.
    pub fn probe_arc(mut self, probe: Arc<dyn SourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Sets the platform position driver.
    pub fn position_source(mut self, source: Arc<dyn PositionSource>) -> Self {
        self.position_source = Some(source);
        self
    }

    /// Sets the connectable service driver.
    pub fn service_source(mut self, source: Arc<dyn ServiceSource>) -> Self {
        self.service_source = Some(source);
        self
    }

    /// Builds the context handle.
    pub fn build(self) -> AppContext {
        AppContext {
            inner: Arc::new(ContextInner {
                id: ContextId(CONTEXT_SEQ.fetch_add(1, Ordering::Relaxed)),
                data_dir: self.data_dir,
                probe: self
                    .probe
                    .unwrap_or_else(|| Arc::new(StaticProbe::allow_all())),
                position_source: self.position_source,
                service_source: self.service_source,
                table: OnceLock::new(),
                state: OnceLock::new(),
            }),
        }
    }
}
