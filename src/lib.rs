//! # geovisor
//!
//! **Geovisor** is a failover-aware location orchestration library for Rust.
//!
//! It lets a host application obtain positional readings from one of
//! several interchangeable backend providers, transparently failing over to
//! the next provider when the preferred one becomes unavailable, delivering
//! updates to a single long-lived listener, and optionally persisting the
//! most recent reading for instant retrieval before a fresh fix arrives.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Locator ── location() ──► Session (config / one_shot / start / stop)
//!                               │
//!                               ▼ binds one provider per context
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  FallbackProvider (ordered chain, registration order = priority)  │
//! │  - current provider serves the session                            │
//! │  - recorded session is replayed on every fallback                 │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        ▼                              ▼
//!   ┌──────────────┐             ┌──────────────┐
//!   │ PushProvider │             │SystemProvider│
//!   │ (service)    │             │ (platform)   │
//!   └┬─────────────┘             └──────┬───────┘
//!    │ connection events                │ readings
//!    ▼                                  ▼
//!  FallbackRelay ── forward to own    UpdateListener + ReadingStore
//!  listener, then staleness guard
//!  (Arc::ptr_eq against current)
//!    │
//!    └─► FallbackProvider::fallback(): stop old ► pop next ► init ►
//!        replay recorded session ► next provider is current
//! ```
//!
//! ### Fallback lifecycle
//! ```text
//! Idle ──init──► Active ──failure signal──► Active (next provider)
//!                  │                            │
//!                  └── chain exhausted ─────────┴──► Draining
//!
//! Draining: reads report absence; further failure signals are no-ops.
//! Every provider is tried at most once — no reordering, retry, or backoff.
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                        |
//! |-----------------|----------------------------------------------------------|-------------------------------------------|
//! | **Sessions**    | Fluent per-context entry point with start/stop lifecycle.| [`Locator`], [`Session`]                  |
//! | **Failover**    | Ordered provider chains with health-driven fallback.     | [`FallbackBuilder`], [`FallbackProvider`] |
//! | **Providers**   | Contracts for backends, local or service-backed.         | [`LocationProvider`], [`ServiceProvider`] |
//! | **Listeners**   | Update delivery and health-signal contracts.             | [`UpdateListener`], [`ConnectionListener`]|
//! | **Caching**     | Bit-exact persisted last-reading store.                  | [`ReadingStore`], [`PrefTable`]           |
//! | **Availability**| Read-only capability and source-state queries.           | [`SourceState`], [`SourceProbe`]          |
//!
//! ## Example
//! ```no_run
//! use geovisor::{AppContext, ListenerFn, LocationParams, Locator, StaticProbe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let ctx = AppContext::builder()
//!         .data_dir("/var/lib/app")
//!         .probe(StaticProbe::allow_all())
//!         .build();
//!
//!     // Default chain: push service first, platform driver as fallback.
//!     let session = Locator::with(ctx)
//!         .location()
//!         .await
//!         .config(LocationParams::BEST_EFFORT);
//!
//!     session
//!         .start(ListenerFn::arc(|outcome| async move {
//!             match outcome {
//!                 Ok(Some(reading)) => println!("{}, {}", reading.latitude, reading.longitude),
//!                 Ok(None) => println!("no fix"),
//!                 Err(error) => eprintln!("failed: {error}"),
//!             }
//!         }))
//!         .await;
//!
//!     // ... later:
//!     session.stop().await;
//! }
//! ```

mod config;
mod context;
mod error;
mod listeners;
mod providers;
mod reading;
mod session;
mod sources;
mod state;
mod store;

// ---- Public re-exports ----

pub use config::{Accuracy, LocationParams, LocationParamsBuilder};
pub use context::{AppContext, AppContextBuilder, ContextId};
pub use error::LocationError;
pub use listeners::{
    ConnectionListener, ConnectionListenerRef, ListenerFn, ListenerRef, UpdateListener,
};
pub use providers::{
    FallbackBuilder, FallbackProvider, LocationProvider, ProviderRef, PushProvider,
    ServiceProvider, ServiceProviderRef, SystemProvider,
};
pub use reading::Reading;
pub use session::{Locator, Session};
pub use sources::{PositionSource, ServiceFault, ServiceSource, UpdateRequest};
pub use state::{
    SOURCE_GPS, SOURCE_NETWORK, SOURCE_PASSIVE, SourceProbe, SourceState, StaticProbe,
};
pub use store::{PrefEdit, PrefTable, PrefValue, ReadingStore, Store};
