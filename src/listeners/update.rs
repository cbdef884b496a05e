//! # Session listener contract and closure adapter.
//!
//! [`UpdateListener`] is the single long-lived subscriber a session hands to
//! its provider. Readings arrive through [`on_update`](UpdateListener::on_update);
//! recoverable failures arrive through [`on_failed`](UpdateListener::on_failed).
//! The engine re-targets the *provider* during fallback, never the listener —
//! a listener is registered once per session.
//!
//! [`ListenerFn`] wraps a closure as a listener for tests and small hosts.

use std::future::Future;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LocationError;
use crate::reading::Reading;

/// Shared handle to a session listener.
pub type ListenerRef = std::sync::Arc<dyn UpdateListener>;

/// # Receiver of session updates.
///
/// Callbacks are invoked from the active provider's delivery context, one at
/// a time. An update of `None` means the source produced an empty fix.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use geovisor::{LocationError, Reading, UpdateListener};
///
/// struct Printer;
///
/// #[async_trait]
/// impl UpdateListener for Printer {
///     async fn on_update(&self, reading: Option<Reading>) {
///         if let Some(r) = reading {
///             println!("fix: {}, {}", r.latitude, r.longitude);
///         }
///     }
///
///     async fn on_failed(&self, error: LocationError) {
///         eprintln!("failed: {error}");
///     }
/// }
/// ```
#[async_trait]
pub trait UpdateListener: Send + Sync + 'static {
    /// Delivers a reading (or an empty fix).
    async fn on_update(&self, reading: Option<Reading>);

    /// Reports a recoverable failure of the attempted operation.
    async fn on_failed(&self, error: LocationError);
}

/// # Closure-backed listener implementation.
///
/// The closure receives `Ok(reading)` for updates and `Err(error)` for
/// failures. It is guarded by a [`Mutex`] so `FnMut` state is safe behind
/// `&self`; the lock is held only while the future is created, not while it
/// runs.
///
/// # Example
/// ```
/// use geovisor::{ListenerFn, ListenerRef};
///
/// let listener: ListenerRef = ListenerFn::arc(|outcome| async move {
///     match outcome {
///         Ok(reading) => println!("update: {reading:?}"),
///         Err(error) => eprintln!("failed: {error}"),
///     }
/// });
/// # let _ = listener;
/// ```
pub struct ListenerFn<Fnc, Fut>
where
    Fnc: FnMut(Result<Option<Reading>, LocationError>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    func: Mutex<Fnc>,
}

impl<Fnc, Fut> ListenerFn<Fnc, Fut>
where
    Fnc: FnMut(Result<Option<Reading>, LocationError>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    /// Creates a new closure-backed listener.
    pub fn new(func: Fnc) -> Self {
        Self {
            func: Mutex::new(func),
        }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc(func: Fnc) -> ListenerRef {
        std::sync::Arc::new(Self::new(func))
    }

    fn call(&self, outcome: Result<Option<Reading>, LocationError>) -> Option<Fut> {
        match self.func.lock() {
            Ok(mut f) => Some((f)(outcome)),
            Err(_) => {
                tracing::warn!("listener closure mutex poisoned; dropping callback");
                None
            }
        }
    }
}

#[async_trait]
impl<Fnc, Fut> UpdateListener for ListenerFn<Fnc, Fut>
where
    Fnc: FnMut(Result<Option<Reading>, LocationError>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_update(&self, reading: Option<Reading>) {
        if let Some(fut) = self.call(Ok(reading)) {
            fut.await;
        }
    }

    async fn on_failed(&self, error: LocationError) {
        if let Some(fut) = self.call(Err(error)) {
            fut.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn test_listener_fn_forwards_both_channels() {
        let seen: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();

        let listener = ListenerFn::arc(move |outcome| {
            let sink = sink.clone();
            async move {
                let entry = match outcome {
                    Ok(Some(r)) => format!("fix:{}", r.source),
                    Ok(None) => "empty".to_string(),
                    Err(e) => format!("err:{}", e.as_label()),
                };
                sink.lock().unwrap().push(entry);
            }
        });

        listener.on_update(Some(Reading::new("gps"))).await;
        listener.on_update(None).await;
        listener.on_failed(LocationError::NoPermission).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["fix:gps", "empty", "err:no_permission"]);
    }
}
