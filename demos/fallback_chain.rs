//! # Demo: fallback_chain
//!
//! Failover from a rejecting push service to the platform driver.
//!
//! Demonstrates how to:
//! - Register providers in priority order with [`FallbackBuilder`].
//! - Watch a connection failure advance the chain without re-registering
//!   the listener.
//!
//! ## Flow
//! ```text
//! start ──► PushProvider ──request rejected──► relay ──► fallback()
//!                                                         │
//!                            SystemProvider ◄── init + replay session
//!                                  │
//!                                  └──► listener receives readings
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example fallback_chain
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use geovisor::{
    AppContext, FallbackBuilder, ListenerFn, LocationParams, Locator, PositionSource, Reading,
    ServiceFault, ServiceSource, StaticProbe, UpdateRequest,
};

/// Service that always rejects, as if its runtime were missing.
struct DownService;

#[async_trait]
impl ServiceSource for DownService {
    fn name(&self) -> &str {
        "down-service"
    }

    async fn request_updates(
        &self,
        _request: UpdateRequest,
    ) -> Result<mpsc::Receiver<Reading>, ServiceFault> {
        Err(ServiceFault::Unavailable {
            reason: "service runtime not installed".to_string(),
        })
    }

    async fn remove_updates(&self) {}
}

/// Platform driver producing a short stream of fixes.
struct WalkDriver;

#[async_trait]
impl PositionSource for WalkDriver {
    fn name(&self) -> &str {
        "walk"
    }

    async fn start_updates(&self, _request: UpdateRequest) -> Option<mpsc::Receiver<Reading>> {
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            for step in 0..3 {
                let fix = Reading::new("walk")
                    .with_latitude(59.3293 + f64::from(step) * 1e-4)
                    .with_longitude(18.0686)
                    .with_accuracy(8.0);
                if tx.send(fix).await.is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
        });
        Some(rx)
    }

    async fn stop_updates(&self) {}

    async fn current(&self) -> Option<Reading> {
        None
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let ctx = AppContext::builder()
        .probe(StaticProbe::allow_all())
        .service_source(Arc::new(DownService))
        .position_source(Arc::new(WalkDriver))
        .build();

    // Push service first; the platform driver is the fallback target.
    let chain = FallbackBuilder::new()
        .with_push_provider()
        .with_system_provider()
        .build();

    let session = Locator::with(ctx)
        .location_with(chain)
        .await
        .config(LocationParams::BEST_EFFORT);

    let (done_tx, mut done_rx) = mpsc::channel::<()>(1);
    let mut seen = 0u32;
    session
        .start(ListenerFn::arc(move |outcome| {
            let done = done_tx.clone();
            if let Ok(Some(_)) = &outcome {
                seen += 1;
            }
            let finished = seen == 3;
            async move {
                match outcome {
                    Ok(Some(fix)) => println!("[fix] {:.4}, {:.4}", fix.latitude, fix.longitude),
                    Ok(None) => println!("[fix] none available"),
                    Err(error) => eprintln!("[failed] {error}"),
                }
                if finished {
                    let _ = done.try_send(());
                }
            }
        }))
        .await;

    let _ = done_rx.recv().await;
    session.stop().await;
    println!("[done] chain fell back and served the walk");
}
