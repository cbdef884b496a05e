//! # Demo: one_shot
//!
//! Minimal one-shot fix against a scripted platform driver.
//!
//! Demonstrates how to:
//! - Supply a [`PositionSource`] driver through the [`AppContext`].
//! - Open a session with [`Locator`] and request a single reading.
//! - Receive the fix through a [`ListenerFn`] closure listener.
//!
//! ## Run
//! ```bash
//! cargo run --example one_shot
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use geovisor::{
    AppContext, ListenerFn, LocationParams, Locator, PositionSource, Reading, StaticProbe,
    SystemProvider, UpdateRequest,
};

/// Driver that replays one canned fix.
struct CannedDriver;

#[async_trait]
impl PositionSource for CannedDriver {
    fn name(&self) -> &str {
        "canned"
    }

    async fn start_updates(&self, request: UpdateRequest) -> Option<mpsc::Receiver<Reading>> {
        println!("[driver] subscribed: one_shot={}", request.one_shot);
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = tx
                .send(
                    Reading::new("canned")
                        .with_latitude(48.8584)
                        .with_longitude(2.2945)
                        .with_accuracy(4.2)
                        .with_time(1_700_000_000_000),
                )
                .await;
        });
        Some(rx)
    }

    async fn stop_updates(&self) {
        println!("[driver] unsubscribed");
    }

    async fn current(&self) -> Option<Reading> {
        None
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 1. Build the host context with the driver and a permissive probe.
    let ctx = AppContext::builder()
        .probe(StaticProbe::allow_all())
        .position_source(Arc::new(CannedDriver))
        .build();

    // 2. Open a one-shot session against the platform provider.
    let session = Locator::with(ctx)
        .location_with(Arc::new(SystemProvider::new()))
        .await
        .config(LocationParams::NAVIGATION)
        .one_shot();

    // 3. Start and wait for the single delivery.
    let (done_tx, mut done_rx) = mpsc::channel::<()>(1);
    session
        .start(ListenerFn::arc(move |outcome| {
            let done = done_tx.clone();
            async move {
                match outcome {
                    Ok(Some(fix)) => println!("[fix] {}, {}", fix.latitude, fix.longitude),
                    Ok(None) => println!("[fix] none available"),
                    Err(error) => eprintln!("[failed] {error}"),
                }
                let _ = done.try_send(());
            }
        }))
        .await;

    let _ = done_rx.recv().await;
    session.stop().await;
}
