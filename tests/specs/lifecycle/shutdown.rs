//! Shutdown specs
//!
//! Verify the bus stops cleanly and refuses further work.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn publish_after_shutdown_is_rejected() {
    let (bus, _) = bus();
    bus.start();
    bus.shutdown().await;

    assert_eq!(
        bus.publish(event("late")).await.unwrap_err(),
        evr_core::BusError::ShutDown
    );
}

#[tokio::test]
async fn shutdown_wakes_waiting_queue_consumers() {
    let (bus, _) = bus();
    let id = bus
        .subscribe(
            "**",
            Recorder::new().handler(),
            SubscribeOptions::new().delivery_mode(DeliveryMode::Queued),
        )
        .unwrap();
    let queue = bus.queue(&id).unwrap();

    let consumer = tokio::spawn(async move { queue.dequeue(Duration::from_secs(60)).await });
    tokio::task::yield_now().await;
    bus.shutdown().await;

    let result = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.unwrap_err(), evr_core::DequeueError::Closed);
}
