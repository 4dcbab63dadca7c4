//! Durable store specs
//!
//! A store attaches as a low-priority queued `**` subscription and persists
//! what it dequeues, without slowing publishers down.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn store_persists_every_event_in_publish_order() {
    let (bus, _) = bus();
    let store = Recorder::new();
    let store_id = bus
        .subscribe(
            "**",
            store.handler(),
            SubscribeOptions::new()
                .priority(-100)
                .delivery_mode(DeliveryMode::Queued),
        )
        .unwrap();
    let worker = bus
        .spawn_queue_worker(&store_id, Duration::from_millis(20))
        .unwrap();

    let live = Recorder::new();
    bus.subscribe("order.*", live.handler(), sync_at(0)).unwrap();

    let published = ["order.placed", "payment.captured", "order.shipped"];
    for event_type in published {
        bus.publish(event(event_type)).await.unwrap();
    }

    // Unsubscribing closes the queue; the worker drains it and stops
    bus.unsubscribe(&store_id);
    tokio::time::timeout(Duration::from_secs(1), worker)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(store.types(), published.to_vec());
    assert_eq!(live.types(), vec!["order.placed", "order.shipped"]);
}

#[tokio::test]
async fn store_sees_events_that_sync_handlers_reject() {
    let (bus, _) = bus();
    let store_id = bus
        .subscribe(
            "**",
            Recorder::new().handler(),
            SubscribeOptions::new()
                .priority(-100)
                .delivery_mode(DeliveryMode::Queued),
        )
        .unwrap();
    bus.subscribe(
        "**",
        |_: &Event| -> HandlerResult { Err("validation failed".into()) },
        sync_at(100),
    )
    .unwrap();

    bus.publish(event("anything.at.all")).await.unwrap();

    let queue = bus.queue(&store_id).unwrap();
    let stored = queue.dequeue(Duration::from_millis(10)).await.unwrap();
    assert_eq!(stored.event_type(), "anything.at.all");
}
