//! Delivery specs
//!
//! Verify ordering, delivery modes and failure isolation as seen by
//! subscribers.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn sync_subscribers_run_highest_priority_first() {
    let (bus, _) = bus();
    let order = Arc::new(Mutex::new(Vec::new()));
    for priority in [5, 1, 10] {
        let order = Arc::clone(&order);
        bus.subscribe(
            "deploy.finished",
            move |_: &Event| -> HandlerResult {
                order.lock().unwrap().push(priority);
                Ok(())
            },
            sync_at(priority),
        )
        .unwrap();
    }

    bus.publish(event("deploy.finished")).await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec![10, 5, 1]);
}

#[tokio::test]
async fn failing_subscriber_does_not_stop_siblings() {
    let (bus, _) = bus();
    let recorder = Recorder::new();
    bus.subscribe(
        "deploy.*",
        |_: &Event| -> HandlerResult { Err("disk full".into()) },
        sync_at(10),
    )
    .unwrap();
    bus.subscribe("deploy.*", recorder.handler(), sync_at(0))
        .unwrap();

    let report = bus.publish(event("deploy.started")).await.unwrap();

    assert_eq!(recorder.types(), vec!["deploy.started"]);
    assert_eq!(report.failures().count(), 1);
    assert_eq!(bus.stats().total_dispatch_failures, 1);
}

#[tokio::test]
async fn full_queue_is_reported_without_blocking_publisher() {
    let (bus, _) = bus();
    let id = bus
        .subscribe(
            "**",
            Recorder::new().handler(),
            SubscribeOptions::new()
                .delivery_mode(DeliveryMode::Queued)
                .queue_capacity(2),
        )
        .unwrap();

    let mut outcomes = Vec::new();
    for n in 0..3 {
        let report = tokio::time::timeout(
            Duration::from_secs(1),
            bus.publish(event(&format!("tick.{n}"))),
        )
        .await
        .unwrap()
        .unwrap();
        outcomes.push(report.outcome(&id).cloned());
    }

    assert_eq!(outcomes[0], Some(DispatchOutcome::Enqueued));
    assert_eq!(outcomes[1], Some(DispatchOutcome::Enqueued));
    assert!(outcomes[2].as_ref().is_some_and(|o| o.is_failure()));
    assert_eq!(bus.stats().queued_events, 2);
}

#[tokio::test]
async fn async_subscriber_runs_after_publish_returns() {
    let (bus, _) = bus();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    bus.subscribe(
        "report.ready",
        AsyncHandler::new(move |e: Arc<Event>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(e.event_type().to_string());
                HandlerResult::Ok(())
            }
        }),
        SubscribeOptions::new().delivery_mode(DeliveryMode::Async),
    )
    .unwrap();

    let report = bus.publish(event("report.ready")).await.unwrap();
    assert_eq!(report.outcomes()[0].1, DispatchOutcome::Scheduled);

    let delivered = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap();
    assert_eq!(delivered.as_deref(), Some("report.ready"));
}

#[tokio::test]
async fn delivery_confirmations_follow_each_delivery() {
    let (bus, _) = bus_with(BusConfig::default().with_delivery_confirmations(true));
    let confirmations = Recorder::new();
    bus.subscribe("user.*", Recorder::new().handler(), sync_at(0))
        .unwrap();
    bus.subscribe(
        evr_core::CONFIRMATION_EVENT_TYPE,
        confirmations.handler(),
        sync_at(0),
    )
    .unwrap();

    let original = event("user.created");
    let original_id = original.id().clone();
    bus.publish(original).await.unwrap();

    let seen = confirmations.events();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].causation_id(), Some(&original_id));
    assert_eq!(seen[0].lookup("success"), Some(&json!(true)));
    assert_eq!(seen[0].lookup("original_event_type"), Some(&json!("user.created")));
}
