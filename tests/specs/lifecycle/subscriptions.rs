//! Subscription lifecycle specs
//!
//! Verify unsubscribe, delivery budgets and expiry.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn max_events_one_receives_a_single_event() {
    let (bus, _) = bus();
    let recorder = Recorder::new();
    let id = bus
        .subscribe("job.*", recorder.handler(), sync_at(0).max_events(1))
        .unwrap();

    bus.publish(event("job.started")).await.unwrap();
    bus.publish(event("job.finished")).await.unwrap();

    assert_eq!(recorder.types(), vec!["job.started"]);
    assert_eq!(
        bus.subscription(&id).map(|info| info.state),
        Some(SubscriptionState::Inactive)
    );
}

#[tokio::test]
async fn unsubscribe_twice_returns_true_then_false() {
    let (bus, _) = bus();
    let id = bus
        .subscribe("**", Recorder::new().handler(), sync_at(0))
        .unwrap();

    assert!(bus.unsubscribe(&id));
    assert!(!bus.unsubscribe(&id));
}

#[tokio::test]
async fn ttl_stops_delivery_once_elapsed() {
    let (bus, clock) = bus();
    let recorder = Recorder::new();
    bus.subscribe(
        "heartbeat",
        recorder.handler(),
        sync_at(0).ttl(Duration::from_secs(30)),
    )
    .unwrap();

    bus.publish(event("heartbeat")).await.unwrap();
    clock.advance(Duration::from_secs(29));
    bus.publish(event("heartbeat")).await.unwrap();
    clock.advance(Duration::from_secs(1));
    bus.publish(event("heartbeat")).await.unwrap();

    assert_eq!(recorder.len(), 2);
    assert_eq!(bus.stats().expired_subscriptions, 1);
}

#[tokio::test]
async fn sweep_retires_idle_expired_subscriptions() {
    let config = BusConfig::default().with_inactive_retention(Duration::from_secs(60));
    let (bus, clock) = bus_with(config);
    let id = bus
        .subscribe(
            "never.published",
            Recorder::new().handler(),
            sync_at(0).ttl(Duration::from_secs(5)),
        )
        .unwrap();

    clock.advance(Duration::from_secs(5));
    assert_eq!(bus.sweep_now().expired, 1);
    assert_eq!(
        bus.subscription(&id).map(|info| info.state),
        Some(SubscriptionState::Inactive)
    );

    clock.advance(Duration::from_secs(60));
    assert_eq!(bus.sweep_now().purged, 1);
    assert!(bus.subscription(&id).is_none());
}

#[tokio::test]
async fn subscriber_added_during_dispatch_sees_only_later_events() {
    let (bus, _) = bus();
    let late = Recorder::new();
    let added = Arc::new(Mutex::new(None::<SubscriptionId>));

    let adder = {
        let bus = bus.clone();
        let late = late.clone();
        let added = Arc::clone(&added);
        move |_: &Event| -> HandlerResult {
            let mut added = added.lock().unwrap();
            if added.is_none() {
                *added = Some(bus.subscribe("news.*", late.handler(), sync_at(0))?);
            }
            Ok(())
        }
    };
    bus.subscribe("news.*", adder, sync_at(10)).unwrap();

    bus.publish(event("news.first")).await.unwrap();
    bus.publish(event("news.second")).await.unwrap();

    assert_eq!(late.types(), vec!["news.second"]);
}
