//! Configuration specs
//!
//! Verify a TOML configuration shapes the bus it builds.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn toml_selects_matcher_and_queue_capacity() {
    let config = BusConfig::from_toml_str(
        r#"
matcher = "wildcard"
queue_capacity = 1
"#,
    )
    .unwrap();
    let (bus, _) = bus_with(config);
    let id = bus
        .subscribe(
            "**",
            Recorder::new().handler(),
            SubscribeOptions::new().delivery_mode(DeliveryMode::Queued),
        )
        .unwrap();

    bus.publish(event("a")).await.unwrap();
    let second = bus.publish(event("b")).await.unwrap();

    assert_eq!(bus.stats().matcher, "wildcard");
    assert!(second.outcome(&id).is_some_and(|o| o.is_failure()));
}

#[tokio::test]
async fn default_config_caches_type_decisions() {
    let (bus, _) = bus();
    bus.subscribe("a.*", Recorder::new().handler(), sync_at(0))
        .unwrap();

    for _ in 0..3 {
        bus.publish(event("a.b")).await.unwrap();
    }

    let cache = bus.stats().cache.unwrap();
    assert_eq!(cache.capacity, 1000);
    assert_eq!((cache.misses, cache.hits), (1, 2));
}
