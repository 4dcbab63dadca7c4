//! Pattern specs
//!
//! Verify wildcard and attribute filter matching end to end.

use crate::prelude::*;
use similar_asserts::assert_eq;

async fn delivered_types(pattern: &str, published: &[&str]) -> Vec<String> {
    let (bus, _) = bus();
    let recorder = Recorder::new();
    bus.subscribe(pattern, recorder.handler(), sync_at(0)).unwrap();
    for event_type in published {
        bus.publish(event(event_type)).await.unwrap();
    }
    recorder.types()
}

#[tokio::test]
async fn single_wildcard_matches_exactly_one_segment() {
    assert_eq!(
        delivered_types("a.*.c", &["a.b.c", "a.b.b.c", "a.c"]).await,
        vec!["a.b.c"]
    );
}

#[tokio::test]
async fn trailing_globstar_matches_prefix_and_descendants() {
    assert_eq!(
        delivered_types("a.**", &["a", "a.b", "a.b.c", "ab", "b.a"]).await,
        vec!["a", "a.b", "a.b.c"]
    );
}

#[tokio::test]
async fn health_filter_fires_only_for_unhealthy() {
    let (bus, _) = bus();
    let recorder = Recorder::new();
    let pattern = EventPattern::new("container.health.*")
        .and_then(|p| p.with_filter_spec(&json!({"status": {"$eq": "unhealthy"}})));
    bus.subscribe(pattern, recorder.handler(), sync_at(0))
        .unwrap();

    for status in ["unhealthy", "healthy"] {
        let e = Event::builder("container.health.changed", "docker")
            .field("status", status)
            .build()
            .unwrap();
        bus.publish(e).await.unwrap();
    }

    let statuses: Vec<_> = recorder
        .events()
        .iter()
        .map(|e| e.lookup("status").cloned())
        .collect();
    assert_eq!(statuses, vec![Some(json!("unhealthy"))]);
}

#[tokio::test]
async fn nested_numeric_filters_combine() {
    let (bus, _) = bus();
    let recorder = Recorder::new();
    let pattern = EventPattern::new("metrics.**").and_then(|p| {
        p.with_filter_spec(&json!({
            "host.cpu": {"$gte": 90},
            "host.region": {"$in": ["eu", "us"]},
            "silenced": {"$exists": false},
        }))
    });
    bus.subscribe(pattern, recorder.handler(), sync_at(0))
        .unwrap();

    let sample = |cpu: f64, region: &str, silenced: bool| {
        let mut builder = Event::builder("metrics.host", "agent")
            .field("host", json!({"cpu": cpu, "region": region}));
        if silenced {
            builder = builder.field("silenced", true);
        }
        builder.build().unwrap()
    };

    bus.publish(sample(95.0, "eu", false)).await.unwrap();
    bus.publish(sample(90.0, "us", false)).await.unwrap();
    bus.publish(sample(89.9, "eu", false)).await.unwrap();
    bus.publish(sample(99.0, "ap", false)).await.unwrap();
    bus.publish(sample(99.0, "eu", true)).await.unwrap();

    assert_eq!(recorder.len(), 2);
}

#[tokio::test]
async fn malformed_patterns_are_rejected_at_subscribe() {
    let (bus, _) = bus();
    for pattern in ["", "a..b", "a.**.b", "a.b*"] {
        assert!(
            bus.subscribe(pattern, Recorder::new().handler(), sync_at(0))
                .is_err(),
            "{pattern:?} should be rejected"
        );
    }
    let unknown_op = EventPattern::new("a").and_then(|p| p.with_filter_spec(&json!({"x": {"$regex": "y"}})));
    assert!(bus
        .subscribe(unknown_op, Recorder::new().handler(), sync_at(0))
        .is_err());
    assert_eq!(bus.stats().total_subscriptions, 0);
}
