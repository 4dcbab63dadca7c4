//! Replayer specs
//!
//! Replayed history goes through normal matching, flagged as a replay.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn replayed_events_are_flagged_and_matched_normally() {
    let (bus, _) = bus();
    let history = vec![
        event("invoice.created"),
        event("invoice.paid"),
        event("customer.updated"),
    ];

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    bus.subscribe(
        "invoice.*",
        move |e: &Event| -> HandlerResult {
            log.lock().unwrap().push((e.event_type().to_string(), e.is_replay()));
            Ok(())
        },
        sync_at(0),
    )
    .unwrap();

    for e in &history {
        bus.publish(e.as_replay()).await.unwrap();
    }
    bus.publish(event("invoice.created")).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("invoice.created".to_string(), true),
            ("invoice.paid".to_string(), true),
            ("invoice.created".to_string(), false),
        ]
    );
}

#[tokio::test]
async fn replay_keeps_original_identity() {
    let (bus, _) = bus();
    let recorder = Recorder::new();
    bus.subscribe("**", recorder.handler(), sync_at(0)).unwrap();

    let original = Event::builder("audit.login", "auth")
        .field("user", "ada")
        .build()
        .unwrap();
    bus.publish(original.as_replay()).await.unwrap();

    let events = recorder.events();
    let replayed = &events[0];
    assert_eq!(replayed.id(), original.id());
    assert_eq!(replayed.timestamp(), original.timestamp());
    assert_eq!(replayed.payload(), original.payload());
    assert!(replayed.is_replay());
}
