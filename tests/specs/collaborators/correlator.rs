//! Correlator specs
//!
//! A correlator groups causally related events by `correlation_id`.

use crate::prelude::*;
use similar_asserts::assert_eq;
use std::collections::BTreeMap;

#[tokio::test]
async fn derived_events_share_the_root_correlation() {
    let (bus, _) = bus();
    let correlator = Recorder::new();
    bus.subscribe("order.**", correlator.handler(), sync_at(0))
        .unwrap();

    let placed = event("order.placed");
    let billed = placed.derive("order.billed", Payload::new()).unwrap();
    let shipped = billed.derive("order.shipped", Payload::new()).unwrap();
    let unrelated = event("order.placed");

    for e in [&placed, &billed, &shipped, &unrelated] {
        bus.publish(e.clone()).await.unwrap();
    }

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for e in correlator.events() {
        groups
            .entry(e.correlation_id().to_string())
            .or_default()
            .push(e.event_type().to_string());
    }

    assert_eq!(groups.len(), 2);
    assert_eq!(
        groups[placed.id().as_str()],
        vec!["order.placed", "order.billed", "order.shipped"]
    );
    assert_eq!(shipped.causation_id(), Some(billed.id()));
    assert_eq!(billed.causation_id(), Some(placed.id()));
}

#[tokio::test]
async fn handler_reactions_stay_in_the_chain() {
    let (bus, _) = bus();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let reactor = {
        let bus = bus.clone();
        AsyncHandler::new(move |e: Arc<Event>| {
            let bus = bus.clone();
            async move {
                let reaction = e.derive("order.billed", Payload::new())?;
                bus.publish(reaction).await?;
                HandlerResult::Ok(())
            }
        })
    };
    bus.subscribe(
        "order.placed",
        reactor,
        SubscribeOptions::new().delivery_mode(DeliveryMode::Async),
    )
    .unwrap();
    bus.subscribe(
        "order.billed",
        move |e: &Event| -> HandlerResult {
            tx.send((e.correlation_id().clone(), e.causation_id().cloned()))?;
            Ok(())
        },
        sync_at(0),
    )
    .unwrap();

    let placed = event("order.placed");
    let placed_id = placed.id().clone();
    bus.publish(placed).await.unwrap();

    let (correlation, causation) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(correlation, placed_id);
    assert_eq!(causation, Some(placed_id));
}
