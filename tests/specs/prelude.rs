//! Shared helpers for bus specs

pub use evr_core::{
    AsyncHandler, BusConfig, DeliveryMode, DispatchOutcome, Event, EventBus, EventPattern,
    EventQueue, FakeClock, HandlerResult, Payload, SequentialIdGen, SubscribeOptions, SubscriptionId,
    SubscriptionState,
};
pub use serde_json::json;
pub use std::sync::{Arc, Mutex};
pub use std::time::Duration;

pub type SpecBus = EventBus<FakeClock, SequentialIdGen>;

/// A bus on a fake clock with predictable subscription ids
pub fn bus() -> (SpecBus, FakeClock) {
    bus_with(BusConfig::default())
}

pub fn bus_with(config: BusConfig) -> (SpecBus, FakeClock) {
    let clock = FakeClock::new();
    let bus = EventBus::with_deps(config, clock.clone(), SequentialIdGen::default());
    (bus, clock)
}

/// An event with an empty payload
pub fn event(event_type: &str) -> Event {
    Event::new(event_type, "spec", Payload::new()).unwrap()
}

pub fn sync_at(priority: i32) -> SubscribeOptions {
    SubscribeOptions::new().priority(priority)
}

/// Collects every event delivered to its handlers
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> impl Fn(&Event) -> HandlerResult + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |e: &Event| -> HandlerResult {
            events.lock().unwrap().push(e.clone());
            Ok(())
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn types(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| e.event_type().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}
