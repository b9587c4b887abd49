// Notification boundary between the replay engine and whatever presents it.
// The engine publishes into named channels; presentation code subscribes
// without the engine ever learning a subscriber's type.

use std::collections::HashMap;

use crate::race::{Message, Racer, RaceHeader};

/// Everything the engine announces to the outside world.
#[derive(Clone, Debug, PartialEq)]
pub enum RaceEvent {
    /// A race file validated and its header is available
    HeaderReady(RaceHeader),
    /// The participant roster for the freshly loaded race
    RacerList(Vec<Racer>),
    /// One replayed message
    Message(Message),
    /// The cursor moved; fired on every seek, even a no-op one, so observers
    /// can resync a progress indicator
    TimeChanged { old_ms: u32, new_ms: u32 },
    /// A seek ran past the end of the race
    RaceComplete,
}

/// Subscription channels, one per event variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventChannel {
    HeaderReady,
    RacerList,
    Message,
    TimeChanged,
    RaceComplete,
}

impl RaceEvent {
    pub fn channel(&self) -> EventChannel {
        match self {
            RaceEvent::HeaderReady(_) => EventChannel::HeaderReady,
            RaceEvent::RacerList(_) => EventChannel::RacerList,
            RaceEvent::Message(_) => EventChannel::Message,
            RaceEvent::TimeChanged { .. } => EventChannel::TimeChanged,
            RaceEvent::RaceComplete => EventChannel::RaceComplete,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriberId(u64);

type Subscriber = Box<dyn FnMut(&RaceEvent)>;

/// Single-threaded publish/subscribe hub with deterministic delivery:
/// subscribers of a channel are invoked in registration order. Dispatch
/// borrows the bus mutably, so a subscriber can never mutate the subscriber
/// set re-entrantly; that is enforced at compile time rather than guarded at
/// run time.
#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<EventChannel, Vec<(SubscriberId, Subscriber)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        channel: EventChannel,
        subscriber: impl FnMut(&RaceEvent) + 'static,
    ) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry(channel)
            .or_default()
            .push((id, Box::new(subscriber)));
        id
    }

    /// Removes one subscription. Returns whether the id was still registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        for subscribers in self.subscribers.values_mut() {
            let before = subscribers.len();
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            if subscribers.len() != before {
                return true;
            }
        }
        false
    }

    /// Delivers `event` to every subscriber of its channel, in registration
    /// order.
    pub fn publish(&mut self, event: &RaceEvent) {
        if let Some(subscribers) = self.subscribers.get_mut(&event.channel()) {
            for (_, subscriber) in subscribers.iter_mut() {
                subscriber(event);
            }
        }
    }
}
