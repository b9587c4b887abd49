use std::collections::HashSet;

use crate::errors::RacedayError;
use crate::events::{EventBus, RaceEvent};
use crate::race::{Message, Timeline};

/// Time cursor over one loaded race.
///
/// A bounded counter over `[0, total_time_ms]` whose transition function
/// differs by direction. Forward motion catches an observer up on everything
/// since the last position, so it replays every bucket in `[old, new)` in
/// order. Backward motion is a jump to an earlier point, where only the
/// freshest telemetry/leaderboard snapshot matters; replaying full history
/// there would emit stale duplicates. Crossings are transient and never
/// replayed backward.
pub struct RaceCursor {
    current_time_ms: u32,
    total_time_ms: u32,
    hidden_racer_ids: HashSet<u32>,
}

impl RaceCursor {
    pub fn new(total_time_ms: u32) -> Self {
        Self {
            current_time_ms: 0,
            total_time_ms,
            hidden_racer_ids: HashSet::new(),
        }
    }

    pub fn current_time_ms(&self) -> u32 {
        self.current_time_ms
    }

    pub fn total_time_ms(&self) -> u32 {
        self.total_time_ms
    }

    /// Moves the cursor by `delta_ms`, which may be negative.
    pub fn advance(
        &mut self,
        delta_ms: i64,
        timeline: &Timeline,
        bus: &mut EventBus,
    ) -> Result<(), RacedayError> {
        self.seek_to(self.current_time_ms as i64 + delta_ms, timeline, bus)
    }

    /// Moves the cursor to `target_ms`, clamped to the race duration, and
    /// emits what an observer needs to catch up: one `RaceComplete` if the
    /// unclamped target overran the race, one unconditional `TimeChanged`,
    /// then the direction-dependent message replay.
    pub fn seek_to(
        &mut self,
        target_ms: i64,
        timeline: &Timeline,
        bus: &mut EventBus,
    ) -> Result<(), RacedayError> {
        if target_ms < 0 {
            return Err(RacedayError::InvalidSeekTarget { target_ms });
        }
        let old_ms = self.current_time_ms;
        let overran = target_ms > self.total_time_ms as i64;
        let new_ms = if overran {
            self.total_time_ms
        } else {
            target_ms as u32
        };
        self.current_time_ms = new_ms;

        if overran {
            bus.publish(&RaceEvent::RaceComplete);
        }
        bus.publish(&RaceEvent::TimeChanged { old_ms, new_ms });

        if new_ms > old_ms {
            self.replay_forward(old_ms, new_ms, timeline, bus);
        } else {
            self.replay_backward(new_ms, old_ms, timeline, bus);
        }
        Ok(())
    }

    /// Emits every message in `[from_ms, to_ms)` in time-then-file order,
    /// suppressing telemetry of hidden racers. Suppressed messages are
    /// dropped outright, never buffered for later.
    fn replay_forward(&self, from_ms: u32, to_ms: u32, timeline: &Timeline, bus: &mut EventBus) {
        for message in timeline.range(from_ms, to_ms) {
            if self.is_visible(message) {
                bus.publish(&RaceEvent::Message(message.clone()));
            }
        }
    }

    /// Emits at most one telemetry message (the first in the window that is
    /// not hidden) and at most one leaderboard message from `[from_ms,
    /// to_ms)`, scanning in increasing time order. Crossings never replay
    /// backward.
    fn replay_backward(&self, from_ms: u32, to_ms: u32, timeline: &Timeline, bus: &mut EventBus) {
        let mut found_telemetry = false;
        let mut found_leaderboard = false;
        for message in timeline.range(from_ms, to_ms) {
            match message {
                Message::Telemetry { .. } if !found_telemetry && self.is_visible(message) => {
                    bus.publish(&RaceEvent::Message(message.clone()));
                    found_telemetry = true;
                }
                Message::Leaderboard { .. } if !found_leaderboard => {
                    bus.publish(&RaceEvent::Message(message.clone()));
                    found_leaderboard = true;
                }
                _ => {}
            }
            if found_telemetry && found_leaderboard {
                break;
            }
        }
    }

    /// Hides (`visible == false`) or unhides a racer. Only future forward
    /// replay is affected; nothing already delivered is retracted.
    pub fn toggle_participant(&mut self, racer_id: u32, visible: bool) {
        if visible {
            self.hidden_racer_ids.remove(&racer_id);
        } else {
            self.hidden_racer_ids.insert(racer_id);
        }
    }

    pub fn hidden_racer_ids(&self) -> &HashSet<u32> {
        &self.hidden_racer_ids
    }

    fn is_visible(&self, message: &Message) -> bool {
        match message {
            Message::Telemetry { racer_id, .. } => !self.hidden_racer_ids.contains(racer_id),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::events::EventChannel;

    use super::*;

    fn telemetry(timestamp_ms: u32, racer_id: u32) -> Message {
        Message::Telemetry {
            timestamp_ms,
            racer_id,
            distance: 1.25,
            lap: 0,
        }
    }

    fn crossing(timestamp_ms: u32, racer_id: u32) -> Message {
        Message::Crossing {
            timestamp_ms,
            racer_id,
            lap: 1,
            finished: false,
        }
    }

    fn leaderboard(timestamp_ms: u32) -> Message {
        Message::Leaderboard {
            timestamp_ms,
            order: vec![1, 2],
        }
    }

    /// Timeline used across the tests: telemetry at 0 and 500 for racer 1,
    /// telemetry at 600 for racer 2, a crossing at 1000, a leaderboard at
    /// 1500, over a 3000ms race.
    fn sample_timeline() -> Timeline {
        let mut timeline = Timeline::with_total_time(3000);
        timeline.push(telemetry(0, 1));
        timeline.push(telemetry(500, 1));
        timeline.push(telemetry(600, 2));
        timeline.push(crossing(1000, 1));
        timeline.push(leaderboard(1500));
        timeline
    }

    fn recording_bus() -> (EventBus, Rc<RefCell<Vec<RaceEvent>>>) {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for channel in [
            EventChannel::Message,
            EventChannel::TimeChanged,
            EventChannel::RaceComplete,
        ] {
            let seen = Rc::clone(&seen);
            bus.subscribe(channel, move |event| seen.borrow_mut().push(event.clone()));
        }
        (bus, seen)
    }

    fn messages_only(events: &[RaceEvent]) -> Vec<Message> {
        events
            .iter()
            .filter_map(|event| match event {
                RaceEvent::Message(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_negative_target_rejected() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        assert!(matches!(
            cursor.seek_to(-1, &timeline, &mut bus),
            Err(RacedayError::InvalidSeekTarget { target_ms: -1 })
        ));
        // a rejected seek emits nothing and moves nothing
        assert!(seen.borrow().is_empty());
        assert_eq!(cursor.current_time_ms(), 0);
    }

    #[test]
    fn test_forward_replays_everything_in_order() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.seek_to(2000, &timeline, &mut bus).unwrap();

        let events = seen.borrow();
        assert_eq!(
            events[0],
            RaceEvent::TimeChanged {
                old_ms: 0,
                new_ms: 2000
            }
        );
        assert_eq!(
            messages_only(&events),
            vec![
                telemetry(0, 1),
                telemetry(500, 1),
                telemetry(600, 2),
                crossing(1000, 1),
                leaderboard(1500),
            ]
        );
    }

    #[test]
    fn test_forward_window_excludes_target_bucket() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        // [0, 500): the bucket at 500 itself must not replay yet
        cursor.seek_to(500, &timeline, &mut bus).unwrap();
        assert_eq!(messages_only(&seen.borrow()), vec![telemetry(0, 1)]);

        // the next forward step picks it up
        seen.borrow_mut().clear();
        cursor.seek_to(501, &timeline, &mut bus).unwrap();
        assert_eq!(messages_only(&seen.borrow()), vec![telemetry(500, 1)]);
    }

    #[test]
    fn test_no_op_seek_still_fires_time_changed() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.seek_to(0, &timeline, &mut bus).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![RaceEvent::TimeChanged {
                old_ms: 0,
                new_ms: 0
            }]
        );
    }

    #[test]
    fn test_backward_emits_earliest_snapshot_only() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.seek_to(2000, &timeline, &mut bus).unwrap();
        seen.borrow_mut().clear();

        cursor.seek_to(400, &timeline, &mut bus).unwrap();

        let events = seen.borrow();
        assert_eq!(
            events[0],
            RaceEvent::TimeChanged {
                old_ms: 2000,
                new_ms: 400
            }
        );
        // window [400, 2000): earliest telemetry is t=500, earliest
        // leaderboard is t=1500, the crossing at t=1000 never replays
        assert_eq!(
            messages_only(&events),
            vec![telemetry(500, 1), leaderboard(1500)]
        );
    }

    #[test]
    fn test_backward_without_leaderboard_in_window() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.seek_to(1000, &timeline, &mut bus).unwrap();
        seen.borrow_mut().clear();

        cursor.seek_to(500, &timeline, &mut bus).unwrap();
        // window [500, 1000) holds two telemetry messages and nothing else;
        // only the earliest replays
        assert_eq!(messages_only(&seen.borrow()), vec![telemetry(500, 1)]);
    }

    #[test]
    fn test_clamp_fires_single_race_complete() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.seek_to(9999, &timeline, &mut bus).unwrap();

        assert_eq!(cursor.current_time_ms(), 3000);
        let events = seen.borrow();
        assert_eq!(events[0], RaceEvent::RaceComplete);
        assert_eq!(
            events[1],
            RaceEvent::TimeChanged {
                old_ms: 0,
                new_ms: 3000
            }
        );
        let completions = events
            .iter()
            .filter(|event| **event == RaceEvent::RaceComplete)
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_seek_to_exact_end_is_not_completion() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.seek_to(3000, &timeline, &mut bus).unwrap();
        assert!(!seen.borrow().contains(&RaceEvent::RaceComplete));
    }

    #[test]
    fn test_hidden_racer_telemetry_suppressed_forward() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.toggle_participant(1, false);
        cursor.seek_to(2000, &timeline, &mut bus).unwrap();

        // racer 1's telemetry vanishes; their crossing and the leaderboard
        // still replay
        assert_eq!(
            messages_only(&seen.borrow()),
            vec![telemetry(600, 2), crossing(1000, 1), leaderboard(1500)]
        );
    }

    #[test]
    fn test_hidden_racer_skipped_backward() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.toggle_participant(1, false);
        cursor.seek_to(2000, &timeline, &mut bus).unwrap();
        seen.borrow_mut().clear();

        cursor.seek_to(100, &timeline, &mut bus).unwrap();
        // the first visible telemetry in [100, 2000) is racer 2's at t=600
        assert_eq!(
            messages_only(&seen.borrow()),
            vec![telemetry(600, 2), leaderboard(1500)]
        );
    }

    #[test]
    fn test_toggle_back_on_restores_future_replay() {
        let timeline = sample_timeline();
        let (mut bus, seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.toggle_participant(1, false);
        cursor.seek_to(100, &timeline, &mut bus).unwrap();
        seen.borrow_mut().clear();

        // suppressed messages were dropped, not buffered: unhiding does not
        // re-deliver the t=0 telemetry, only later buckets replay normally
        cursor.toggle_participant(1, true);
        cursor.seek_to(700, &timeline, &mut bus).unwrap();
        assert_eq!(
            messages_only(&seen.borrow()),
            vec![telemetry(500, 1), telemetry(600, 2)]
        );
    }

    #[test]
    fn test_advance_is_relative() {
        let timeline = sample_timeline();
        let (mut bus, _seen) = recording_bus();
        let mut cursor = RaceCursor::new(3000);

        cursor.advance(700, &timeline, &mut bus).unwrap();
        assert_eq!(cursor.current_time_ms(), 700);

        cursor.advance(-200, &timeline, &mut bus).unwrap();
        assert_eq!(cursor.current_time_ms(), 500);

        assert!(cursor.advance(-501, &timeline, &mut bus).is_err());
        assert_eq!(cursor.current_time_ms(), 500);
    }
}
