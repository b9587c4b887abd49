pub(crate) mod cursor;

use std::path::Path;

pub use cursor::RaceCursor;

use crate::errors::RacedayError;
use crate::events::{EventBus, EventChannel, RaceEvent, SubscriberId};
use crate::race::{self, HeaderTemplate, LoadedRace, Racer, RaceHeader};

/// The control surface the presentation layer drives.
///
/// Owns the header template, the event bus, and at most one loaded race;
/// loading a new file discards the previous race wholesale. All methods are
/// synchronous and single-threaded; a host embedding this in a threaded
/// environment serializes access itself.
pub struct RaceEngine {
    template: HeaderTemplate,
    bus: EventBus,
    race: Option<ActiveRace>,
}

struct ActiveRace {
    loaded: LoadedRace,
    cursor: RaceCursor,
}

impl RaceEngine {
    pub fn new(template: HeaderTemplate) -> Self {
        Self {
            template,
            bus: EventBus::new(),
            race: None,
        }
    }

    /// Builds an engine from the template saved in the platform config dir,
    /// falling back to the stock prefixes.
    pub fn with_local_template() -> Self {
        Self::new(HeaderTemplate::from_local_file().unwrap_or_default())
    }

    pub fn subscribe(
        &mut self,
        channel: EventChannel,
        subscriber: impl FnMut(&RaceEvent) + 'static,
    ) -> SubscriberId {
        self.bus.subscribe(channel, subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Validates and loads a race file, all-or-nothing. On success the
    /// previous race (if any) is replaced, the hidden-racer set resets, the
    /// cursor rewinds to zero, and `HeaderReady`, `RacerList`, and
    /// `TimeChanged` fire in that order. On failure nothing observable
    /// changes and the previous race stays usable.
    pub fn load_race(&mut self, path: &Path) -> Result<(), RacedayError> {
        let loaded = race::load_race(path, &self.template)?;
        let old_time_ms = self
            .race
            .as_ref()
            .map(|race| race.cursor.current_time_ms())
            .unwrap_or(0);

        let header = loaded.header.clone();
        let racers = loaded.racers.clone();
        self.race = Some(ActiveRace {
            cursor: RaceCursor::new(loaded.header.total_time_ms),
            loaded,
        });

        self.bus.publish(&RaceEvent::HeaderReady(header));
        self.bus.publish(&RaceEvent::RacerList(racers));
        self.bus.publish(&RaceEvent::TimeChanged {
            old_ms: old_time_ms,
            new_ms: 0,
        });
        Ok(())
    }

    pub fn seek_to(&mut self, target_ms: i64) -> Result<(), RacedayError> {
        let race = self.race.as_mut().ok_or(RacedayError::NoRaceLoaded)?;
        race.cursor
            .seek_to(target_ms, &race.loaded.timeline, &mut self.bus)
    }

    pub fn advance(&mut self, delta_ms: i64) -> Result<(), RacedayError> {
        let race = self.race.as_mut().ok_or(RacedayError::NoRaceLoaded)?;
        race.cursor
            .advance(delta_ms, &race.loaded.timeline, &mut self.bus)
    }

    pub fn toggle_participant(&mut self, racer_id: u32, visible: bool) -> Result<(), RacedayError> {
        let race = self.race.as_mut().ok_or(RacedayError::NoRaceLoaded)?;
        race.cursor.toggle_participant(racer_id, visible);
        Ok(())
    }

    pub fn header(&self) -> Option<&RaceHeader> {
        self.race.as_ref().map(|race| &race.loaded.header)
    }

    pub fn racers(&self) -> Option<&[Racer]> {
        self.race.as_ref().map(|race| race.loaded.racers.as_slice())
    }

    pub fn current_time_ms(&self) -> Option<u32> {
        self.race.as_ref().map(|race| race.cursor.current_time_ms())
    }

    /// Whether a racer posted a `finished=true` crossing anywhere in the
    /// loaded race.
    pub fn has_finished(&self, racer_id: u32) -> bool {
        self.race
            .as_ref()
            .and_then(|race| race.loaded.finished.get(&racer_id))
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_require_a_loaded_race() {
        let mut engine = RaceEngine::new(HeaderTemplate::default());

        assert!(matches!(
            engine.seek_to(100),
            Err(RacedayError::NoRaceLoaded)
        ));
        assert!(matches!(engine.advance(1), Err(RacedayError::NoRaceLoaded)));
        assert!(matches!(
            engine.toggle_participant(1, false),
            Err(RacedayError::NoRaceLoaded)
        ));
        assert!(engine.header().is_none());
        assert!(engine.racers().is_none());
        assert!(engine.current_time_ms().is_none());
    }
}
