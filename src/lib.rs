// Library interface for raceday
// This allows integration tests to access internal modules

pub mod errors;
pub mod events;
pub mod race;
pub mod replay;

// Re-export commonly used types
pub use errors::RacedayError;
pub use events::{EventBus, EventChannel, RaceEvent, SubscriberId};
pub use race::{HeaderTemplate, LoadedRace, Message, MessageKind, RaceHeader, Racer, Timeline};
pub use replay::{RaceCursor, RaceEngine};
