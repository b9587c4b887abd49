pub(crate) mod template;
pub(crate) mod timeline;
pub(crate) mod validator;

use std::fmt;

pub use template::HeaderTemplate;
pub use timeline::Timeline;
pub use validator::{LoadedRace, load_race};

use crate::errors::RacedayError;

/// Tag field that opens a telemetry message line.
pub const TELEMETRY_TAG: &str = "$T";
/// Tag field that opens a leaderboard message line.
pub const LEADERBOARD_TAG: &str = "$L";
/// Tag field that opens a line-crossing message line.
pub const CROSSING_TAG: &str = "$C";

const SEPARATOR: char = ':';

/// Race metadata parsed from the seven header lines of a race file.
/// Immutable once constructed; a new header only appears through a full
/// successful load.
#[derive(Clone, Debug, PartialEq)]
pub struct RaceHeader {
    /// Human-readable race name (e.g., "Grand Finale 500")
    pub race_name: String,
    /// Track geometry identifier understood by the presentation layer
    pub track_type: String,
    /// Track width ratio unit
    pub width: u32,
    /// Track height ratio unit
    pub height: u32,
    /// Distance of a single lap
    pub lap_distance: f64,
    /// Total race duration in milliseconds
    pub total_time_ms: u32,
    /// Number of declared participants
    pub participant_count: u32,
}

impl fmt::Display for RaceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Race name: {}", self.race_name)?;
        writeln!(f, "Track type: {}", self.track_type)?;
        writeln!(f, "Total time: {}ms", self.total_time_ms)?;
        write!(f, "Lap distance: {}", self.lap_distance)
    }
}

/// A declared race participant.
#[derive(Clone, Debug, PartialEq)]
pub struct Racer {
    /// Racer id, unique within a race, always in 1..=99
    pub id: u32,
    /// Racer display name
    pub name: String,
    /// Distance from the start/finish line at race start
    pub start_distance: f64,
}

/// Discriminant for the three message kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Telemetry,
    Leaderboard,
    Crossing,
}

impl MessageKind {
    pub fn tag(&self) -> &'static str {
        match self {
            MessageKind::Telemetry => TELEMETRY_TAG,
            MessageKind::Leaderboard => LEADERBOARD_TAG,
            MessageKind::Crossing => CROSSING_TAG,
        }
    }
}

/// One timestamped event from a race file.
///
/// Values are immutable; the colon-delimited `Display` encoding matches the
/// on-disk line format and round-trips through [`Message::parse`].
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Position report for one racer
    Telemetry {
        timestamp_ms: u32,
        racer_id: u32,
        /// Distance traveled this lap, carried at two-decimal precision
        distance: f64,
        lap: u32,
    },
    /// Full standings snapshot, leader first
    Leaderboard { timestamp_ms: u32, order: Vec<u32> },
    /// A racer crossing the start/finish line
    Crossing {
        timestamp_ms: u32,
        racer_id: u32,
        lap: u32,
        finished: bool,
    },
}

impl Message {
    pub fn timestamp_ms(&self) -> u32 {
        match self {
            Message::Telemetry { timestamp_ms, .. }
            | Message::Leaderboard { timestamp_ms, .. }
            | Message::Crossing { timestamp_ms, .. } => *timestamp_ms,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Telemetry { .. } => MessageKind::Telemetry,
            Message::Leaderboard { .. } => MessageKind::Leaderboard,
            Message::Crossing { .. } => MessageKind::Crossing,
        }
    }

    /// Parses one message line, enforcing the structural rules every message
    /// of that kind must satisfy regardless of which race it belongs to:
    /// field counts, numeric formats, two-decimal telemetry distance, lap
    /// bounds, and the literal `true`/`false` crossing flag. Contextual rules
    /// (declared racer ids, leaderboard length, timestamp within the race)
    /// are the validator's job.
    pub fn parse(line: &str) -> Result<Message, RacedayError> {
        let malformed = || RacedayError::MalformedMessage {
            line: line.to_string(),
        };
        let fields: Vec<&str> = line.split(SEPARATOR).collect();
        match fields[0] {
            TELEMETRY_TAG => {
                if fields.len() != 5 {
                    return Err(malformed());
                }
                let timestamp_ms: u32 = fields[1].parse().map_err(|_| malformed())?;
                let racer_id: u32 = fields[2].parse().map_err(|_| malformed())?;
                let distance = parse_two_decimal(fields[3]).ok_or_else(malformed)?;
                let lap: u32 = fields[4].parse().map_err(|_| malformed())?;
                Ok(Message::Telemetry {
                    timestamp_ms,
                    racer_id,
                    distance,
                    lap,
                })
            }
            LEADERBOARD_TAG => {
                if fields.len() < 2 {
                    return Err(malformed());
                }
                let timestamp_ms: u32 = fields[1].parse().map_err(|_| malformed())?;
                let order = fields[2..]
                    .iter()
                    .map(|f| f.parse::<u32>().map_err(|_| malformed()))
                    .collect::<Result<Vec<u32>, RacedayError>>()?;
                Ok(Message::Leaderboard {
                    timestamp_ms,
                    order,
                })
            }
            CROSSING_TAG => {
                if fields.len() != 5 {
                    return Err(malformed());
                }
                let timestamp_ms: u32 = fields[1].parse().map_err(|_| malformed())?;
                let racer_id: u32 = fields[2].parse().map_err(|_| malformed())?;
                let lap: u32 = fields[3].parse().map_err(|_| malformed())?;
                if lap < 1 {
                    return Err(malformed());
                }
                // Only the exact literals count; "TRUE" or "1" reject the file
                let finished = match fields[4] {
                    "true" => true,
                    "false" => false,
                    _ => return Err(malformed()),
                };
                Ok(Message::Crossing {
                    timestamp_ms,
                    racer_id,
                    lap,
                    finished,
                })
            }
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Telemetry {
                timestamp_ms,
                racer_id,
                distance,
                lap,
            } => write!(
                f,
                "{TELEMETRY_TAG}:{timestamp_ms}:{racer_id}:{distance:.2}:{lap}"
            ),
            Message::Leaderboard {
                timestamp_ms,
                order,
            } => {
                write!(f, "{LEADERBOARD_TAG}:{timestamp_ms}")?;
                for id in order {
                    write!(f, ":{id}")?;
                }
                Ok(())
            }
            Message::Crossing {
                timestamp_ms,
                racer_id,
                lap,
                finished,
            } => write!(
                f,
                "{CROSSING_TAG}:{timestamp_ms}:{racer_id}:{lap}:{finished}"
            ),
        }
    }
}

/// Parses a telemetry distance field, requiring exactly two fractional
/// digits. This is a format check, not rounding: "1.5" and "1.500" both
/// reject even though they are parseable numbers.
fn parse_two_decimal(field: &str) -> Option<f64> {
    let dot = field.find('.')?;
    if field.len() - dot != 3 {
        return None;
    }
    field.parse::<f64>().ok()
}
