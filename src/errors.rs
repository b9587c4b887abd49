// Error types for raceday

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum RacedayError {
    // Errors while reading a race file from disk
    #[snafu(display("Unable to read race file"))]
    RaceFileIo { source: io::Error },

    // Validation errors; every one of these rejects the whole file
    #[snafu(display("Malformed header line {line_no}: {reason}"))]
    MalformedHeader { line_no: usize, reason: String },
    #[snafu(display("Malformed participant line: {line}"))]
    MalformedParticipant { line: String },
    #[snafu(display("Racer id {id} outside the allowed 1..=99 range"))]
    RacerIdOutOfRange { id: u32 },
    #[snafu(display("Message references undeclared racer id {id}"))]
    UnregisteredRacer { id: u32 },
    #[snafu(display("Malformed message line: {line}"))]
    MalformedMessage { line: String },
    #[snafu(display("Racer id {id} listed twice in one leaderboard"))]
    DuplicateLeaderboardEntry { id: u32 },
    #[snafu(display("Message stamped {timestamp_ms}ms but the race ends at {total_time_ms}ms"))]
    MessageAfterRaceEnd { timestamp_ms: u32, total_time_ms: u32 },

    // Cursor errors
    #[snafu(display("Seek target {target_ms}ms is negative"))]
    InvalidSeekTarget { target_ms: i64 },
    #[snafu(display("No race is loaded"))]
    NoRaceLoaded,

    // Header template config errors
    #[snafu(display("Could not find application config directory for the header template"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing header template file"))]
    TemplateIo { source: io::Error },
    #[snafu(display("Error serializing header template file"))]
    TemplateSerialize { source: serde_json::Error },
}

impl RacedayError {
    /// Whether this error means a race file was rejected by validation, as
    /// opposed to an I/O, config, or cursor failure. Callers that only need
    /// a "bad file" verdict can collapse on this.
    pub fn is_load_rejection(&self) -> bool {
        matches!(
            self,
            RacedayError::MalformedHeader { .. }
                | RacedayError::MalformedParticipant { .. }
                | RacedayError::RacerIdOutOfRange { .. }
                | RacedayError::UnregisteredRacer { .. }
                | RacedayError::MalformedMessage { .. }
                | RacedayError::DuplicateLeaderboardEntry { .. }
                | RacedayError::MessageAfterRaceEnd { .. }
        )
    }
}
