use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use itertools::Itertools;
use log::{debug, info};

use super::{HeaderTemplate, Message, Racer, RaceHeader, Timeline};
use crate::errors::RacedayError;

/// Everything a successful load produces. Built entirely in staging: the
/// caller only sees a `LoadedRace` once the whole file has validated, so a
/// rejected file can never leave partial state behind.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedRace {
    pub header: RaceHeader,
    pub racers: Vec<Racer>,
    pub timeline: Timeline,
    /// Per-racer finish flag taken from crossing messages. Repeated finish
    /// crossings for one racer are tolerated; the last one wins.
    pub finished: HashMap<u32, bool>,
}

/// Validates a race file against `template` and indexes its messages by
/// millisecond. Any violation anywhere in the file rejects the whole file.
pub fn load_race(path: &Path, template: &HeaderTemplate) -> Result<LoadedRace, RacedayError> {
    info!("Loading race file {:?}", path);
    let file = File::open(path).map_err(|e| RacedayError::RaceFileIo { source: e })?;
    let mut lines = BufReader::new(file).lines();

    let header = check_header(&mut lines, template)?;
    debug!(
        "Header accepted: {} on {} ({}ms, {} participants)",
        header.race_name, header.track_type, header.total_time_ms, header.participant_count
    );

    let racers = check_participants(&mut lines, header.participant_count)?;
    let declared_ids: HashSet<u32> = racers.iter().map(|r| r.id).collect();

    let mut timeline = Timeline::with_total_time(header.total_time_ms);
    let mut finished: HashMap<u32, bool> = HashMap::new();
    for line in lines {
        let line = line.map_err(|e| RacedayError::RaceFileIo { source: e })?;
        let message = Message::parse(&line)?;
        check_message(&message, &declared_ids, &header)?;
        if let Message::Crossing {
            racer_id,
            finished: finish_flag,
            ..
        } = message
        {
            finished.insert(racer_id, finish_flag);
        }
        timeline.push(message);
    }

    info!(
        "Loaded {:?}: {} racers, {} messages over {}ms",
        path,
        racers.len(),
        timeline.message_count(),
        header.total_time_ms
    );
    Ok(LoadedRace {
        header,
        racers,
        timeline,
        finished,
    })
}

/// Checks the first seven lines against the template prefixes, in fixed
/// order, and extracts the header fields from whatever follows each prefix.
fn check_header(
    lines: &mut Lines<BufReader<File>>,
    template: &HeaderTemplate,
) -> Result<RaceHeader, RacedayError> {
    let mut remainders: Vec<String> = Vec::with_capacity(7);
    for (line_no, (field, prefix)) in template.prefixes().into_iter().enumerate() {
        let line = next_line(lines)?.ok_or_else(|| RacedayError::MalformedHeader {
            line_no,
            reason: format!("missing {field} line"),
        })?;
        if line.len() < prefix.len() || !line.starts_with(prefix) {
            return Err(RacedayError::MalformedHeader {
                line_no,
                reason: format!("expected the {field} prefix {prefix:?}"),
            });
        }
        remainders.push(line[prefix.len()..].to_string());
    }

    let numeric = |line_no: usize, field: &str| -> Result<u32, RacedayError> {
        remainders[line_no]
            .parse()
            .map_err(|_| RacedayError::MalformedHeader {
                line_no,
                reason: format!("{field} is not a non-negative integer"),
            })
    };

    Ok(RaceHeader {
        race_name: remainders[0].clone(),
        track_type: remainders[1].clone(),
        width: numeric(2, "width")?,
        height: numeric(3, "height")?,
        lap_distance: remainders[4]
            .parse()
            .map_err(|_| RacedayError::MalformedHeader {
                line_no: 4,
                reason: "lap distance is not a number".to_string(),
            })?,
        total_time_ms: numeric(5, "total time")?,
        participant_count: numeric(6, "participant count")?,
    })
}

/// Reads exactly `participant_count` declaration lines of the form
/// `#<id>:<name>:<start distance>`. Declared ids must be unique and inside
/// 1..=99.
fn check_participants(
    lines: &mut Lines<BufReader<File>>,
    participant_count: u32,
) -> Result<Vec<Racer>, RacedayError> {
    let mut racers = Vec::with_capacity(participant_count as usize);
    let mut seen_ids: HashSet<u32> = HashSet::new();
    for _ in 0..participant_count {
        let line = next_line(lines)?.ok_or_else(|| RacedayError::MalformedParticipant {
            line: "<missing participant line>".to_string(),
        })?;
        let malformed = || RacedayError::MalformedParticipant { line: line.clone() };

        let body = line.strip_prefix('#').ok_or_else(malformed)?;
        let fields: Vec<&str> = body.split(':').collect();
        if fields.len() != 3 {
            return Err(malformed());
        }
        let id: u32 = fields[0].parse().map_err(|_| malformed())?;
        if !(1..=99).contains(&id) {
            return Err(RacedayError::RacerIdOutOfRange { id });
        }
        if !seen_ids.insert(id) {
            return Err(malformed());
        }
        let start_distance: f64 = fields[2].parse().map_err(|_| malformed())?;
        racers.push(Racer {
            id,
            name: fields[1].to_string(),
            start_distance,
        });
    }
    Ok(racers)
}

/// Contextual checks a structurally sound message must still pass for this
/// particular race.
fn check_message(
    message: &Message,
    declared_ids: &HashSet<u32>,
    header: &RaceHeader,
) -> Result<(), RacedayError> {
    if message.timestamp_ms() > header.total_time_ms {
        return Err(RacedayError::MessageAfterRaceEnd {
            timestamp_ms: message.timestamp_ms(),
            total_time_ms: header.total_time_ms,
        });
    }
    match message {
        Message::Telemetry { racer_id, .. } | Message::Crossing { racer_id, .. } => {
            if !declared_ids.contains(racer_id) {
                return Err(RacedayError::UnregisteredRacer { id: *racer_id });
            }
        }
        Message::Leaderboard { order, .. } => {
            if order.len() != header.participant_count as usize {
                return Err(RacedayError::MalformedMessage {
                    line: message.to_string(),
                });
            }
            if let Some(id) = order.iter().find(|id| !declared_ids.contains(id)) {
                return Err(RacedayError::UnregisteredRacer { id: *id });
            }
            if let Some(id) = order.iter().duplicates().next() {
                return Err(RacedayError::DuplicateLeaderboardEntry { id: *id });
            }
        }
    }
    Ok(())
}

fn next_line(lines: &mut Lines<BufReader<File>>) -> Result<Option<String>, RacedayError> {
    lines
        .next()
        .transpose()
        .map_err(|e| RacedayError::RaceFileIo { source: e })
}
