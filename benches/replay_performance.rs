use criterion::{Criterion, black_box, criterion_group, criterion_main};
use raceday::{EventBus, HeaderTemplate, RaceCursor, race};
use std::io::Write;
use tempfile::NamedTempFile;

const TOTAL_TIME_MS: u32 = 60_000;
const RACERS: u32 = 10;

/// Writes a synthetic one-minute race with telemetry every 10ms per racer
/// and a leaderboard every second.
fn synthetic_race_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Name:Benchmark Run").unwrap();
    writeln!(file, "Track:oval").unwrap();
    writeln!(file, "Width:5").unwrap();
    writeln!(file, "Height:4").unwrap();
    writeln!(file, "Distance:500.0").unwrap();
    writeln!(file, "Time:{TOTAL_TIME_MS}").unwrap();
    writeln!(file, "Participants:{RACERS}").unwrap();
    for id in 1..=RACERS {
        writeln!(file, "#{id}:Racer {id}:0.0").unwrap();
    }
    for time in (0..TOTAL_TIME_MS).step_by(10) {
        for id in 1..=RACERS {
            let distance = (time + id) as f64 / 100.0;
            writeln!(file, "$T:{time}:{id}:{distance:.2}:0").unwrap();
        }
        if time % 1000 == 0 {
            write!(file, "$L:{time}").unwrap();
            for id in 1..=RACERS {
                write!(file, ":{id}").unwrap();
            }
            writeln!(file).unwrap();
        }
    }
    file.flush().unwrap();
    file
}

fn bench_load(c: &mut Criterion) {
    let file = synthetic_race_file();
    let template = HeaderTemplate::default();

    let mut group = c.benchmark_group("load");
    group.sample_size(20);
    group.bench_function("load_one_minute_race", |b| {
        b.iter(|| black_box(race::load_race(file.path(), &template).unwrap()));
    });
    group.finish();
}

fn bench_seek(c: &mut Criterion) {
    let file = synthetic_race_file();
    let loaded = race::load_race(file.path(), &HeaderTemplate::default()).unwrap();
    let mut bus = EventBus::new();

    let mut group = c.benchmark_group("seek");
    group.bench_function("forward_full_race", |b| {
        b.iter(|| {
            let mut cursor = RaceCursor::new(TOTAL_TIME_MS);
            cursor
                .seek_to(TOTAL_TIME_MS as i64, &loaded.timeline, &mut bus)
                .unwrap();
            black_box(cursor.current_time_ms())
        });
    });
    group.bench_function("backward_full_race", |b| {
        b.iter(|| {
            let mut cursor = RaceCursor::new(TOTAL_TIME_MS);
            cursor
                .seek_to(TOTAL_TIME_MS as i64, &loaded.timeline, &mut bus)
                .unwrap();
            cursor.seek_to(0, &loaded.timeline, &mut bus).unwrap();
            black_box(cursor.current_time_ms())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_load, bench_seek);
criterion_main!(benches);
