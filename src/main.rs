use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use raceday::{EventChannel, RaceEngine, RaceEvent, RacedayError};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a race file and print its header and roster
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Replay a race file to stdout, stepping the cursor to the end
    Replay {
        #[arg(short, long)]
        input: PathBuf,

        /// Cursor step per tick, in milliseconds
        #[arg(short, long, default_value_t = 100)]
        step: i64,
    },
}

fn inspect(input: &PathBuf) -> Result<(), RacedayError> {
    let mut engine = RaceEngine::with_local_template();
    engine.load_race(input)?;

    // load_race guarantees both are present on success
    if let Some(header) = engine.header() {
        println!("{header}");
    }
    if let Some(racers) = engine.racers() {
        println!("Participants:");
        for racer in racers {
            let finished = if engine.has_finished(racer.id) {
                " (finished)"
            } else {
                ""
            };
            println!(
                "  #{:02} {} starting at {}{}",
                racer.id, racer.name, racer.start_distance, finished
            );
        }
    }
    Ok(())
}

fn replay(input: &PathBuf, step: i64) -> Result<(), RacedayError> {
    let mut engine = RaceEngine::with_local_template();
    engine.subscribe(EventChannel::HeaderReady, |event| {
        if let RaceEvent::HeaderReady(header) = event {
            println!("=== {} ===", header.race_name);
        }
    });
    engine.subscribe(EventChannel::Message, |event| {
        if let RaceEvent::Message(message) = event {
            println!("{message}");
        }
    });
    let completed = Rc::new(Cell::new(false));
    {
        let completed = Rc::clone(&completed);
        engine.subscribe(EventChannel::RaceComplete, move |_| {
            completed.set(true);
            println!("=== race complete ===");
        });
    }
    engine.load_race(input)?;

    let total_time_ms = engine
        .header()
        .map(|header| header.total_time_ms)
        .unwrap_or(0);
    while engine.current_time_ms().unwrap_or(0) < total_time_ms {
        engine.advance(step)?;
    }
    if !completed.get() {
        // the last step landed exactly on the finish; run past it so the
        // completion notification still fires
        engine.advance(1)?;
    }
    Ok(())
}

fn main() {
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");
    match &cli.command {
        Commands::Inspect { input } => {
            inspect(input).expect("Error while inspecting race file");
        }
        Commands::Replay { input, step } => {
            replay(input, *step).expect("Error while replaying race file");
        }
    };
}
