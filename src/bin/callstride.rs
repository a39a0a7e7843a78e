//! Callstride CLI - replay recorded event traces through the engine
//!
//! Commands:
//! - replay: run a telephony/sensor event trace and print the resulting sessions
//! - export: run a trace and print the JSON export document

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use callstride::export::export_sessions;
use callstride::stats::{millis_to_time_string, PeriodStats};
use callstride::{
    CallEngine, MemoryStore, SessionStore, StaticSettings, TrackError, TrackerEvent,
    ENGINE_VERSION,
};

/// Callstride - step tracking for phone calls
#[derive(Parser)]
#[command(name = "callstride")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Replay call/sensor event traces through the step tracking engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an event trace and print the resulting sessions
    Replay {
        /// Input trace path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Keep sessions without any steps
        #[arg(long)]
        store_empty: bool,

        /// Attach caller identifiers to sessions
        #[arg(long)]
        store_numbers: bool,

        /// Print the reconstructed minute profile of each session
        #[arg(long)]
        profile: bool,

        /// Output machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run an event trace and print the JSON export document
    Export {
        /// Input trace path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Keep sessions without any steps
        #[arg(long)]
        store_empty: bool,

        /// Attach caller identifiers and include them in the export
        #[arg(long)]
        include_numbers: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Track(#[from] TrackError),

    #[error("invalid trace: {0}")]
    Parse(String),

    #[error("stdin is a terminal; pass --input FILE or pipe a trace")]
    NoInput,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Replay {
            input,
            input_format,
            store_empty,
            store_numbers,
            profile,
            json,
        } => {
            let events = read_events(&input, input_format)?;
            let engine = replay(events, store_empty, store_numbers)?;
            if json {
                print_json(&engine)?;
            } else {
                print_text(&engine, profile)?;
            }
            Ok(())
        }
        Commands::Export {
            input,
            input_format,
            store_empty,
            include_numbers,
        } => {
            let events = read_events(&input, input_format)?;
            let engine = replay(events, store_empty, include_numbers)?;
            println!("{}", export_sessions(engine.store(), include_numbers)?);
            Ok(())
        }
    }
}

fn read_events(path: &PathBuf, format: InputFormat) -> Result<Vec<TrackerEvent>, CliError> {
    let raw = if path.as_os_str() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(CliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };

    match format {
        InputFormat::Ndjson => raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| CliError::Parse(format!("{}: {}", e, line)))
            })
            .collect(),
        InputFormat::Json => {
            serde_json::from_str(&raw).map_err(|e| CliError::Parse(e.to_string()))
        }
    }
}

fn replay(
    events: Vec<TrackerEvent>,
    store_empty: bool,
    store_numbers: bool,
) -> Result<CallEngine<MemoryStore>, CliError> {
    let mut engine = CallEngine::new(MemoryStore::new()).with_settings(StaticSettings {
        store_empty_sessions: store_empty,
        store_phone_numbers: store_numbers,
    });

    for event in events {
        engine.dispatch(event)?;
    }

    Ok(engine)
}

fn print_text(engine: &CallEngine<MemoryStore>, profile: bool) -> Result<(), CliError> {
    let sessions = engine.store().load_sessions()?;
    println!("sessions: {}", sessions.len());

    for (index, (id, record)) in sessions.iter().enumerate() {
        println!(
            "#{} {}  {}  duration {}  steps {}{}",
            index + 1,
            record.started_at.format("%Y-%m-%d %H:%M:%S"),
            if record.incoming { "incoming" } else { "outgoing" },
            millis_to_time_string(record.duration_ms),
            record.step_count,
            match &record.caller_id {
                Some(caller_id) => format!("  caller {}", caller_id),
                None => String::new(),
            }
        );

        if profile {
            let series = engine.reconstruct(*id)?;
            let minutes: Vec<String> = series.minutes.iter().map(u64::to_string).collect();
            println!(
                "   minutes: [{}]  sum {}  max {}  avg {}",
                minutes.join(" "),
                series.step_sum,
                series.max_steps,
                series.avg_steps
            );
        }
    }

    let records: Vec<_> = sessions.into_iter().map(|(_, record)| record).collect();
    let stats = PeriodStats::for_sessions(&records);
    println!(
        "total: {} steps over {}  (mean {} steps/session)",
        stats.total_steps,
        millis_to_time_string(stats.total_duration_ms),
        stats.mean_steps
    );

    Ok(())
}

fn print_json(engine: &CallEngine<MemoryStore>) -> Result<(), CliError> {
    let sessions = engine.store().load_sessions()?;

    let mut exported = Vec::with_capacity(sessions.len());
    for (id, record) in &sessions {
        let series = engine.reconstruct(*id)?;
        exported.push(serde_json::json!({
            "id": id,
            "session": record,
            "series": series,
        }));
    }

    let records: Vec<_> = sessions.into_iter().map(|(_, record)| record).collect();
    let document = serde_json::json!({
        "sessions": exported,
        "stats": PeriodStats::for_sessions(&records),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&document).map_err(TrackError::from)?
    );

    Ok(())
}
