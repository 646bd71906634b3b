use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use responder_app::logging;
use responder_app::runner::{self, AppError, RunOptions};
use responder_core::config::{self, SimConfig};
use responder_sim::FleetConfig;

/// Emergency dispatch simulator
#[derive(Parser, Debug)]
#[command(name = "responder", version)]
#[command(about = "Run the emergency dispatch simulation headless")]
struct Args {
    /// Simulation config (JSON). Falls back to RESPONDER_CONFIG_PATH, then defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fleet file (JSON). A demo fleet is used when omitted
    #[arg(long)]
    fleet: Option<PathBuf>,

    /// Land mask elevation grid (JSON) used to classify terrain
    #[arg(long)]
    land_mask: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 600.0)]
    duration_secs: f64,

    /// RNG seed, overriding the config
    #[arg(long)]
    seed: Option<u64>,

    /// Pace ticks against the wall clock
    #[arg(long)]
    realtime: bool,

    /// Wall-clock speed-up when running in real time
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,

    /// Send the nearest free vehicle to every new alarm
    #[arg(long)]
    auto_dispatch: bool,

    /// Print the final snapshot and mission log as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = logging::init_logging(args.verbose) {
        eprintln!("Warning: logging not initialised: {e}");
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => config::load_from_env(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let fleet = match &args.fleet {
        Some(path) => FleetConfig::from_file(path)?,
        None => runner::demo_fleet(),
    };

    let engine = runner::build_engine(config, &fleet, args.land_mask.as_deref())?;
    let (engine, snapshot) = runner::run(
        engine,
        RunOptions {
            duration_secs: args.duration_secs,
            realtime: args.realtime,
            time_scale: args.time_scale,
            auto_dispatch: args.auto_dispatch,
        },
    )?;

    if args.json {
        let report = serde_json::json!({
            "snapshot": snapshot,
            "mission_log": engine.mission_log(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", runner::summary(&snapshot, engine.mission_log()));
    }
    Ok(())
}
