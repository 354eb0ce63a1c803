//! Headless Universe Runner
//!
//! Generates a universe, runs it for a number of ticks with no human
//! input and writes a JSON summary.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use lightcone::core::config::GenerateSettings;
use lightcone::simulation::{SimulationOutput, StepDriver};
use tracing_subscriber::EnvFilter;

/// Headless Universe Runner - batch runs for tuning and regression checks
#[derive(Parser, Debug)]
#[command(name = "universe_sim")]
#[command(about = "Run a light-delayed universe headless and write a JSON summary")]
struct Args {
    /// Generation settings TOML (defaults are used when omitted)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Random seed, overriding the settings file
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 100)]
    ticks: usize,

    /// Number of players, overriding the settings file
    #[arg(long)]
    players: Option<usize>,

    /// Number of human-controlled players, overriding the settings file
    #[arg(long)]
    humans: Option<usize>,

    /// Where to write the JSON output
    #[arg(long, default_value = "universe_output.json")]
    output: PathBuf,

    /// Log every tick at debug level
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> lightcone::core::error::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "lightcone=debug" } else { "lightcone=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut settings = match &args.settings {
        Some(path) => GenerateSettings::from_toml_file(path)?,
        None => GenerateSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.universe.seed = seed;
    }
    if let Some(players) = args.players {
        settings.num_players = players;
    }
    if let Some(humans) = args.humans {
        settings.num_human_players = humans;
    }

    println!("Starting Universe Simulation");
    println!("============================");
    println!(
        "Universe: {} ({}x{}x{} cubes, c={}, t_dim={})",
        settings.universe.universe_name,
        settings.universe.x_dim,
        settings.universe.y_dim,
        settings.universe.z_dim,
        settings.universe.speed_of_light,
        settings.universe.t_dim,
    );
    println!(
        "Players: {} ({} human), seed {}",
        settings.num_players, settings.num_human_players, settings.universe.seed
    );
    println!("Simulating {} ticks...", args.ticks);
    println!();

    let start = Instant::now();
    let mut driver = StepDriver::generate(&settings)?;
    let players_at_start = driver.players().len();
    let reports = driver.run(args.ticks);
    let elapsed = start.elapsed();

    let output = SimulationOutput::new(&driver, players_at_start, &reports, elapsed);
    println!("{}", output.summary());

    std::fs::write(&args.output, output.to_json())?;
    println!("\nFull output written to {}", args.output.display());
    Ok(())
}
