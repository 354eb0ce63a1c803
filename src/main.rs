//! Lightcone - Entry Point
//!
//! Interactive host loop. Generates a universe, then lets the operator
//! issue commands on behalf of human-controlled players and advance time.
//! Commands typed during a tick are queued and submitted with the next
//! `tick` or `run`.

use std::collections::BTreeMap;
use std::io::{self, Write};

use lightcone::command::{Command, TickReport};
use lightcone::core::codec;
use lightcone::core::config::GenerateSettings;
use lightcone::core::error::Result;
use lightcone::core::types::{PlayerId, Velocity};
use lightcone::simulation::StepDriver;
use tracing_subscriber::EnvFilter;

const SETTINGS_PATH: &str = "data/universe/default.toml";

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lightcone=info")),
        )
        .init();

    tracing::info!("Lightcone starting...");

    let settings = match GenerateSettings::from_toml_file(SETTINGS_PATH) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Could not load {}: {} - using defaults", SETTINGS_PATH, e);
            let mut settings = GenerateSettings::default();
            settings.num_human_players = 1;
            settings
        }
    };

    let mut driver = StepDriver::generate(&settings)?;
    let mut pending: BTreeMap<PlayerId, Vec<Command>> = BTreeMap::new();

    println!("\n=== LIGHTCONE ===");
    println!("A multi-agent universe where news travels at the speed of light");
    println!();
    println!("Commands:");
    println!("  tick / t                          - Advance one tick");
    println!("  run <n>                           - Advance n ticks");
    println!("  status / s                        - Show every player");
    println!("  view <id>                         - Show what a player can see");
    println!("  fuel <from> <to> <amount>         - Queue a fuel shipment");
    println!("  velocity <from> <to> <vx> <vy> <vz> - Queue a velocity change");
    println!("  save <path>                       - Write a checkpoint as JSON");
    println!("  quit / q                          - Exit");
    println!();

    loop {
        display_status(&driver, &pending);

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let words: Vec<&str> = input.split_whitespace().collect();

        match words.as_slice() {
            [] => continue,
            ["quit"] | ["q"] => break,
            ["tick"] | ["t"] => {
                let report = driver.advance_tick(std::mem::take(&mut pending));
                print_report(&report);
            }
            ["run", n] => match n.parse::<usize>() {
                Ok(n) => {
                    println!("Running {} ticks...", n);
                    let mut first = Some(std::mem::take(&mut pending));
                    for _ in 0..n {
                        let report = driver.advance_tick(first.take().unwrap_or_default());
                        if !report.dropped.is_empty() {
                            print_report(&report);
                        }
                    }
                    println!("Completed {} ticks. Now at t={}.", n, driver.time());
                }
                Err(_) => println!("Usage: run <number>"),
            },
            ["status"] | ["s"] => display_detailed_status(&driver),
            ["view", id] => match parse_id(id) {
                Some(id) => display_view(&driver, id),
                None => println!("Usage: view <id>"),
            },
            ["fuel", from, to, amount] => {
                match (parse_id(from), parse_id(to), amount.parse::<f64>()) {
                    (Some(from), Some(to), Ok(amount)) => {
                        queue(&mut pending, Command::send_fuel(from, to, driver.time(), amount));
                    }
                    _ => println!("Usage: fuel <from> <to> <amount>"),
                }
            }
            ["velocity", from, to, vx, vy, vz] => {
                let parsed = (
                    parse_id(from),
                    parse_id(to),
                    vx.parse::<f64>(),
                    vy.parse::<f64>(),
                    vz.parse::<f64>(),
                );
                match parsed {
                    (Some(from), Some(to), Ok(x), Ok(y), Ok(z)) => {
                        let v = Velocity::new(x, y, z);
                        queue(&mut pending, Command::change_velocity(from, to, driver.time(), v));
                    }
                    _ => println!("Usage: velocity <from> <to> <vx> <vy> <vz>"),
                }
            }
            ["save", path] => match save_checkpoint(&driver, path) {
                Ok(()) => println!("Checkpoint written to {}", path),
                Err(e) => println!("Save failed: {}", e),
            },
            _ => println!(
                "Unknown command. Available: tick, run <n>, status, view <id>, fuel, velocity, save <path>, quit"
            ),
        }
    }

    println!(
        "\nGoodbye! Final state: {} players at t={}.",
        driver.players().len(),
        driver.time()
    );
    Ok(())
}

fn parse_id(s: &str) -> Option<PlayerId> {
    s.trim_start_matches(['P', 'p']).parse().ok().map(PlayerId)
}

/// Queue a command for the next tick
fn queue(pending: &mut BTreeMap<PlayerId, Vec<Command>>, command: Command) {
    println!(
        "Queued {:?} from {} to {}",
        command.kind(),
        command.from_id,
        command.to_id
    );
    pending.entry(command.from_id).or_default().push(command);
}

fn save_checkpoint(driver: &StepDriver, path: &str) -> Result<()> {
    let checkpoint = driver.checkpoint()?;
    std::fs::write(path, codec::encode(&checkpoint)?)?;
    Ok(())
}

fn print_report(report: &TickReport) {
    println!(
        "Tick {} complete: {} applied, {} dropped, {} spawned, {} removed.",
        report.time,
        report.applied,
        report.dropped_count(),
        report.spawned.len(),
        report.removed.len()
    );
    for dropped in &report.dropped {
        println!(
            "  dropped {:?} {} -> {}: {}",
            dropped.command.kind(),
            dropped.command.from_id,
            dropped.command.to_id,
            dropped.reason
        );
    }
}

/// Display a brief status summary
fn display_status(driver: &StepDriver, pending: &BTreeMap<PlayerId, Vec<Command>>) {
    let humans: Vec<String> = driver
        .players()
        .values()
        .filter(|p| !p.is_ai())
        .map(|p| p.id.to_string())
        .collect();
    println!();
    println!(
        "--- t={} | Players: {} | Human: [{}] | Queued: {} ---",
        driver.time(),
        driver.players().len(),
        humans.join(", "),
        pending.values().map(Vec::len).sum::<usize>()
    );
}

/// Display every player's canonical record
fn display_detailed_status(driver: &StepDriver) {
    println!("Shared knowledge: {:.2}", driver.global().shared_knowledge);
    for p in driver.players().values() {
        let leader = p
            .direct_leader_id
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>4} {:<16} {:?} at ({:.2}, {:.2}, {:.2}) v={:.3} leader={} subs={} fuel={:.1} knowledge={:.2} tau={:.2}",
            p.id.to_string(),
            p.name,
            p.player_type,
            p.double4d.x,
            p.double4d.y,
            p.double4d.z,
            p.velocity.mag(),
            leader,
            p.direct_subordinate_ids.len(),
            p.physics.fuel.total(),
            p.science.knowledge,
            p.proper_time
        );
    }
}

/// Display one player's light-delayed view
fn display_view(driver: &StepDriver, id: PlayerId) {
    let Some(view) = driver.view(id) else {
        println!("No player {}", id);
        return;
    };
    println!("{} at t={} sees {} others:", id, view.time, view.others.len());
    for (other_id, p) in &view.others {
        println!(
            "  {:>4} seen at t={} ({} ticks old) at ({:.2}, {:.2}, {:.2}), distance {:.2}",
            other_id.to_string(),
            p.int4d.t,
            view.time - p.int4d.t,
            p.double4d.x,
            p.double4d.y,
            p.double4d.z,
            view.distance_to(*other_id).unwrap_or_default()
        );
    }
}
