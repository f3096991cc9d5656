//! Headless ecosystem runner
//!
//! Generates a world, runs it for a number of simulated days and prints one
//! stats line per day.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tile_ecology::core::error::Result;
use tile_ecology::{World, WorldConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Run the tile ecology simulation without a frontend
#[derive(Parser, Debug)]
#[command(name = "ecosim")]
#[command(about = "Run the predator/prey simulation headless and print daily stats")]
struct Args {
    /// World configuration file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated days to run
    #[arg(long, default_value_t = 30)]
    days: u32,

    /// Seconds of simulated time per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Override the simulation RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tile_ecology=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    // Nobody is listening for per-animal updates here
    config.simulation.emit_animal_changed = false;

    let prey = config.prey_count;
    let predators = config.predator_count;
    let terrain = config.terrain.clone();

    let mut world = World::from_config(config)?;
    world.generate_terrain_with(terrain)?;
    let sprouted = world.sprout_initial_food();
    world.spawn_animals(prey, predators)?;
    tracing::info!(sprouted, prey, predators, days = args.days, "Simulation starting");

    let dt = args.dt.max(f32::EPSILON);
    print_stats(&world, args.format)?;
    while world.day() < args.days {
        if world.step(dt) > 0 {
            print_stats(&world, args.format)?;
        }
        world.drain_notifications();

        if world.animals().is_empty() {
            tracing::info!(day = world.day(), "Every animal has died");
            break;
        }
    }

    Ok(())
}

fn print_stats(world: &World, format: OutputFormat) -> Result<()> {
    let stats = world.stats();
    match format {
        OutputFormat::Text => println!("{stats}"),
        OutputFormat::Json => println!("{}", stats.to_json()?),
    }
    Ok(())
}
