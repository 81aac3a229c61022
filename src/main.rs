use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use city_sim::simulation::SimWorld;

#[derive(Parser)]
#[command(name = "city_sim")]
#[command(about = "Isometric city simulation core, headless runner")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "600")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.05")]
    delta: f64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Grid width in tiles
    #[arg(long, default_value = "48")]
    width: i32,

    /// Grid height in tiles
    #[arg(long, default_value = "48")]
    height: i32,

    /// Number of pedestrians to spawn
    #[arg(long, default_value = "12")]
    pedestrians: u32,

    /// Number of cars to spawn
    #[arg(long, default_value = "8")]
    cars: u32,

    /// Skip the periodic map drawing
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    println!("Running city simulation in headless mode...");
    println!(
        "Grid: {}x{}, Ticks: {}, Delta: {}s",
        cli.width, cli.height, cli.ticks, cli.delta
    );
    println!();

    let mut world = match cli.seed {
        Some(seed) => SimWorld::create_demo_city_with_seed(cli.width, cli.height, seed),
        None => SimWorld::create_demo_city(cli.width, cli.height),
    };

    let mut pedestrians_spawned = 0;
    for _ in 0..cli.pedestrians {
        if world.spawn_pedestrian() {
            pedestrians_spawned += 1;
        }
    }
    let mut cars_spawned = 0;
    for _ in 0..cli.cars {
        if world.spawn_vehicle() {
            cars_spawned += 1;
        }
    }
    if (pedestrians_spawned, cars_spawned) != (cli.pedestrians, cli.cars) {
        anyhow::bail!("demo city has no surface to spawn agents on");
    }

    println!("Initial state:");
    world.print_summary();
    if !cli.quiet {
        world.draw_map();
    }

    // Print a summary after every simulated second
    let ticks_per_second = (1.0 / cli.delta).ceil().max(1.0) as u32;

    let mut tick = 0;
    while tick < cli.ticks {
        let ticks_to_run = ticks_per_second.min(cli.ticks - tick);
        for _ in 0..ticks_to_run {
            tick += 1;
            world.advance(cli.delta);
        }

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            f64::from(tick) * cli.delta
        );
        world.print_summary();
        if !cli.quiet {
            world.draw_map();
        }
    }

    let segment_shape = world
        .segment_type_at((8, 8))
        .map(|shape| format!("{:?}", shape))
        .unwrap_or_else(|| "none".to_string());

    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks run: {}", tick);
    info!("Simulated time: {:.2}s", world.time);
    info!("Road segments: {}", world.road_segment_count());
    info!("Segment shape at (8, 8): {}", segment_shape);
    info!("Pedestrians: {}", world.pedestrians().len());
    info!("Cars: {}", world.vehicles().len());

    // Exercise the editing path once so a broken repaint shows up in runs
    world
        .remove_road_segment((4, 8))
        .context("demo city should have a segment at (4, 8)")?;
    world.advance(cli.delta);
    info!("Post-edit pedestrians: {}", world.pedestrians().len());

    Ok(())
}
