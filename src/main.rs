use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::io::Write;

use pollen_storm::config::{
    DEFAULT_MAX_TIME, DEFAULT_NUM_PARTICLES, DEFAULT_PROGRESS_INTERVAL, DEFAULT_WINDOW_LEN,
};
use pollen_storm::{Execution, Simulation, SimulationParams, ThreadCount};

// ===================================================================================
// Command line
// ===================================================================================

/// Simulate pollen falling through a storm and fit the ground-arrival trend.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Number of grains; must be a perfect square.
    #[arg(long, default_value_t = DEFAULT_NUM_PARTICLES)]
    particles: usize,

    /// Number of unit time steps.
    #[arg(long, default_value_t = DEFAULT_MAX_TIME)]
    steps: usize,

    /// Trailing steps used for the linear fit.
    #[arg(long, default_value_t = DEFAULT_WINDOW_LEN)]
    window: usize,

    /// Worker threads (overrides POLLEN_THREADS / OMP_NUM_THREADS; defaults to the physical core count).
    #[arg(long)]
    threads: Option<usize>,

    /// Report progress every N steps.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_every: usize,

    /// Run single-threaded in index order.
    #[arg(long)]
    serial: bool,
}

impl Args {
    fn params(&self) -> SimulationParams {
        SimulationParams {
            num_particles: self.particles,
            max_time: self.steps,
            window_len: self.window,
            progress_interval: self.progress_every,
            execution: if self.serial { Execution::Serial } else { Execution::Parallel },
            ..Default::default()
        }
    }
}

// ===================================================================================
// main
// ===================================================================================

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let threads = if args.serial {
        ThreadCount::resolve(Some(1), &[])
    } else {
        ThreadCount::from_env(args.threads)
    };
    info!("using {} threads ({:?})", threads.threads, threads.source);

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.threads)
        .build_global()
        .context("failed to build the global thread pool")?;

    print!("Initialising...");
    std::io::stdout().flush().ok();
    let mut sim = match Simulation::new(args.params()) {
        Ok(sim) => sim,
        Err(e) => {
            println!();
            error!("{e} - abort");
            std::process::exit(e.exit_code());
        }
    };
    println!("   DONE");

    let summary = sim.run(|p| {
        println!("Timestep {}: {} particles on ground", p.timestep, p.ground_count);
    })?;

    if summary.fit.is_degenerate() {
        warn!("sampled times have no spread; the fit is not finite");
    }
    println!("\n\n{}\n", summary.fit);

    println!(
        "{} pollen for {} timesteps on {} threads takes {:.6} seconds",
        summary.num_particles,
        summary.max_time,
        threads.threads,
        summary.timings.total.as_secs_f64()
    );
    println!(
        "Time taken to compute slope and intercept: {} secs",
        summary.timings.fit.as_secs_f64()
    );
    println!(
        "Time taken to initialise particles: {} secs",
        summary.timings.initialise.as_secs_f64()
    );

    Ok(())
}
