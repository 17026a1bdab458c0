use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use morphodynamics_core::sim::TickTimings;
use morphodynamics_core::{SimParams, Simulation};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(about = "Time simulation ticks with and without advection")]
struct Args {
    /// Grid side length.
    #[arg(long, default_value_t = 200)]
    grid_size: usize,
    /// Ticks to time per configuration.
    #[arg(long, default_value_t = 32)]
    ticks: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// JSON file overriding default parameters.
    #[arg(long)]
    params: Option<PathBuf>,
    /// Write the advected run's metrics summary here as JSON.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn load_params(args: &Args) -> Result<SimParams> {
    let base = match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SimParams::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimParams::default(),
    };
    Ok(SimParams {
        grid_size: args.grid_size,
        seed: args.seed,
        num_frames: base.num_frames.max(args.ticks),
        ..base
    })
}

fn time_ticks(sim: &mut Simulation, ticks: usize) -> Result<(Duration, TickTimings)> {
    let mut sum = TickTimings {
        advection_us: 0,
        reaction_us: 0,
        total_us: 0,
    };
    let start = Instant::now();
    for _ in 0..ticks {
        let t = sim.try_tick_timed()?;
        sum.advection_us += t.advection_us;
        sum.reaction_us += t.reaction_us;
        sum.total_us += t.total_us;
    }
    Ok((start.elapsed(), sum))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let params = load_params(&args)?;
    let ticks = args.ticks.max(1);
    println!(
        "Benchmarking {0}x{0} grid, {1} sub-steps per tick, {2} ticks",
        params.grid_size, params.steps_per_frame, ticks
    );

    let mut plain = Simulation::try_new(SimParams {
        with_advection: false,
        ..params.clone()
    })?;
    let (elapsed, sum) = time_ticks(&mut plain, ticks)?;
    println!("Time WITHOUT advection: {:?}", elapsed);
    println!("Avg per tick: {:?}", elapsed / ticks as u32);
    println!("  reaction: {}us", sum.reaction_us / ticks as u64);

    let mut rotating = Simulation::try_new(SimParams {
        with_advection: true,
        ..params.clone()
    })?;
    let (elapsed_adv, sum_adv) = time_ticks(&mut rotating, ticks)?;
    println!("Time WITH advection: {:?}", elapsed_adv);
    println!("Avg per tick: {:?}", elapsed_adv / ticks as u32);
    println!("  advection: {}us", sum_adv.advection_us / ticks as u64);
    println!("  reaction: {}us", sum_adv.reaction_us / ticks as u64);

    let start = Instant::now();
    let s = rotating.spectrum();
    println!("Spectrum of {}x{} field: {:?}", s.size(), s.size(), start.elapsed());

    if let Some(path) = &args.summary_json {
        let mut sim = Simulation::try_new(SimParams {
            with_advection: true,
            ..params
        })?;
        let summary = sim.try_run_experiment(ticks, 1)?;
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote summary of {} samples to {}", summary.samples.len(), path.display());
    }
    Ok(())
}
