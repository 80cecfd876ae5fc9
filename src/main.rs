use clap::Parser;
use keldysh::analysis::{self, Continuation};
use keldysh::config::JobConfig;
use keldysh::output;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

/// Self-consistent Franz-Keldysh photodiode sweeps
#[derive(Parser)]
#[command(name = "keldysh", version)]
struct Cli {
    /// TOML job file describing material, device and sweep
    job: PathBuf,

    /// Print solver stats to stderr
    #[arg(long)]
    stats: bool,

    /// Seed every point with the default guess instead of the previous solution
    #[arg(long)]
    cold: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut stats = if cli.stats { Some(keldysh::stats::Stats::new()) } else { None };

    let t = Instant::now();
    let job = JobConfig::load(&cli.job).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", cli.job.display(), e);
        std::process::exit(1);
    });
    let device = job.device().unwrap_or_else(|e| {
        eprintln!("Device error: {}", e);
        std::process::exit(1);
    });
    let plan = job.plan().unwrap_or_else(|e| {
        eprintln!("Sweep error: {}", e);
        std::process::exit(1);
    });
    let mut options = job.sweep_options();
    if cli.cold {
        options.continuation = Continuation::Cold;
    }
    if let Some(ref mut s) = stats {
        s.add_phase("Load job", t.elapsed());
    }

    let result = analysis::sweep_plan(&device, &plan, &options, stats.as_mut()).unwrap_or_else(|e| {
        eprintln!("Sweep failed: {}", e);
        std::process::exit(1);
    });

    let mut stdout = io::stdout();
    output::write_sweep_csv(&result, &mut stdout).unwrap_or_else(|e| {
        eprintln!("Output error: {}", e);
        std::process::exit(1);
    });

    if let Some(ref stats) = stats {
        stats.display();
    }
}
