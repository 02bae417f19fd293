//! `jsqd`: run the power-of-d choices queueing simulation.
//!
//! Usage:
//!   jsqd --config experiments/baseline.toml --replications 8 --output results/

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use power_of_d::logging::init_logging;
use power_of_d::{GenerationMode, SimError, Simulation, SimulationConfig, SimulationReport, output};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "jsqd", about = "Power-of-d choices load balancing simulation")]
struct Cli {
    /// TOML run configuration; the built-in baseline is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Queues sampled per job
    #[arg(short = 'd', long = "d")]
    d: Option<usize>,

    /// Number of queues
    #[arg(short = 'n', long)]
    parallelism: Option<usize>,

    #[arg(long)]
    horizon: Option<f64>,

    /// Stop after this many arrivals instead of generating until the horizon
    #[arg(long)]
    bounded: Option<usize>,

    /// Print arrival, wait, and finish lines for every job
    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long, default_value_t = 1)]
    replications: usize,

    #[arg(long)]
    threads: Option<usize>,

    /// Directory for snapshot CSVs and summary JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn load_config(&self) -> Result<SimulationConfig, SimError> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_path(path)?,
            None => SimulationConfig::baseline(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(d) = self.d {
            config.d = d;
        }
        if let Some(n) = self.parallelism {
            config.parallelism = n;
        }
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if let Some(count) = self.bounded {
            config.generation = GenerationMode::Bounded { count };
        }
        config.verbose |= self.verbose;
        Ok(config)
    }
}

fn print_report(report: &SimulationReport) {
    println!("Seed {}:", report.seed);
    println!("  End time:        {:.3}", report.end_time);
    println!("  Jobs generated:  {}", report.generated);
    println!("  Jobs completed:  {}", report.completed);
    println!("  Still in system: {}", report.in_system);
    println!("  Mean wait:       {:.3}", report.mean_wait);
    println!("  Max wait:        {:.3}", report.max_wait);
    println!("  Mean total load: {:.3}", report.summary.mean_total);
    let means: Vec<String> = report
        .summary
        .mean_length
        .iter()
        .map(|m| format!("{m:.2}"))
        .collect();
    println!("  Mean length per queue: [{}]", means.join(", "));
}

fn run(cli: &Cli, config: SimulationConfig) -> Result<(), SimError> {
    let simulation = Simulation::new(config)?;
    let config = simulation.config();

    println!("=== Power-of-d Choices Simulation ===");
    println!(
        "  {} queues, d = {}, capacity {}, offered load {:.3}",
        config.parallelism,
        config.d,
        config.capacity,
        config.utilization()
    );
    println!("  Running with seed {}...\n", config.seed);

    let reports: Vec<SimulationReport> = if cli.replications <= 1 {
        vec![simulation.run()?]
    } else {
        simulation
            .run_replications(cli.replications, cli.threads)
            .into_iter()
            .collect::<Result<_, _>>()?
    };

    for report in &reports {
        print_report(report);
        if let Some(dir) = &cli.output {
            output::write_all(dir, config, report)?;
        }
    }
    println!("\nDone");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.load_config();
    let verbose = config.as_ref().map_or(cli.verbose, |c| c.verbose);
    init_logging(&cli.log_level, verbose);

    match config.and_then(|config| run(&cli, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
