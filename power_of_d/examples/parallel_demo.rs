//! Compare sample sizes across parallel replications
//!
//! Runs the same heavily loaded bank with d = 1 (random routing), d = 2 and
//! d = n (join the shortest queue), several seeded replications each, and
//! prints the mean wait and mean queue length for each setting.
//!
//! Run with:
//!   cargo run --release --example parallel_demo -p power_of_d

use power_of_d::{GenerationMode, Simulation, SimulationConfig, TimeDistribution};

fn main() {
    println!("=== Power-of-d Replication Demo ===\n");

    let base = SimulationConfig {
        generation: GenerationMode::Bounded { count: 50_000 },
        horizon: 1e9,
        arrival: TimeDistribution::Exponential { mean: 2.0 },
        service: TimeDistribution::Exponential { mean: 19.0 },
        seed: 204_204,
        parallelism: 10,
        d: 1,
        capacity: 1,
        verbose: false,
    };
    println!("Offered load per server: {:.2}\n", base.utilization());

    for d in [1, 2, 3, base.parallelism] {
        let config = SimulationConfig { d, ..base.clone() };
        let simulation = match Simulation::new(config) {
            Ok(simulation) => simulation,
            Err(e) => {
                eprintln!("d = {d}: {e}");
                continue;
            }
        };

        let start = std::time::Instant::now();
        let reports: Vec<_> = simulation
            .run_replications(8, None)
            .into_iter()
            .filter_map(|r| r.map_err(|e| eprintln!("  replication failed: {e}")).ok())
            .collect();
        let elapsed = start.elapsed();

        let runs = reports.len().max(1) as f64;
        let mean_wait = reports.iter().map(|r| r.mean_wait).sum::<f64>() / runs;
        let mean_total = reports.iter().map(|r| r.summary.mean_total).sum::<f64>() / runs;
        let worst = reports
            .iter()
            .flat_map(|r| r.resources.iter().map(|q| q.max_length))
            .max()
            .unwrap_or(0);

        println!(
            "d = {:>2}: mean wait {:8.3}, mean jobs in system {:7.3}, \
             longest queue {:4} ({} runs, {:.2}s)",
            d,
            mean_wait,
            mean_total,
            worst,
            reports.len(),
            elapsed.as_secs_f64()
        );
    }
}
