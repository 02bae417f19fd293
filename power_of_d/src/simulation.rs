use des::parallel::{ParallelRunner, simple_progress_reporter};
use des::{Agent, DesError, EventLoop};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::bank::Bank;
use crate::config::{Sampler, SimulationConfig};
use crate::generator::JobGenerator;
use crate::resource::{ResourceQueue, ResourceStats};
use crate::routing::RoutingPolicy;
use crate::statistics::{QueueSnapshot, SnapshotSummary, summarize};
use crate::{Event, SimError, Stats};

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub end_time: f64,
    pub generated: usize,
    pub completed: usize,
    pub in_system: usize,
    pub mean_wait: f64,
    pub max_wait: f64,
    pub mean_service: f64,
    pub resources: Vec<ResourceStats>,
    pub summary: SnapshotSummary,
    #[serde(skip)]
    pub snapshots: Vec<QueueSnapshot>,
}

impl SimulationReport {
    /// Assemble a report from the agents' stats, in any order.
    pub fn from_stats(seed: u64, stats: Vec<Stats>) -> Result<Self, SimError> {
        let mut generator = None;
        let mut bank = None;
        for s in stats {
            match s {
                Stats::Generator(g) => generator = Some(g),
                Stats::Bank(b) => bank = Some(b),
            }
        }
        let (Some(generator), Some(bank)) = (generator, bank) else {
            return Err(DesError::InvariantViolation(
                "run finished without generator and bank stats".into(),
            )
            .into());
        };

        let started = bank.completed
            + bank
                .resources
                .iter()
                .map(|r| r.current_in_service)
                .sum::<usize>();
        let mean_of = |total: f64, count: usize| {
            if count == 0 { 0.0 } else { total / count as f64 }
        };

        Ok(SimulationReport {
            seed,
            end_time: bank.last_event_time,
            generated: generator.generated,
            completed: bank.completed,
            in_system: bank.in_system,
            mean_wait: mean_of(bank.total_wait_time, started),
            max_wait: bank.max_wait_time,
            mean_service: mean_of(bank.total_service_time, started),
            resources: bank.resources,
            summary: summarize(&bank.snapshots),
            snapshots: bank.snapshots,
        })
    }
}

/// A validated configuration, ready to build and run event loops.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    arrival: Sampler,
    service: Sampler,
    routing: RoutingPolicy,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Simulation, SimError> {
        config.validate()?;
        let arrival = Sampler::new("arrival", config.arrival)?;
        let service = Sampler::new("service", config.service)?;
        let routing = RoutingPolicy::new(config.d, config.parallelism)?;
        Ok(Simulation {
            config,
            arrival,
            service,
            routing,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Build the event loop for one run seeded with `seed`.
    ///
    /// The generator draws from `seed`; routing and service draws share a
    /// second stream seeded with `seed + 1`.
    pub fn event_loop(&self, seed: u64) -> Result<EventLoop<Event, Stats>, DesError> {
        let queues = (0..self.config.parallelism)
            .map(|id| ResourceQueue::new(id, self.config.capacity))
            .collect();

        let generator = JobGenerator::new(
            self.config.generation,
            self.arrival.clone(),
            StdRng::seed_from_u64(seed),
        );
        let bank = Bank::new(
            queues,
            self.routing,
            self.service.clone(),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
            self.config.verbose,
        );

        let agents: Vec<Box<dyn Agent<Event, Stats>>> = vec![Box::new(generator), Box::new(bank)];
        EventLoop::new(vec![(0.0, Event::Start)], agents)
    }

    /// Run once with the configured seed.
    pub fn run(&self) -> Result<SimulationReport, SimError> {
        self.run_seed(self.config.seed)
    }

    pub fn run_seed(&self, seed: u64) -> Result<SimulationReport, SimError> {
        info!(
            seed,
            queues = self.config.parallelism,
            d = self.config.d,
            horizon = self.config.horizon,
            "running simulation"
        );
        let mut event_loop = self.event_loop(seed)?;
        event_loop.run(self.config.horizon)?;
        debug!(
            end_time = event_loop.current_t(),
            pending = event_loop.pending(),
            "run finished"
        );
        SimulationReport::from_stats(seed, event_loop.stats())
    }

    /// Run `count` independent replications with seeds `seed, seed + 2, ...`
    /// in parallel. Results are in replication order.
    pub fn run_replications(
        &self,
        count: usize,
        threads: Option<usize>,
    ) -> Vec<Result<SimulationReport, SimError>> {
        let base_seed = self.config.seed;
        // generator and bank take seed and seed + 1
        let seed_for = |index: usize| base_seed.wrapping_add(2 * index as u64);

        let mut runner = ParallelRunner::new(count, |index| self.event_loop(seed_for(index)))
            .progress(simple_progress_reporter((count / 10).max(1)));
        if let Some(n) = threads {
            runner = runner.num_threads(n);
        }

        runner
            .run(self.config.horizon)
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                let stats = result.map_err(|message| SimError::Replication { index, message })?;
                SimulationReport::from_stats(seed_for(index), stats)
            })
            .collect()
    }
}
