//! Power-of-d choices load balancing over parallel single-server queues.
//!
//! Each arriving job samples `d` of the `n` queues and joins the shortest one.
//! The model runs on the `des` event kernel with two agents: a
//! [`JobGenerator`] producing arrivals and a [`Bank`] that owns the queues,
//! routes and serves jobs, and logs queue-length snapshots.

// ============================================================================
// Modules
// ============================================================================

pub mod bank;
pub mod config;
mod error;
pub mod generator;
pub mod job;
pub mod logging;
pub mod output;
pub mod resource;
pub mod routing;
pub mod simulation;
pub mod statistics;

pub use bank::{Bank, BankStats};
pub use config::{ConfigError, GenerationMode, Sampler, SimulationConfig, TimeDistribution};
pub use error::SimError;
pub use generator::{GeneratorStats, JobGenerator};
pub use job::{Job, JobState};
pub use resource::{Acquire, ResourceQueue, ResourceStats};
pub use routing::RoutingPolicy;
pub use simulation::{Simulation, SimulationReport};
pub use statistics::{QueueSnapshot, SnapshotKind, SnapshotSummary, StatisticsCollector};

pub type JobId = usize;

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    /// The generator's interarrival timer fired.
    ArrivalDue,
    JobArrived {
        job_id: JobId,
    },
    /// A waiting job was admitted by its queue and resumes now.
    ServiceGranted {
        job_id: JobId,
        queue_id: usize,
    },
    ServiceCompleted {
        job_id: JobId,
        queue_id: usize,
    },
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stats {
    Generator(GeneratorStats),
    Bank(BankStats),
}
