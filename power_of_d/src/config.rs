//! Run configuration, loadable from TOML.
//!
//! ```toml
//! seed = 204204
//! horizon = 100000.0
//! parallelism = 10
//! d = 2
//! capacity = 1
//! verbose = false
//!
//! [generation]
//! mode = "unbounded"
//!
//! [arrival]
//! kind = "exponential"
//! mean = 2.0
//!
//! [service]
//! kind = "exponential"
//! mean = 20.0
//! ```

use std::fs;
use std::path::Path;

use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SimError;

/// A configuration field failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError {
            field,
            reason: reason.into(),
        }
    }
}

/// Whether the job generator stops after a fixed number of arrivals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GenerationMode {
    Bounded { count: usize },
    Unbounded,
}

/// Distribution of interarrival gaps or service durations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeDistribution {
    Exponential { mean: f64 },
    Deterministic { value: f64 },
}

impl TimeDistribution {
    pub fn mean(&self) -> f64 {
        match self {
            TimeDistribution::Exponential { mean } => *mean,
            TimeDistribution::Deterministic { value } => *value,
        }
    }
}

/// A validated [`TimeDistribution`] ready to draw from.
#[derive(Debug, Clone)]
pub enum Sampler {
    Exponential(Exp<f64>),
    Deterministic(f64),
}

impl Sampler {
    pub fn new(field: &'static str, dist: TimeDistribution) -> Result<Sampler, ConfigError> {
        let mean = dist.mean();
        if !mean.is_finite() || mean <= 0.0 {
            return Err(ConfigError::new(
                field,
                format!("mean must be positive and finite, got {mean}"),
            ));
        }
        match dist {
            TimeDistribution::Exponential { mean } => Exp::new(1.0 / mean)
                .map(Sampler::Exponential)
                .map_err(|e| ConfigError::new(field, e.to_string())),
            TimeDistribution::Deterministic { value } => Ok(Sampler::Deterministic(value)),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Sampler::Exponential(exp) => exp.sample(rng),
            Sampler::Deterministic(value) => *value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub generation: GenerationMode,
    pub horizon: f64,
    pub arrival: TimeDistribution,
    pub service: TimeDistribution,
    pub seed: u64,
    pub parallelism: usize,
    pub d: usize,
    pub capacity: usize,
    pub verbose: bool,
}

impl SimulationConfig {
    /// Ten single-server queues, two sampled per job, arrivals every 2 time
    /// units on average and mean service time 20.
    pub fn baseline() -> Self {
        SimulationConfig {
            generation: GenerationMode::Unbounded,
            horizon: 100_000.0,
            arrival: TimeDistribution::Exponential { mean: 2.0 },
            service: TimeDistribution::Exponential { mean: 20.0 },
            seed: 204_204,
            parallelism: 10,
            d: 2,
            capacity: 1,
            verbose: false,
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, SimError> {
        let config: SimulationConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SimError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelism == 0 {
            return Err(ConfigError::new("parallelism", "need at least one queue"));
        }
        if self.d == 0 || self.d > self.parallelism {
            return Err(ConfigError::new(
                "d",
                format!("sample size {} outside [1, {}]", self.d, self.parallelism),
            ));
        }
        if self.capacity == 0 {
            return Err(ConfigError::new("capacity", "must be at least 1"));
        }
        if self.horizon.is_nan() || self.horizon < 0.0 {
            return Err(ConfigError::new(
                "horizon",
                format!("must be a non-negative time, got {}", self.horizon),
            ));
        }
        // unbounded generation only stops at the horizon
        if self.generation == GenerationMode::Unbounded && !self.horizon.is_finite() {
            return Err(ConfigError::new("horizon", "must be finite when generation is unbounded"));
        }
        Sampler::new("arrival", self.arrival)?;
        Sampler::new("service", self.service)?;
        Ok(())
    }

    /// Mean offered load per server, `(service mean / arrival mean) / (n * capacity)`.
    pub fn utilization(&self) -> f64 {
        self.service.mean() / self.arrival.mean() / (self.parallelism * self.capacity) as f64
    }
}
