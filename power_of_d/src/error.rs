use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error type for building, running and exporting simulations
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation aborted: {0}")]
    Engine(#[from] des::DesError),

    #[error("replication {index} failed: {message}")]
    Replication { index: usize, message: String },

    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
