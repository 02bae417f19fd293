use thiserror::Error;

/// Errors raised by the event kernel or by agents reporting a broken invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesError {
    #[error("invalid delay {delay}: events cannot be scheduled in the past")]
    InvalidDelay { delay: f64 },

    #[error("invalid horizon {until}: must be a non-negative time")]
    InvalidHorizon { until: f64 },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
