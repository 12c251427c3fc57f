//! Error types.

use std::error::Error as StdError;

/// Error type returned by caller-supplied callbacks.
///
/// Acceleration laws return it to reject a control input (e.g. more throttle
/// than the actuator allows) and termination predicates return it to abort a
/// run on a rule violation (e.g. leaving the course).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Invalid run setup, detected before any integration takes place.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no positions given")]
    EmptyState,

    #[error(
        "the size of the positions and velocities vectors don't match ({positions} vs {velocities})"
    )]
    LengthMismatch { positions: usize, velocities: usize },

    /// The step size must be finite and strictly positive.
    #[error("step size {0} is not a positive finite number")]
    StepSizeNotPositive(f64),

    #[error("duration {0} is not finite")]
    DurationNotFinite(f64),
}

/// Errors that abort a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The acceleration law rejected a state.
    #[error("acceleration law failed: {0}")]
    Acceleration(#[source] BoxError),

    /// The termination predicate rejected a state.
    #[error("termination predicate failed: {0}")]
    Termination(#[source] BoxError),

    /// Adding the step size no longer changes the time, so the run would
    /// never reach its duration.
    #[error("step size {step_size} is below the resolution of time {time}")]
    StepBelowResolution { time: f64, step_size: f64 },
}

impl RunError {
    /// Returns the error raised by a callback, if this is a callback error.
    pub fn into_callback_error(self) -> Option<BoxError> {
        match self {
            RunError::Configuration(_) | RunError::StepBelowResolution { .. } => None,
            RunError::Acceleration(err) | RunError::Termination(err) => Some(err),
        }
    }
}
