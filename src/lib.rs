//! Fixed-step integration of point-mass dynamics.
//!
//! A simulated body is described by one position and one velocity per degree
//! of freedom. A caller-supplied acceleration law closes the second-order
//! system, which is integrated with a fixed step by an explicit Runge–Kutta
//! [`Stepper`] ([`RK4`] in production, [`Euler`] for comparison). The driver
//! ([`run`]) offers every state to a caller-supplied termination predicate
//! before stepping it, which is where samples are recorded (see [`DataLog`])
//! and rule violations are reported.

pub mod data_log;
pub mod driver;
pub mod error;
pub mod rk;
pub mod state;

pub use data_log::{DataLog, Series, SeriesId};
pub use driver::{run, run_rk4, run_unobserved, FixedStep, RunConfig};
pub use error::{BoxError, ConfigurationError, RunError};
pub use rk::{Euler, RKMethod, Stepper, RK4};
pub use state::{State, System};

use ndarray::prelude::*;

pub trait OdeIntegrate {
    /// Returns the number of degrees of freedom.
    fn dimension(&self) -> usize;
    /// Perform one step.
    fn step(&mut self) -> Result<(), RunError>;
    /// Current time.
    fn time(&self) -> f64;
    /// The ending time.
    fn time_bound(&self) -> f64;
    /// Current positions.
    fn positions(&self) -> ArrayView1<'_, f64>;
    /// Current velocities.
    fn velocities(&self) -> ArrayView1<'_, f64>;
    /// Returns `true` if the integration has reached `time_bound`.
    fn timed_out(&self) -> bool {
        self.time() >= self.time_bound()
    }
    /// Integrate until reaching `time_bound`.
    fn run_to_bound(&mut self) -> Result<(), RunError> {
        while !self.timed_out() {
            self.step()?;
        }
        Ok(())
    }
}
