//! Fixed-step simulation driver.
//!
//! A run starts at `t = 0` and advances the state by `step_size` until either
//! the termination predicate reports that the run is finished or `duration`
//! elapses. The predicate always sees the current, not-yet-advanced state, so
//! the state returned for a finished run is the one the predicate accepted.
//!
//! Callers tell a finished run from a timed-out one by comparing the returned
//! time with the duration:
//!
//! ```
//! use ndarray::prelude::*;
//! use ndarray_point_mass::{run_rk4, BoxError, RunConfig};
//!
//! let config = RunConfig::new(100., 0.001);
//! let state = run_rk4(
//!     array![0.],
//!     array![1.],
//!     |_, _, _, mut a: ArrayViewMut1<f64>| {
//!         a.fill(0.);
//!         Ok(())
//!     },
//!     config,
//!     |p, _, _| Ok::<_, BoxError>(p[0] >= 10.),
//! )?;
//! assert!(state.finished_within(config.duration));
//! # Ok::<(), ndarray_point_mass::RunError>(())
//! ```

use ndarray::prelude::*;

use crate::error::{BoxError, ConfigurationError, RunError};
use crate::rk::{Stepper, RK4};
use crate::state::{State, System};
use crate::OdeIntegrate;

/// Duration and step size of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    /// Simulated time after which the run gives up.
    pub duration: f64,
    /// Fixed integration step.
    pub step_size: f64,
}

impl RunConfig {
    pub fn new(duration: f64, step_size: f64) -> RunConfig {
        RunConfig {
            duration,
            step_size,
        }
    }

    /// Checks that the step size is positive and the duration finite.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.step_size.is_finite() && self.step_size > 0.) {
            return Err(ConfigurationError::StepSizeNotPositive(self.step_size));
        }
        if !self.duration.is_finite() {
            return Err(ConfigurationError::DurationNotFinite(self.duration));
        }
        Ok(())
    }
}

/// Fixed-step integrator of a point-mass system.
///
/// Holds the composed state `positions ++ velocities` of one run. Each call to
/// [`OdeIntegrate::step`] advances it by exactly one step of the chosen
/// [`Stepper`], so the time after `n` steps is `step_size` added `n` times.
pub struct FixedStep<A, S> {
    accel: A,
    stepper: S,
    /// Number of degrees of freedom.
    dimension: usize,
    /// Current time.
    t: f64,
    /// Current composed state.
    y: Array1<f64>,
    /// Time after which the run is over.
    duration: f64,
    /// Step size.
    h: f64,
}

impl<A, S> FixedStep<A, S>
where
    A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
    S: Stepper,
{
    /// Creates a new `FixedStep` integrator.
    ///
    /// # Parameters
    ///
    /// * `initial`: State to start from. Its time is the initial time.
    ///
    /// * `accel`: Acceleration law, where calling `accel(positions,
    ///   velocities, t, accelerations)` should fill in `accelerations`. It
    ///   may be evaluated on intermediate states that are never reported, so
    ///   it must not depend on being called in any particular pattern.
    ///
    /// * `stepper`: Integration rule used for every step.
    ///
    /// * `config`: Duration and step size.
    pub fn new(
        initial: State,
        accel: A,
        stepper: S,
        config: RunConfig,
    ) -> Result<FixedStep<A, S>, ConfigurationError> {
        config.validate()?;
        Ok(FixedStep {
            accel,
            stepper,
            dimension: initial.dimension(),
            t: initial.time(),
            y: initial.composed(),
            duration: config.duration,
            h: config.step_size,
        })
    }

    /// Step size.
    pub fn step_size(&self) -> f64 {
        self.h
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> State {
        State::from_composed(self.y.view(), self.t)
    }
}

impl<A, S> OdeIntegrate for FixedStep<A, S>
where
    A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
    S: Stepper,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    /// Fails without evaluating the acceleration law if `t + h` rounds back
    /// to `t`.
    fn step(&mut self) -> Result<(), RunError> {
        let t_new = self.t + self.h;
        if t_new == self.t {
            return Err(RunError::StepBelowResolution {
                time: self.t,
                step_size: self.h,
            });
        }
        let system = System::new(&self.accel, self.dimension);
        self.y = self
            .stepper
            .step(&system, self.t, self.y.view(), self.h)
            .map_err(RunError::Acceleration)?;
        self.t = t_new;
        Ok(())
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn time_bound(&self) -> f64 {
        self.duration
    }

    fn positions(&self) -> ArrayView1<'_, f64> {
        self.y.slice(s![..self.dimension])
    }

    fn velocities(&self) -> ArrayView1<'_, f64> {
        self.y.slice(s![self.dimension..])
    }
}

/// Drives `integrator` to completion, consulting `termination` before each
/// step and once more on timeout.
fn drive<I, T>(integrator: &mut I, mut termination: Option<T>) -> Result<(), RunError>
where
    I: OdeIntegrate,
    T: FnMut(ArrayView1<f64>, ArrayView1<f64>, f64) -> Result<bool, BoxError>,
{
    while !integrator.timed_out() {
        if let Some(is_finished) = termination.as_mut() {
            let done = is_finished(
                integrator.positions(),
                integrator.velocities(),
                integrator.time(),
            )
            .map_err(RunError::Termination)?;
            if done {
                return Ok(());
            }
        }
        integrator.step()?;
    }
    // Timed out. The predicate still sees the final state, but its verdict no
    // longer matters.
    if let Some(mut is_finished) = termination {
        is_finished(
            integrator.positions(),
            integrator.velocities(),
            integrator.time(),
        )
        .map_err(RunError::Termination)?;
    }
    Ok(())
}

fn run_with<A, S, T>(
    initial_positions: Array1<f64>,
    initial_velocities: Array1<f64>,
    accel: A,
    config: RunConfig,
    stepper: S,
    termination: Option<T>,
) -> Result<State, RunError>
where
    A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
    S: Stepper,
    T: FnMut(ArrayView1<f64>, ArrayView1<f64>, f64) -> Result<bool, BoxError>,
{
    let initial = State::new(initial_positions, initial_velocities)?;
    let mut integrator = FixedStep::new(initial, accel, stepper, config)?;
    drive(&mut integrator, termination)?;
    Ok(integrator.state())
}

/// Simulates a point mass from `t = 0` until `termination` reports that the
/// run is finished or `config.duration` elapses.
///
/// Before every step, `termination(positions, velocities, t)` is called with
/// the current state. If it returns `true` the run stops there and that state
/// is returned, with a time below `config.duration`. Otherwise the state is
/// advanced by one step of `stepper`. Once the time reaches
/// `config.duration`, `termination` is called one last time with the final
/// state and its verdict is ignored; the returned time is then at least
/// `config.duration`.
///
/// `termination` may record samples or reject a state by returning an error.
/// It only ever sees read-only views of the driver's state.
///
/// # Errors
///
/// Returns [`RunError::Configuration`] before any evaluation of `accel` if
/// the initial vectors are empty or of different lengths, or if `config` is
/// invalid. Errors returned by `accel` or `termination` abort the run and are
/// returned as [`RunError::Acceleration`] and [`RunError::Termination`].
/// [`RunError::StepBelowResolution`] is returned if the time grows so large
/// that adding `config.step_size` no longer changes it.
///
/// Non-finite accelerations are not detected: they propagate into the
/// returned state.
pub fn run<A, S, T>(
    initial_positions: Array1<f64>,
    initial_velocities: Array1<f64>,
    accel: A,
    config: RunConfig,
    stepper: S,
    termination: T,
) -> Result<State, RunError>
where
    A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
    S: Stepper,
    T: FnMut(ArrayView1<f64>, ArrayView1<f64>, f64) -> Result<bool, BoxError>,
{
    run_with(
        initial_positions,
        initial_velocities,
        accel,
        config,
        stepper,
        Some(termination),
    )
}

/// Simulates a point mass from `t = 0` to `config.duration` without a
/// termination predicate.
///
/// # Errors
///
/// Same as [`run`], minus termination errors.
pub fn run_unobserved<A, S>(
    initial_positions: Array1<f64>,
    initial_velocities: Array1<f64>,
    accel: A,
    config: RunConfig,
    stepper: S,
) -> Result<State, RunError>
where
    A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
    S: Stepper,
{
    run_with(
        initial_positions,
        initial_velocities,
        accel,
        config,
        stepper,
        None::<fn(ArrayView1<f64>, ArrayView1<f64>, f64) -> Result<bool, BoxError>>,
    )
}

/// [`run`] with the [`RK4`] stepper.
///
/// # Errors
///
/// See [`run`].
pub fn run_rk4<A, T>(
    initial_positions: Array1<f64>,
    initial_velocities: Array1<f64>,
    accel: A,
    config: RunConfig,
    termination: T,
) -> Result<State, RunError>
where
    A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
    T: FnMut(ArrayView1<f64>, ArrayView1<f64>, f64) -> Result<bool, BoxError>,
{
    run(
        initial_positions,
        initial_velocities,
        accel,
        config,
        RK4,
        termination,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::rk::Euler;

    fn free(
        _: ArrayView1<f64>,
        _: ArrayView1<f64>,
        _: f64,
        mut a: ArrayViewMut1<f64>,
    ) -> Result<(), BoxError> {
        a.fill(0.);
        Ok(())
    }

    #[test]
    fn rejects_bad_step_size() {
        for &h in &[0., -0.1, f64::NAN, f64::INFINITY] {
            let initial = State::new(array![0.], array![0.]).unwrap();
            let err = FixedStep::new(initial, free, RK4, RunConfig::new(1., h))
                .err()
                .unwrap();
            assert!(matches!(err, ConfigurationError::StepSizeNotPositive(_)));
        }
    }

    #[test]
    fn rejects_non_finite_duration() {
        let initial = State::new(array![0.], array![0.]).unwrap();
        let err = FixedStep::new(initial, free, Euler, RunConfig::new(f64::INFINITY, 0.1))
            .err()
            .unwrap();
        assert_eq!(err, ConfigurationError::DurationNotFinite(f64::INFINITY));
    }

    #[test]
    fn step_advances_time_by_step_size() {
        let initial = State::new(array![0., 0.], array![1., -1.]).unwrap();
        let mut integrator =
            FixedStep::new(initial, free, RK4, RunConfig::new(1., 0.25)).unwrap();
        assert_eq!(integrator.dimension(), 2);
        integrator.step().unwrap();
        assert_eq!(integrator.time(), 0.25);
        assert!((integrator.positions()[0] - 0.25).abs() < 1e-15);
        assert!((integrator.positions()[1] + 0.25).abs() < 1e-15);
        assert_eq!(integrator.velocities(), array![1., -1.]);
        integrator.run_to_bound().unwrap();
        assert!(integrator.timed_out());
        assert_eq!(integrator.time(), 1.);
        let state = integrator.state();
        assert!((state.positions()[0] - 1.).abs() < 1e-14);
        assert!((state.positions()[1] + 1.).abs() < 1e-14);
    }

    #[test]
    fn step_below_time_resolution_is_an_error() {
        let start = 2f64.powi(53);
        let evaluations = std::cell::Cell::new(0);
        let initial = State::at(array![0.], array![0.], start).unwrap();
        let mut integrator = FixedStep::new(
            initial,
            |_: ArrayView1<f64>, _: ArrayView1<f64>, _: f64, mut a: ArrayViewMut1<f64>| {
                evaluations.set(evaluations.get() + 1);
                a.fill(0.);
                Ok(())
            },
            Euler,
            RunConfig::new(start + 4., 1.),
        )
        .unwrap();
        let err = integrator.run_to_bound().unwrap_err();
        match err {
            RunError::StepBelowResolution { time, step_size } => {
                assert_eq!(time, start);
                assert_eq!(step_size, 1.);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(evaluations.get(), 0);
        assert_eq!(integrator.time(), start);
        assert!(!integrator.timed_out());
    }

    #[test]
    fn zero_duration_only_calls_predicate_once() {
        let mut calls = Vec::new();
        let state = run(
            array![3.],
            array![1.],
            free,
            RunConfig::new(0., 0.1),
            RK4,
            |p, _, t| {
                calls.push((p[0], t));
                Ok(true)
            },
        )
        .unwrap();
        assert_eq!(calls, vec![(3., 0.)]);
        assert!(!state.finished_within(0.));
    }
}
