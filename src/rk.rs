//! Fixed-step explicit Runge–Kutta steppers.

use lazy_static::lazy_static;
use ndarray::prelude::*;

use crate::error::{BoxError, RunError};
use crate::state::{State, System};

/// A single-step integration rule.
///
/// Given the composed state `y` of a [`System`] at time `t`, a stepper
/// returns the composed state at `t + h`.
pub trait Stepper {
    /// Advances the composed vector `y` by one step of size `h`.
    fn step<A>(
        &self,
        system: &System<'_, A>,
        t: f64,
        y: ArrayView1<f64>,
        h: f64,
    ) -> Result<Array1<f64>, BoxError>
    where
        A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>;

    /// Advances `state` by one step of size `h` under `accel`.
    ///
    /// This composes the state, steps it and splits the result back into
    /// positions and velocities at time `state.time() + h`.
    fn advance<A>(&self, state: &State, accel: &A, h: f64) -> Result<State, RunError>
    where
        A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
    {
        let system = System::new(accel, state.dimension());
        let y = state.composed();
        let y_new = self
            .step(&system, state.time(), y.view(), h)
            .map_err(RunError::Acceleration)?;
        Ok(State::from_composed(y_new.view(), state.time() + h))
    }
}

/// Butcher tableau of an explicit Runge–Kutta method.
pub trait RKMethod {
    /// Order of the method.
    const ORDER: usize;

    /// Number of stages in the method.
    const NUM_STAGES: usize;

    /// Coefficients for incrementing time for consecutive RK stages, length
    /// `NUM_STAGES - 1`.
    ///
    /// The value for the first stage is always zero, so it is not included.
    fn c() -> ArrayView1<'static, f64>;

    /// Coefficients for combining previous RK stages to compute the next
    /// stage, length `NUM_STAGES - 1`.
    ///
    /// For explicit methods the coefficients above the main diagonal are
    /// zeros, so `a` is stored as a list of arrays of increasing lengths. The
    /// first stage is always just `f`, thus no coefficients for it are
    /// required.
    fn a() -> &'static [ArrayView1<'static, f64>];

    /// Coefficients for combining RK stages for computing the final
    /// prediction, length `NUM_STAGES`.
    fn b() -> ArrayView1<'static, f64>;
}

/// Computes `y + h * sum(coeffs[i] * k[i])`, skipping zero coefficients.
///
/// Skipping matters when a stage derivative is not finite: a zero weight must
/// leave it out of the sum rather than turn it into NaN.
fn combine(
    y: ArrayView1<f64>,
    k: ArrayView2<f64>,
    coeffs: ArrayView1<f64>,
    h: f64,
) -> Array1<f64> {
    let mut out = y.to_owned();
    for (k_i, &coeff) in k.outer_iter().zip(coeffs) {
        if coeff != 0. {
            out.scaled_add(coeff * h, &k_i);
        }
    }
    out
}

impl<O: RKMethod> Stepper for O {
    /// Perform a single Runge–Kutta step.
    ///
    /// Stage `s` evaluates the system at `t + c[s] * h` on
    /// `y + h * sum(a[s][j] * k[j])`, so the system is called exactly
    /// `NUM_STAGES` times, in stage order.
    fn step<A>(
        &self,
        system: &System<'_, A>,
        t: f64,
        y: ArrayView1<f64>,
        h: f64,
    ) -> Result<Array1<f64>, BoxError>
    where
        A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
    {
        // Storage for RK stages, shape `NUM_STAGES, y.len()`.
        let mut k = Array2::zeros((O::NUM_STAGES, y.len()));
        system.derivative(t, y, k.row_mut(0))?;
        for (s, (a, &c)) in O::a().iter().zip(O::c()).enumerate() {
            let y_stage = combine(y, k.slice(s![..s + 1, ..]), a.view(), h);
            system.derivative(t + c * h, y_stage.view(), k.row_mut(s + 1))?;
        }
        Ok(combine(y, k.view(), O::b(), h))
    }
}

/// Explicit (forward) Euler method.
///
/// First order: one evaluation per step, `y1 = y0 + h * f(y0, t)`. Its energy
/// error grows visibly on oscillatory problems, which makes it a useful
/// contrast to [`RK4`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Euler;

impl RKMethod for Euler {
    const ORDER: usize = 1;

    const NUM_STAGES: usize = 1;

    fn c() -> ArrayView1<'static, f64> {
        static C: [f64; 0] = [];
        aview1(&C)
    }

    fn a() -> &'static [ArrayView1<'static, f64>] {
        &[]
    }

    fn b() -> ArrayView1<'static, f64> {
        static B: [f64; 1] = [1.];
        aview1(&B)
    }
}

/// Classic fourth-order Runge–Kutta method.
///
/// ```text
/// k1 = f(y0, t)
/// k2 = f(y0 + h/2 k1, t + h/2)
/// k3 = f(y0 + h/2 k2, t + h/2)
/// k4 = f(y0 + h k3, t + h)
/// y1 = y0 + h/6 (k1 + 2 k2 + 2 k3 + k4)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RK4;

impl RKMethod for RK4 {
    const ORDER: usize = 4;

    const NUM_STAGES: usize = 4;

    fn c() -> ArrayView1<'static, f64> {
        static C: [f64; 3] = [0.5, 0.5, 1.];
        aview1(&C)
    }

    fn a() -> &'static [ArrayView1<'static, f64>] {
        static A1: [f64; 1] = [0.5];
        static A2: [f64; 2] = [0., 0.5];
        static A3: [f64; 3] = [0., 0., 1.];
        lazy_static! {
            static ref A: [ArrayView1<'static, f64>; 4 - 1] = [
                aview1(&A1),
                aview1(&A2),
                aview1(&A3),
            ];
        }
        &*A
    }

    fn b() -> ArrayView1<'static, f64> {
        static B: [f64; 4] = [1. / 6., 1. / 3., 1. / 3., 1. / 6.];
        aview1(&B)
    }
}
