//! Point-mass state and its first-order composed form.

use ndarray::prelude::*;

use crate::error::{BoxError, ConfigurationError};

/// Positions, velocities and time of a simulated body.
///
/// There is one position and one velocity per degree of freedom, in the same
/// order. A `State` always has at least one degree of freedom.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    positions: Array1<f64>,
    velocities: Array1<f64>,
    time: f64,
}

impl State {
    /// Creates a state at `t = 0`.
    ///
    /// Fails if `positions` is empty or if the lengths of `positions` and
    /// `velocities` differ.
    pub fn new(
        positions: Array1<f64>,
        velocities: Array1<f64>,
    ) -> Result<State, ConfigurationError> {
        State::at(positions, velocities, 0.)
    }

    /// Creates a state at the given time.
    pub fn at(
        positions: Array1<f64>,
        velocities: Array1<f64>,
        time: f64,
    ) -> Result<State, ConfigurationError> {
        if positions.is_empty() {
            return Err(ConfigurationError::EmptyState);
        }
        if positions.len() != velocities.len() {
            return Err(ConfigurationError::LengthMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        Ok(State {
            positions,
            velocities,
            time,
        })
    }

    /// Splits a composed vector `positions ++ velocities` back into a state.
    pub(crate) fn from_composed(y: ArrayView1<f64>, time: f64) -> State {
        debug_assert!(y.len() >= 2 && y.len() % 2 == 0);
        let n = y.len() / 2;
        State {
            positions: y.slice(s![..n]).to_owned(),
            velocities: y.slice(s![n..]).to_owned(),
            time,
        }
    }

    /// Number of degrees of freedom.
    pub fn dimension(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> ArrayView1<'_, f64> {
        self.positions.view()
    }

    pub fn velocities(&self) -> ArrayView1<'_, f64> {
        self.velocities.view()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Returns `true` if this state was reached before `duration` elapsed.
    ///
    /// For the result of a run this distinguishes a run stopped by its
    /// termination predicate from one that timed out.
    pub fn finished_within(&self, duration: f64) -> bool {
        self.time < duration
    }

    /// Concatenates positions and velocities into one vector.
    pub fn composed(&self) -> Array1<f64> {
        let n = self.dimension();
        let mut y = Array1::zeros(2 * n);
        y.slice_mut(s![..n]).assign(&self.positions);
        y.slice_mut(s![n..]).assign(&self.velocities);
        y
    }

    /// Consumes the state, returning `(positions, velocities, time)`.
    pub fn into_parts(self) -> (Array1<f64>, Array1<f64>, f64) {
        (self.positions, self.velocities, self.time)
    }
}

/// First-order form of a second-order system.
///
/// For a composed vector `y = positions ++ velocities` the derivative is
/// `velocities ++ accel(positions, velocities, t)`, which lets a single
/// integration routine handle any number of degrees of freedom.
pub struct System<'a, A> {
    accel: &'a A,
    dimension: usize,
}

impl<'a, A> System<'a, A>
where
    A: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, ArrayViewMut1<f64>) -> Result<(), BoxError>,
{
    pub fn new(accel: &'a A, dimension: usize) -> Self {
        System { accel, dimension }
    }

    /// Number of degrees of freedom; the composed vector is twice as long.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Writes `dy/dt` at `(t, y)` into `dy`.
    pub fn derivative(
        &self,
        t: f64,
        y: ArrayView1<f64>,
        dy: ArrayViewMut1<f64>,
    ) -> Result<(), BoxError> {
        let n = self.dimension;
        debug_assert_eq!(y.len(), 2 * n);
        debug_assert_eq!(dy.len(), 2 * n);
        let (positions, velocities) = y.split_at(Axis(0), n);
        let (mut d_positions, d_velocities) = dy.split_at(Axis(0), n);
        d_positions.assign(&velocities);
        (self.accel)(positions, velocities, t, d_velocities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_state() {
        let err = State::new(array![], array![]).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyState);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = State::new(array![0., 1.], array![0.]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::LengthMismatch {
                positions: 2,
                velocities: 1,
            }
        );
        assert_eq!(
            err.to_string(),
            "the size of the positions and velocities vectors don't match (2 vs 1)"
        );
    }

    #[test]
    fn composes_and_splits() {
        let state = State::at(array![1., 2.], array![3., 4.], 0.5).unwrap();
        let y = state.composed();
        assert_eq!(y, array![1., 2., 3., 4.]);
        assert_eq!(State::from_composed(y.view(), 0.5), state);
    }

    #[test]
    fn derivative_pairs_velocities_with_accelerations() {
        fn accel(
            p: ArrayView1<f64>,
            v: ArrayView1<f64>,
            t: f64,
            mut a: ArrayViewMut1<f64>,
        ) -> Result<(), BoxError> {
            a[0] = -p[0] + t;
            a[1] = 2. * v[1];
            Ok(())
        }
        let system = System::new(&accel, 2);
        let y = array![1., 2., 3., 4.];
        let mut dy = Array1::zeros(4);
        system.derivative(10., y.view(), dy.view_mut()).unwrap();
        assert_eq!(dy, array![3., 4., 9., 8.]);
    }
}
