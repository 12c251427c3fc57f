//! Caller-owned sample sink.
//!
//! A `DataLog` collects named series of `(vertical, horizontal)` points, for
//! example speed against time or speed against distance. It is meant to be
//! captured by a termination predicate:
//!
//! ```
//! use ndarray::prelude::*;
//! use ndarray_point_mass::{run_rk4, BoxError, DataLog, RunConfig};
//!
//! let mut log = DataLog::new();
//! let distance = log.add_series("distance, m", "time, sec");
//! run_rk4(
//!     array![0.],
//!     array![2.],
//!     |_, _, _, mut a: ArrayViewMut1<f64>| {
//!         a[0] = 0.;
//!         Ok(())
//!     },
//!     RunConfig::new(1., 0.5),
//!     |p, _, t| {
//!         log.record(distance, p[0], t);
//!         Ok::<_, BoxError>(false)
//!     },
//! )?;
//! assert_eq!(log[distance].points().len(), 3);
//! # Ok::<(), ndarray_point_mass::RunError>(())
//! ```

use std::ops::Index;

/// Handle to a series of a [`DataLog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeriesId(usize);

/// Points plotted against a pair of axis labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    vertical_label: String,
    horizontal_label: String,
    points: Vec<(f64, f64)>,
}

impl Series {
    pub fn vertical_label(&self) -> &str {
        &self.vertical_label
    }

    pub fn horizontal_label(&self) -> &str {
        &self.horizontal_label
    }

    /// Recorded `(vertical, horizontal)` points, in recording order.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Largest vertical and horizontal values, or `None` if empty.
    pub fn max(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, &(v, h)| match acc {
            None => Some((v, h)),
            Some((max_v, max_h)) => Some((f64::max(max_v, v), f64::max(max_h, h))),
        })
    }
}

/// Named series of samples collected during a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataLog {
    series: Vec<Series>,
}

impl DataLog {
    pub fn new() -> DataLog {
        DataLog::default()
    }

    /// Adds an empty series and returns its handle.
    pub fn add_series(
        &mut self,
        vertical_label: impl Into<String>,
        horizontal_label: impl Into<String>,
    ) -> SeriesId {
        self.series.push(Series {
            vertical_label: vertical_label.into(),
            horizontal_label: horizontal_label.into(),
            points: Vec::new(),
        });
        SeriesId(self.series.len() - 1)
    }

    /// Appends a point to a series.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different log.
    pub fn record(&mut self, id: SeriesId, vertical: f64, horizontal: f64) {
        self.series[id.0].points.push((vertical, horizontal));
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Returns `true` if no series holds any point.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    /// Removes all points, keeping the series and their labels.
    pub fn clear(&mut self) {
        for s in &mut self.series {
            s.points.clear();
        }
    }
}

impl Index<SeriesId> for DataLog {
    type Output = Series;

    fn index(&self, id: SeriesId) -> &Series {
        &self.series[id.0]
    }
}
