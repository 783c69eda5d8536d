//! Lattice series container.
//!
//! Purpose
//! -------
//! Hold an observed (or simulated) spatio-temporal series in one validated
//! type so the recursion and likelihood code can assume clean input.
//!
//! Invariants & assumptions
//! ------------------------
//! - Rows are locations (grid linear index, first dimension fastest);
//!   columns are time steps.
//! - At least one location and one time step.
//! - Every value is finite.
use crate::starma::errors::{StarmaError, StarmaResult};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// LatticeSeries: validated `N × T` panel of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeSeries {
    data: Array2<f64>,
}

impl LatticeSeries {
    /// Wrap an `N × T` array.
    ///
    /// # Errors
    /// - [`StarmaError::EmptySeries`] if either dimension is 0.
    /// - [`StarmaError::NonFiniteData`] at the first NaN/±inf, scanning time
    ///   steps in order.
    pub fn new(data: Array2<f64>) -> StarmaResult<Self> {
        if data.is_empty() {
            return Err(StarmaError::EmptySeries);
        }
        for (t, column) in data.columns().into_iter().enumerate() {
            if let Some((location, &value)) =
                column.iter().enumerate().find(|(_, v)| !v.is_finite())
            {
                return Err(StarmaError::NonFiniteData { location, t, value });
            }
        }
        Ok(LatticeSeries { data })
    }

    /// Number of locations `N`.
    pub fn n_locations(&self) -> usize {
        self.data.nrows()
    }

    /// Number of time steps `T`.
    pub fn n_steps(&self) -> usize {
        self.data.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Cross-section at time `t`.
    pub fn column(&self, t: usize) -> ArrayView1<'_, f64> {
        self.data.column(t)
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}
