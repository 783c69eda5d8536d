//! Neighborhood builder: spatial weight matrices by lag order.
//!
//! Purpose
//! -------
//! Turn a grid shape and an adjacency rule into the ordered stack
//! `W_0, W_1, …, W_{sp-1}` of `N × N` spatial weight matrices that every
//! STARMA-GARCH term mixes over.
//!
//! Key behaviors
//! -------------
//! - `W_0 = I_N`.
//! - `W_k` (k ≥ 1) links each location to the locations at shortest-path
//!   distance **exactly** `k` in the first-order neighbor graph, with equal
//!   weights summing to 1 per row.
//! - Locations with nothing at distance `k` (small bounded grids, large `k`)
//!   keep a zero row; the corresponding term simply contributes nothing there.
//! - Only a sparse per-row representation is stored, so memory grows with
//!   the number of neighbors rather than with `N²`. Dense matrices are
//!   materialized on request by [`NeighborhoodStack::matrix`].
//!
//! Invariants
//! ----------
//! - The stack is immutable once built and is shared by reference between
//!   the simulator and any number of likelihood bundles.
//! - Every row of `W_k` sums to 1 or 0.
use crate::starma::{
    core::{
        grid::{GridShape, Topology},
        params::ParameterSet,
    },
    errors::{StarmaError, StarmaResult},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};
use std::collections::VecDeque;
use tracing::debug;

/// Sparse row: `(column, weight)` pairs.
type SparseRow = Vec<(usize, f64)>;

/// Ordered stack of spatial weight matrices for lags `0..sp`.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodStack {
    grid: GridShape,
    topology: Topology,
    torus: bool,
    rows: Vec<Vec<SparseRow>>,
}

impl NeighborhoodStack {
    /// Build `sp` weight matrices (lag 0 included) for `grid`.
    ///
    /// # Errors
    /// - [`StarmaError::InvalidSpatialOrder`] if `sp == 0`.
    pub fn build(
        grid: &GridShape, sp: usize, topology: Topology, torus: bool,
    ) -> StarmaResult<Self> {
        if sp == 0 {
            return Err(StarmaError::InvalidSpatialOrder { order: sp });
        }
        let n = grid.n_locations();
        let adjacency: Vec<Vec<usize>> =
            (0..n).map(|i| grid.neighbors(i, topology, torus)).collect();

        // rings[k][i] = locations at distance exactly k from i.
        let mut rings: Vec<Vec<Vec<usize>>> = vec![vec![Vec::new(); n]; sp];
        let mut dist = vec![usize::MAX; n];
        let mut queue = VecDeque::new();
        for source in 0..n {
            dist.fill(usize::MAX);
            dist[source] = 0;
            queue.clear();
            queue.push_back(source);
            while let Some(u) = queue.pop_front() {
                let d = dist[u];
                rings[d][source].push(u);
                if d + 1 >= sp {
                    continue;
                }
                for &v in &adjacency[u] {
                    if dist[v] == usize::MAX {
                        dist[v] = d + 1;
                        queue.push_back(v);
                    }
                }
            }
        }

        let rows: Vec<Vec<SparseRow>> = rings
            .into_iter()
            .map(|per_source| {
                per_source
                    .into_iter()
                    .map(|mut ring| {
                        ring.sort_unstable();
                        let w = if ring.is_empty() { 0.0 } else { 1.0 / ring.len() as f64 };
                        ring.into_iter().map(|j| (j, w)).collect()
                    })
                    .collect()
            })
            .collect();

        debug!(
            dims = ?grid.dims(),
            n_locations = n,
            spatial_lags = sp,
            %topology,
            torus,
            "built neighborhood stack"
        );
        Ok(NeighborhoodStack { grid: grid.clone(), topology, torus, rows })
    }

    /// Build the shortest stack that covers every spatial lag `params` uses
    /// (at least lag 0).
    pub fn for_params(
        grid: &GridShape, params: &ParameterSet, topology: Topology, torus: bool,
    ) -> StarmaResult<Self> {
        NeighborhoodStack::build(grid, params.max_spatial_order().max(1), topology, torus)
    }

    /// Number of spatial lags, lag 0 included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_locations(&self) -> usize {
        self.grid.n_locations()
    }

    /// Dense `W_lag`, built on each call; `None` past the end of the stack.
    pub fn matrix(&self, lag: usize) -> Option<Array2<f64>> {
        let lag_rows = self.rows.get(lag)?;
        let n = self.n_locations();
        let mut m = Array2::zeros((n, n));
        for (i, row) in lag_rows.iter().enumerate() {
            for &(j, w) in row {
                m[[i, j]] = w;
            }
        }
        Some(m)
    }

    /// Non-zero `(column, weight)` pairs of row `location` of `W_lag`.
    pub fn weights(&self, lag: usize, location: usize) -> Option<&[(usize, f64)]> {
        self.rows.get(lag)?.get(location).map(Vec::as_slice)
    }

    pub fn grid(&self) -> &GridShape {
        &self.grid
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn torus(&self) -> bool {
        self.torus
    }

    /// `W_lag · x`.
    ///
    /// # Errors
    /// - [`StarmaError::DimensionMismatch`] if `lag` is outside the stack or
    ///   `x` has the wrong length.
    pub fn spatial_lag(&self, lag: usize, x: ArrayView1<f64>) -> StarmaResult<Array1<f64>> {
        if lag >= self.len() {
            return Err(StarmaError::DimensionMismatch {
                what: "spatial lag",
                expected: self.len(),
                actual: lag,
            });
        }
        if x.len() != self.n_locations() {
            return Err(StarmaError::DimensionMismatch {
                what: "vector length",
                expected: self.n_locations(),
                actual: x.len(),
            });
        }
        let mut out = Array1::zeros(x.len());
        self.mix_add(lag, 1.0, x, out.view_mut());
        Ok(out)
    }

    /// `out += coef · W_lag · x`. Callers guarantee `lag < len()` and matching
    /// lengths.
    #[inline]
    pub(crate) fn mix_add(
        &self, lag: usize, coef: f64, x: ArrayView1<f64>, mut out: ArrayViewMut1<f64>,
    ) {
        if coef == 0.0 {
            return;
        }
        for (o, row) in out.iter_mut().zip(&self.rows[lag]) {
            let s: f64 = row.iter().map(|&(j, w)| w * x[j]).sum();
            *o += coef * s;
        }
    }
}
