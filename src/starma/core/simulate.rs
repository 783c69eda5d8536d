//! Process simulator for lattice STARMA-GARCH series.
//!
//! Purpose
//! -------
//! Generate synthetic spatio-temporal series from a [`ParameterSet`] on a
//! grid, for testing estimators and for Monte Carlo work.
//!
//! Key behaviors
//! -------------
//! - Builds the neighborhood stack from the grid when none is supplied.
//! - Starts from the zero state (`Y`, `ε`, `h` history all zero), runs
//!   `burn_in + n` steps and keeps the last `n` columns.
//! - Draws `z_t ~ N(0, I)` from a `StdRng`; a fixed seed gives bit-identical
//!   output for identical inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - No variance guarding happens here. Explosive or negative coefficients
//!   produce diverging (or NaN) paths; once a value overflows, the output is
//!   rejected with `StarmaError::NonFiniteData`.
use crate::starma::{
    core::{
        data::LatticeSeries,
        grid::{GridShape, Topology},
        neighborhood::NeighborhoodStack,
        options::SimOpts,
        params::ParameterSet,
        recursion::{conditional_mean, conditional_variance},
    },
    errors::{StarmaError, StarmaResult},
};
use ndarray::{Array1, Array2, s};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

/// Simulated series plus the optional internal paths requested in
/// [`SimOpts`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    /// `N × n` simulated observations.
    pub series: LatticeSeries,
    /// `N × n` innovations `ε`, when `return_innovations` is set.
    pub innovations: Option<Array2<f64>>,
    /// `N × n` conditional variances `h`, when `return_variance` is set.
    pub variance: Option<Array2<f64>>,
}

/// Simulate `n` time steps of a STARMA-GARCH process on `grid`.
///
/// # Errors
/// - [`StarmaError::InvalidSampleLength`] if `n == 0`.
/// - [`StarmaError::DimensionMismatch`] if the supplied stack covers a
///   different number of locations than `grid` or fewer spatial lags than
///   `params` uses.
/// - [`StarmaError::NonFiniteData`] if the simulated path overflows.
pub fn simulate(
    params: &ParameterSet, n: usize, grid: &GridShape, stack: Option<&NeighborhoodStack>,
    topology: Topology, torus: bool, opts: &SimOpts,
) -> StarmaResult<SimulationOutput> {
    let mut rng = match opts.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    simulate_with_rng(params, n, grid, stack, topology, torus, opts, &mut rng)
}

/// [`simulate`] returning only the series.
pub fn simulate_series(
    params: &ParameterSet, n: usize, grid: &GridShape, stack: Option<&NeighborhoodStack>,
    topology: Topology, torus: bool, opts: &SimOpts,
) -> StarmaResult<LatticeSeries> {
    simulate(params, n, grid, stack, topology, torus, opts).map(|out| out.series)
}

/// [`simulate`] with a caller-owned RNG; `opts.seed` is ignored.
#[allow(clippy::too_many_arguments)]
pub fn simulate_with_rng<R: Rng + ?Sized>(
    params: &ParameterSet, n: usize, grid: &GridShape, stack: Option<&NeighborhoodStack>,
    topology: Topology, torus: bool, opts: &SimOpts, rng: &mut R,
) -> StarmaResult<SimulationOutput> {
    if n == 0 {
        return Err(StarmaError::InvalidSampleLength { n });
    }
    let built;
    let stack = match stack {
        Some(stack) => stack,
        None => {
            built = NeighborhoodStack::for_params(grid, params, topology, torus)?;
            &built
        }
    };
    if stack.n_locations() != grid.n_locations() {
        return Err(StarmaError::DimensionMismatch {
            what: "stack locations",
            expected: grid.n_locations(),
            actual: stack.n_locations(),
        });
    }
    if stack.len() < params.max_spatial_order() {
        return Err(StarmaError::DimensionMismatch {
            what: "spatial lags in stack",
            expected: params.max_spatial_order(),
            actual: stack.len(),
        });
    }

    let n_loc = grid.n_locations();
    let lag = params.max_temporal_lag();
    let total = lag + opts.burn_in + n;
    let mut y = Array2::zeros((n_loc, total));
    let mut eps = Array2::zeros((n_loc, total));
    let mut h = Array2::zeros((n_loc, total));
    let mut mean = Array1::zeros(n_loc);
    let mut var = Array1::zeros(n_loc);
    let mut sq = Array1::zeros(n_loc);

    for t in lag..total {
        conditional_mean(params, stack, y.view(), eps.view(), t, mean.view_mut());
        conditional_variance(params, stack, eps.view(), h.view(), t, &mut sq, var.view_mut());
        for i in 0..n_loc {
            let z: f64 = StandardNormal.sample(&mut *rng);
            let e = var[i].sqrt() * z;
            h[[i, t]] = var[i];
            eps[[i, t]] = e;
            y[[i, t]] = mean[i] + e;
        }
    }

    let start = lag + opts.burn_in;
    debug!(
        n_locations = n_loc,
        n,
        burn_in = opts.burn_in,
        max_lag = lag,
        "simulated lattice series"
    );
    Ok(SimulationOutput {
        series: LatticeSeries::new(y.slice(s![.., start..]).to_owned())?,
        innovations: opts.return_innovations.then(|| eps.slice(s![.., start..]).to_owned()),
        variance: opts.return_variance.then(|| h.slice(s![.., start..]).to_owned()),
    })
}
