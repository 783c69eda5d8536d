//! starma: spatio-temporal ARMA-GARCH models on regular lattices.
//!
//! Purpose
//! -------
//! Simulate and estimate STARMA-GARCH processes: every grid cell carries a
//! time series whose conditional mean and conditional variance depend on
//! its own past and on the past of its spatial neighbors, mixed through a
//! stack of row-normalized neighborhood matrices.
//!
//! Key behaviors
//! -------------
//! - [`core`]: grid geometry, neighborhood stacks, parameters and masks,
//!   recursions and the simulator.
//! - [`models`]: the likelihood bundle [`StarmaGarch`] and [`FitResult`].
//! - [`errors`]: [`StarmaError`] / [`ParamError`] and their result aliases.
//!
//! Downstream usage
//! ----------------
//! 1. Build a [`GridShape`] and a [`NeighborhoodStack`] for the spatial
//!    order you need.
//! 2. Either simulate a [`LatticeSeries`] from a [`ParameterSet`] or wrap
//!    observed data with [`LatticeSeries::new`].
//! 3. Construct [`StarmaGarch::new`] with an initial variance vector, a
//!    starting [`ParameterSet`] and a [`ParameterMask`], then call `fit`.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    FitOptions, GridShape, LatticeSeries, MaskEntry, NeighborhoodStack, ParamBlock, ParamKey,
    ParameterMask, ParameterSet, SimOpts, SimulationOutput, Topology, VarianceGuards, simulate,
    simulate_series,
};
pub use self::errors::{ParamError, ParamResult, StarmaError, StarmaResult};
pub use self::models::{CoefRow, FitResult, StarmaGarch};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_starmagarch::starma::prelude::*;
//
// to import the main modeling surface in a single line.

pub mod prelude {
    pub use super::{
        CoefRow, FitOptions, FitResult, GridShape, LatticeSeries, MaskEntry, NeighborhoodStack,
        ParamBlock, ParamError, ParamKey, ParamResult, ParameterMask, ParameterSet, SimOpts,
        SimulationOutput, StarmaError, StarmaGarch, StarmaResult, Topology, VarianceGuards,
        simulate, simulate_series,
    };
}
