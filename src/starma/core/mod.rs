//! core: lattice building blocks for STARMA-GARCH modeling.
//!
//! Purpose
//! -------
//! Hold everything the likelihood and the simulator share: the grid and its
//! neighborhood stack, the parameter layout and its mask, validated data,
//! options and guards, and the mean / variance recursions.
//!
//! Key behaviors
//! -------------
//! - [`grid`] / [`neighborhood`]: lattice geometry and the row-normalized
//!   spatial-lag matrices `W_0 = I, W_1, …`.
//! - [`params`] / [`mask`]: parameter matrices, stable keys, fixed/free
//!   masking and the optimizer-space transforms.
//! - [`recursion`]: conditional mean, conditional variance, the conditional
//!   log-likelihood and its forward-sensitivity gradient.
//! - [`simulate`]: seeded process simulation with burn-in.
//!
//! Invariants & assumptions
//! ------------------------
//! - Series are `N × T` with one row per location in grid index order
//!   (first grid dimension fastest).
//! - Parameter matrices have rows = spatial lag (row 0 is the location
//!   itself) and columns = temporal lag (column 0 is lag 1).
//! - Shape checks happen at construction time in [`validation`]; the
//!   recursions index without re-checking.

pub mod data;
pub mod grid;
pub mod guards;
pub mod mask;
pub mod neighborhood;
pub mod options;
pub mod params;
pub mod recursion;
pub mod simulate;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::LatticeSeries;
pub use self::grid::{GridShape, Topology};
pub use self::guards::VarianceGuards;
pub use self::mask::{FreeParamMap, MaskEntry, ParameterMask, Transform};
pub use self::neighborhood::NeighborhoodStack;
pub use self::options::{DEFAULT_BURN_IN, FitOptions, SimOpts};
pub use self::params::{ParamBlock, ParamKey, ParameterSet};
pub use self::recursion::{RESIDUAL_CAP, RecursionScratch, loglik, loglik_and_grad};
pub use self::simulate::{SimulationOutput, simulate, simulate_series, simulate_with_rng};
pub use self::validation::{
    validate_init_variance, validate_stack_covers, validate_stack_matches_series,
    validate_time_steps,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_starmagarch::starma::core::prelude::*;
//
// to import the main lattice surface in a single line.

pub mod prelude {
    pub use super::data::LatticeSeries;
    pub use super::grid::{GridShape, Topology};
    pub use super::guards::VarianceGuards;
    pub use super::mask::{MaskEntry, ParameterMask};
    pub use super::neighborhood::NeighborhoodStack;
    pub use super::options::{FitOptions, SimOpts};
    pub use super::params::{ParamBlock, ParamKey, ParameterSet};
    pub use super::simulate::{SimulationOutput, simulate, simulate_series};
}
