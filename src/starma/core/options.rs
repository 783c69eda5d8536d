//! STARMA-GARCH options: configuration for estimation and simulation.
//!
//! Purpose
//! -------
//! Collect the configuration knobs for fitting and simulating lattice
//! STARMA-GARCH processes in one place, so call sites pass explicit,
//! validated options instead of ad-hoc flags.
//!
//! Key behaviors
//! -------------
//! - [`FitOptions`] bundles optimizer settings ([`MLEOptions`]), the variance
//!   guards applied inside the likelihood, and whether standard errors are
//!   computed after the optimizer stops.
//! - [`SimOpts`] controls RNG seeding, burn-in length, and which internal
//!   paths (innovations, conditional variance) the simulator returns.
//!
//! Invariants & assumptions
//! ------------------------
//! - Components are validated by their own constructors
//!   (`Tolerances::new`, `MLEOptions::new`, `VarianceGuards::new`); these
//!   containers add no cross-field checks.
//! - A burn-in of 0 is allowed; the output then starts from the zero state.
use crate::{optimization::loglik_optimizer::MLEOptions, starma::core::guards::VarianceGuards};

/// Default number of discarded warm-up steps in simulation.
pub const DEFAULT_BURN_IN: usize = 100;

/// FitOptions: estimation-time configuration.
///
/// Fields
/// ------
/// - `mle_opts`: [`MLEOptions`]
///   Tolerances, line search, verbosity and L-BFGS memory.
/// - `variance_guards`: [`VarianceGuards`]
///   Bounds applied to `h_t` during likelihood evaluation.
/// - `compute_std_errors`: `bool`
///   When `false`, the fit skips the observed-information step and reports
///   NaN standard errors, z-values and p-values.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub mle_opts: MLEOptions,
    pub variance_guards: VarianceGuards,
    pub compute_std_errors: bool,
}

impl FitOptions {
    pub fn new(
        mle_opts: MLEOptions, variance_guards: VarianceGuards, compute_std_errors: bool,
    ) -> FitOptions {
        FitOptions { mle_opts, variance_guards, compute_std_errors }
    }
}

impl Default for FitOptions {
    /// Default optimizer options, default guards, standard errors on.
    fn default() -> Self {
        FitOptions {
            mle_opts: MLEOptions::default(),
            variance_guards: VarianceGuards::default(),
            compute_std_errors: true,
        }
    }
}

/// SimOpts: simulation-time configuration.
///
/// Fields
/// ------
/// - `seed`: `Option<u64>`
///   `Some(s)` gives bit-identical output for identical inputs; `None` seeds
///   from OS entropy.
/// - `burn_in`: `usize`
///   Leading steps simulated from the zero state and then discarded.
/// - `return_innovations`: `bool`
///   Also return the innovation path `ε` of the retained steps.
/// - `return_variance`: `bool`
///   Also return the conditional-variance path `h` of the retained steps.
///
/// Default
/// -------
/// No seed, `burn_in = 100`, no extra paths.
#[derive(Debug, Clone, PartialEq)]
pub struct SimOpts {
    pub seed: Option<u64>,
    pub burn_in: usize,
    pub return_innovations: bool,
    pub return_variance: bool,
}

impl SimOpts {
    pub fn new(
        seed: Option<u64>, burn_in: usize, return_innovations: bool, return_variance: bool,
    ) -> SimOpts {
        SimOpts { seed, burn_in, return_innovations, return_variance }
    }

    /// Seeded options with the default burn-in and no extra paths.
    pub fn seeded(seed: u64) -> SimOpts {
        SimOpts { seed: Some(seed), ..SimOpts::default() }
    }
}

impl Default for SimOpts {
    fn default() -> Self {
        SimOpts {
            seed: None,
            burn_in: DEFAULT_BURN_IN,
            return_innovations: false,
            return_variance: false,
        }
    }
}
