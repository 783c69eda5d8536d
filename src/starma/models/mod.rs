//! models: the STARMA-GARCH likelihood bundle and its fit output.
//!
//! Purpose
//! -------
//! Wire the lattice recursions of `starma::core` to the generic optimizer
//! and inference layers. [`StarmaGarch`] is the callable likelihood over one
//! series; [`FitResult`] is what a fit produces.
//!
//! Key behaviors
//! -------------
//! - [`StarmaGarch`] implements
//!   [`LogLikelihood`](crate::optimization::loglik_optimizer::LogLikelihood)
//!   with an analytic gradient; the observed information is taken by finite
//!   differences of that gradient.
//! - [`FitResult`] reports per-key estimates, delta-method standard errors,
//!   z-values, two-sided p-values, AIC / BIC and the residual and
//!   conditional-variance paths.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`likelihood`] check construction errors, the gradient
//!   against central differences, and a closed-form single-parameter fit.
//! - Round-trip recovery on simulated data lives in the crate's
//!   integration tests.

pub mod fit_result;
pub mod likelihood;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::fit_result::{CoefRow, FitResult};
pub use self::likelihood::StarmaGarch;

pub mod prelude {
    pub use super::fit_result::{CoefRow, FitResult};
    pub use super::likelihood::StarmaGarch;
}
