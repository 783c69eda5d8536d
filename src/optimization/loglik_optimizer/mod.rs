//! loglik_optimizer: MLE-friendly, argmin-powered log-likelihood optimizer.
//!
//! Purpose
//! -------
//! Provide an argmin-backed optimization layer for **maximizing
//! log-likelihoods** `ℓ(θ)`. Models implement [`LogLikelihood`] and call
//! [`maximize`] to run L-BFGS with a configurable line search, tolerances and
//! finite-difference fallbacks.
//!
//! Key behaviors
//! -------------
//! - Convert `ℓ(θ)` into the argmin cost `c(θ) = -ℓ(θ)` via
//!   [`adapter::ArgMinAdapter`].
//! - [`maximize`] validates the start with [`LogLikelihood::check`], builds
//!   the solver ([`builders`]), runs it ([`run::run_lbfgs`]) and normalizes
//!   the final state into an [`OptimOutcome`].
//! - [`finite_diff`] supplies gradients and Hessians when the model does not
//!   provide analytic ones.
//!
//! Invariants & assumptions
//! ------------------------
//! - User code implements `ℓ(θ)`, `∇ℓ(θ)` and `∇²ℓ(θ)`, never the cost.
//! - Invalid inputs surface as [`OptError`](crate::optimization::errors::OptError)
//!   values, not panics.
//! - [`Tolerances`] and [`MLEOptions`] are validated on construction.
//!
//! Conventions
//! -----------
//! - Parameters live in unconstrained optimizer space as [`Theta`]; mapping
//!   to constrained model space happens in the model layer.
//! - [`OptimOutcome::value`] is expressed as `ℓ`, not as the cost.
//!
//! Testing notes
//! -------------
//! - Submodule tests cover sign conventions, finite-difference fallbacks,
//!   option validation and convergence reporting on toy objectives; the
//!   STARMA-GARCH model tests drive [`maximize`] on real likelihoods.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Hessian, Theta};
}
