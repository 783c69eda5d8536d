//! inference: observed information and standard errors for fitted models.
//!
//! Purpose
//! -------
//! Provide post-estimation uncertainty quantification on top of a maximized
//! [`LogLikelihood`](crate::optimization::loglik_optimizer::LogLikelihood):
//! the observed information at `θ̂` and classical standard errors from its
//! eigen-based pseudoinverse, in the unconstrained optimizer space `θ`.
//!
//! Key behaviors
//! -------------
//! - [`observed_information`] picks the best available derivative: analytic
//!   Hessian, then finite differences of the analytic gradient, then second
//!   differences of the objective.
//! - [`standard_errors`] never aborts on singular information; parameters on
//!   unidentified directions get `NaN`.
//! - [`InferenceError`] / [`InferenceResult`] carry failures.
//!
//! Conventions
//! -----------
//! - `θ` is optimizer space. Mapping to model parameters (delta method) is
//!   handled by the model layer.
//! - Logging is limited to `debug!` records naming the derivative source.

pub mod errors;
pub mod hessian;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{InferenceError, InferenceResult};
pub use self::hessian::{observed_information, standard_errors};

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::hessian::{observed_information, standard_errors};
}
