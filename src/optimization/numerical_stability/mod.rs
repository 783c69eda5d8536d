//! numerical_stability: stable transforms and shared tolerances.
//!
//! Purpose
//! -------
//! Collect the scalar transforms that map unconstrained optimizer coordinates
//! onto positive model parameters, the delta-method helper that carries
//! standard errors through those maps, and the small tolerances shared by the
//! optimizer and inference layers.
//!
//! Key behaviors
//! -------------
//! - `safe_softplus` / `safe_softplus_inv` / `safe_logistic` for ℝ ↔ (0, ∞)
//!   mappings and their derivative, without overflow.
//! - `delta_method_diag` for element-wise reparameterizations.
//! - `POSITIVE_FLOOR`, `EIGEN_EPS`, `GENERAL_TOL` as crate-wide constants.
//!
//! Conventions
//! -----------
//! - Pure functions over `f64` / `ndarray`; no logging, no I/O.
//! - Inputs are assumed finite; domain checks live in the model layer.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    EIGEN_EPS, GENERAL_TOL, POSITIVE_FLOOR, delta_method_diag, safe_logistic, safe_softplus,
    safe_softplus_inv,
};

pub mod prelude {
    pub use super::transformations::{
        EIGEN_EPS, GENERAL_TOL, POSITIVE_FLOOR, delta_method_diag, safe_logistic, safe_softplus,
        safe_softplus_inv,
    };
}
