//! optimization: MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer used for model fitting: an argmin-backed
//! log-likelihood optimizer, numerically stable parameter transforms, and a
//! single error/result surface. Models implement a log-likelihood, choose
//! tolerances, and obtain fitted parameters and diagnostics without touching
//! solver details.
//!
//! Key behaviors
//! -------------
//! - [`loglik_optimizer`]: maximize `ℓ(θ)` with L-BFGS (More–Thuente or
//!   Hager–Zhang), with finite-difference gradient / Hessian fallbacks.
//! - [`numerical_stability`]: softplus-family transforms and the delta method.
//! - [`errors`]: [`OptError`](errors::OptError) and
//!   [`OptResult`](errors::OptResult), including conversions from argmin and
//!   from model-layer errors.
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; user-facing values
//!   are expressed in terms of `ℓ`.
//! - Callers never see raw argmin errors.
//! - Progress logging goes through `tracing` and is only emitted at `info`
//!   level when `MLEOptions::verbose` is set.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
