//! loglik_optimizer::types: numeric aliases and pre-wired L-BFGS solvers.
//!
//! Every optimizer module talks in terms of these aliases rather than raw
//! `ndarray` / argmin generics. `Theta` and `Grad` have one entry per free
//! parameter of the resolved parameter mask; `Hessian` is the matching dense
//! square matrix.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Free-parameter vector `θ` in unconstrained optimizer space.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(θ)` or `∇c(θ)`, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense `n × n` second-derivative matrix for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
