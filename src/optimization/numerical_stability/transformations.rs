//! Numerically stable scalar transforms and shared tolerances.
//!
//! Softplus keeps positive-only parameters (ω, α, β) strictly positive while
//! the optimizer moves freely in ℝ; the logistic function is its derivative
//! and drives both the gradient chain rule and the delta method. The
//! piecewise guards (`|x| > 20`) keep `f64` arithmetic well-conditioned.
use ndarray::{Array1, ArrayView1, Zip};

/// Smallest model-space value a softplus-mapped parameter is allowed to start
/// from. Smaller initial values, zero included, are lifted here before
/// inversion.
///
/// The slope of softplus at `softplus⁻¹(v)` is about `v` for small `v`, so a
/// start near zero leaves a coordinate the optimizer cannot move. At `1e-2`
/// the slope is still about `1e-2`.
pub const POSITIVE_FLOOR: f64 = 1e-2;

/// Eigenvalues at or below this are treated as zero curvature.
pub const EIGEN_EPS: f64 = 1e-10;

/// Generic tolerance for "numerically zero" loadings and comparisons.
pub const GENERAL_TOL: f64 = 1e-12;

/// `softplus(x) = ln(1 + exp(x))`, mapping ℝ → (0, ∞) without overflow.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Inverse of softplus on `(0, ∞)`: `ln(exp(x) - 1)`.
///
/// `x` must be finite and `> 0`; callers floor at [`POSITIVE_FLOOR`] first.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Logistic function `σ(x) = 1 / (1 + exp(-x))`, the derivative of softplus.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Delta method for an element-wise reparameterization `ψ_i = g_i(θ_i)`.
///
/// With a diagonal Jacobian `J = diag(g'_i(θ̂_i))`, `Var(ψ̂_i) = g'_i² Var(θ̂_i)`,
/// so standard errors scale by `|g'_i|`. NaN standard errors stay NaN.
pub fn delta_method_diag(jac_diag: ArrayView1<f64>, se_theta: ArrayView1<f64>) -> Array1<f64> {
    Zip::from(&jac_diag).and(&se_theta).map_collect(|&j, &se| j.abs() * se)
}
