//! inference::hessian: observed information and standard errors.
//!
//! Purpose
//! -------
//! Turn an optimum `θ̂` of a [`LogLikelihood`] into the observed information
//! matrix `J(θ̂) = −∇²ℓ(θ̂)` and classical standard errors from its
//! Moore–Penrose pseudoinverse.
//!
//! Key behaviors
//! -------------
//! - [`observed_information`] uses the best derivative the model offers:
//!   1. the analytic Hessian hook (`LogLikelihood::hessian`);
//!   2. finite differences of the analytic gradient (`compute_hessian`);
//!   3. second differences of the objective (`compute_cost_hessian`).
//! - [`standard_errors`] eigendecomposes `J` with `nalgebra`, drops
//!   directions with `λ ≤ EIGEN_EPS`, and reports `NaN` for any parameter
//!   loading on a dropped direction instead of silently shrinking its
//!   variance.
//!
//! Conventions
//! -----------
//! - Everything lives in optimizer space `θ`; mapping standard errors back
//!   to model parameters (delta method) is the caller's job.
//! - `J` is on the **summed** log-likelihood scale, so its pseudoinverse is
//!   directly the asymptotic covariance.
use std::cell::RefCell;

use crate::{
    inference::errors::{InferenceError, InferenceResult},
    optimization::{
        errors::OptError,
        loglik_optimizer::{
            Grad, LogLikelihood, Theta,
            finite_diff::{compute_cost_hessian, compute_hessian},
            validation::validate_hessian,
        },
        numerical_stability::transformations::{EIGEN_EPS, GENERAL_TOL},
    },
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use tracing::debug;

/// observed_information: `J(θ̂) = −∇²ℓ(θ̂)` in optimizer space.
///
/// Errors
/// ------
/// - `InferenceError::Hessian` when the last fallback (cost second
///   differences) fails, e.g. because ℓ is non-finite near `θ̂`.
pub fn observed_information<F: LogLikelihood>(
    f: &F, theta_hat: &Theta, data: &F::Data,
) -> InferenceResult<Array2<f64>> {
    let dim = theta_hat.len();
    match f.hessian(theta_hat, data) {
        Ok(h) => {
            validate_hessian(&h, dim)?;
            debug!(source = "analytic", dim, "observed information");
            return Ok(-h);
        }
        Err(OptError::HessianNotImplemented) => {}
        Err(err) => debug!(error = %err, "analytic hessian failed; using finite differences"),
    }

    if f.grad(theta_hat, data).is_ok() {
        let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
        let grad_fn = |theta: &Theta| -> Grad {
            match f.grad(theta, data) {
                Ok(g) => g,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    Array1::from_elem(dim, f64::NAN)
                }
            }
        };
        match compute_hessian(&grad_fn, theta_hat) {
            Ok(h) if closure_err.borrow().is_none() => {
                debug!(source = "gradient differences", dim, "observed information");
                return Ok(-h);
            }
            Ok(_) => {}
            Err(err) => debug!(error = %err, "gradient differences failed; using cost differences"),
        }
    }

    let cost = |theta: &Theta| -> Result<f64, OptError> { f.value(theta, data).map(|v| -v) };
    let h = compute_cost_hessian(&cost, theta_hat)?;
    debug!(source = "cost differences", dim, "observed information");
    Ok(h)
}

/// standard_errors: `sqrt(diag(J⁺))` with NaN on unidentified directions.
///
/// With `J = Q Λ Qᵀ`,
/// `Var(θ̂_i) = Σ_{k: λ_k > EIGEN_EPS} Q[i,k]² / λ_k`. If parameter `i` has
/// a loading `Q[i,k]² > GENERAL_TOL` on any direction with `λ_k ≤ EIGEN_EPS`
/// its variance is undefined and `NaN` is returned for it.
///
/// Errors
/// ------
/// - `InferenceError::CovarianceDimMismatch` if `info` is not square.
/// - `InferenceError::Hessian` if `info` holds non-finite entries.
pub fn standard_errors(info: &Array2<f64>) -> InferenceResult<Array1<f64>> {
    let n = info.nrows();
    if info.ncols() != n {
        return Err(InferenceError::CovarianceDimMismatch {
            expected: n,
            found: (info.nrows(), info.ncols()),
        });
    }
    validate_hessian(info, n)?;
    let mut info_nalg = DMatrix::<f64>::zeros(n, n);
    fill_dmatrix(info, &mut info_nalg);
    Ok(solve_for_se(info_nalg, n))
}

// ---- Helper methods ----

/// Copy a square `ndarray` matrix into a `DMatrix`, column by column.
fn fill_dmatrix(info: &Array2<f64>, info_nalg: &mut DMatrix<f64>) {
    let n = info.ncols();
    for j in 0..n {
        for i in 0..n {
            info_nalg[(i, j)] = info[[i, j]];
        }
    }
}

fn solve_for_se(info_nalg: DMatrix<f64>, n: usize) -> Array1<f64> {
    let eigen_decomp = info_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let mut se = Array1::<f64>::zeros(n);
    for i in 0..n {
        let unidentified = eigenvals
            .iter()
            .enumerate()
            .any(|(k, &lambda)| lambda <= EIGEN_EPS && q[(i, k)] * q[(i, k)] > GENERAL_TOL);
        se[i] = if unidentified {
            f64::NAN
        } else {
            eigenvals
                .iter()
                .enumerate()
                .filter(|(_, lambda)| **lambda > EIGEN_EPS)
                .map(|(k, &lambda)| q[(i, k)] * q[(i, k)] / lambda)
                .sum::<f64>()
                .sqrt()
        };
    }
    se
}
