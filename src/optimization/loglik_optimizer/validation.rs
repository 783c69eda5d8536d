//! Validation helpers shared by the optimizer, the finite-difference layer and
//! the inference code. Each check maps a violation onto a dedicated
//! [`OptError`] variant carrying the offending index and value.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta, types::Hessian},
};

/// `None` is accepted; `Some(tol)` must be finite and strictly positive.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// `None` is accepted; `Some(tol)` must be finite and strictly positive.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Check `grad.len() == dim` and that every entry is finite.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`]
/// - [`OptError::InvalidGradient`] for the first offending entry.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    if let Some((index, &value)) = grad.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidGradient {
            index,
            value,
            reason: "Gradient elements must be finite.",
        });
    }
    Ok(())
}

/// Unwrap the solver's best parameter vector, requiring finite entries.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if the solver produced none.
/// - [`OptError::InvalidThetaHat`] for the first non-finite entry.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some((index, &value)) = t.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value,
            reason: "Parameter estimates must be finite.",
        });
    }
    Ok(t)
}

/// A log-likelihood value must be finite (any sign).
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Check that `hessian` is `dim × dim` with finite entries.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`]
/// - [`OptError::InvalidHessian`] with the first offending row/col.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((i, j), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row: i, col: j, value });
        }
    }
    Ok(())
}
