//! Adapter that exposes a user `LogLikelihood` as an `argmin` problem.
//!
//! We convert a *maximization* of a log-likelihood `ℓ(θ)` into a *minimization*
//! problem by defining the cost as `c(θ) = -ℓ(θ)`. Analytic gradients (if
//! provided by the user) are negated accordingly. If a gradient is not
//! provided, we finite-difference the **cost** closure, so no sign flip is
//! needed in that branch.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `-ℓ(θ)` (negative log-likelihood).
/// - `Gradient::gradient` returns:
///   - `-∇ℓ(θ)` if the user provides an analytic gradient, or
///   - a finite-difference gradient of the cost (no sign flip needed).
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }

    /// Finite-difference gradient of the cost at `theta`.
    ///
    /// Central differences first. If any cost evaluation inside the stencil
    /// failed, or the central result is not finite, retry once with forward
    /// differences and surface whatever that pass reports.
    fn fd_gradient(&self, theta: &Theta) -> Result<Grad, Error> {
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |theta: &Theta| -> f64 {
            match self.cost(theta) {
                Ok(val) => val,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let central = theta.central_diff(&cost_func);
        if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
            return Ok(central);
        }
        Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(θ) = -ℓ(θ)`, rejecting non-finite values with
    /// `OptError::NonFiniteCost`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// Uses the analytic `∇ℓ` when the model provides one (validated, then
    /// negated); otherwise falls back to [`ArgMinAdapter::fd_gradient`]. Any
    /// other error from `grad` is propagated unchanged.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => self.fd_gradient(theta),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign conventions of cost and gradient.
    // - The finite-difference fallback when no analytic gradient exists.
    // - Rejection of non-finite log-likelihood values.
    // -------------------------------------------------------------------------

    /// ℓ(θ) = -(θ - 1)ᵀ(θ - 1), with an optional analytic gradient.
    struct Bowl {
        analytic: bool,
    }

    impl LogLikelihood for Bowl {
        type Data = ();

        fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
            Ok(-theta.mapv(|x| (x - 1.0).powi(2)).sum())
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _data: &()) -> OptResult<Grad> {
            if self.analytic {
                Ok(theta.mapv(|x| -2.0 * (x - 1.0)))
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    struct Broken;

    impl LogLikelihood for Broken {
        type Data = ();

        fn value(&self, _theta: &Theta, _data: &()) -> OptResult<f64> {
            Ok(f64::NAN)
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the cost is the negated log-likelihood and analytic gradients
    // are negated as well.
    //
    // Given
    // -----
    // - The bowl log-likelihood with an analytic gradient at θ = (0, 3).
    //
    // Expect
    // ------
    // - cost = 1 + 4 = 5; ∇c = (-2, 4).
    fn analytic_gradient_is_negated() {
        // Arrange
        let model = Bowl { analytic: true };
        let adapter = ArgMinAdapter::new(&model, &());
        let theta = array![0.0, 3.0];

        // Act
        let cost = adapter.cost(&theta).expect("finite cost");
        let grad = adapter.gradient(&theta).expect("analytic gradient");

        // Assert
        assert!((cost - 5.0).abs() < 1e-12);
        assert!((grad[0] + 2.0).abs() < 1e-12);
        assert!((grad[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure the finite-difference fallback matches the analytic cost
    // gradient closely.
    //
    // Given
    // -----
    // - The bowl log-likelihood without an analytic gradient.
    //
    // Expect
    // ------
    // - FD gradient ≈ (-2, 4) within 1e-5.
    fn finite_difference_fallback_matches_analytic() {
        // Arrange
        let model = Bowl { analytic: false };
        let adapter = ArgMinAdapter::new(&model, &());
        let theta = array![0.0, 3.0];

        // Act
        let grad = adapter.gradient(&theta).expect("fd gradient");

        // Assert
        assert!((grad[0] + 2.0).abs() < 1e-5);
        assert!((grad[1] - 4.0).abs() < 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Confirm a NaN log-likelihood is reported as a non-finite cost.
    //
    // Given
    // -----
    // - A model whose value is always NaN.
    //
    // Expect
    // ------
    // - `cost` fails and the error converts back into `NonFiniteCost`.
    fn non_finite_value_is_rejected() {
        // Arrange
        let adapter = ArgMinAdapter::new(&Broken, &());

        // Act
        let err = adapter.cost(&array![0.0]).expect_err("NaN must be rejected");

        // Assert
        assert!(matches!(OptError::from(err), OptError::NonFiniteCost { .. }));
    }
}
