//! models::likelihood: the STARMA-GARCH likelihood bundle and fit driver.
//!
//! Purpose
//! -------
//! Tie an observed [`LatticeSeries`], a [`NeighborhoodStack`], an initial
//! variance vector and a masked starting [`ParameterSet`] into one object
//! that evaluates the conditional log-likelihood, its analytic gradient and
//! an observed information matrix in optimizer space, and that drives the
//! L-BFGS optimizer to a [`FitResult`].
//!
//! Key behaviors
//! -------------
//! - All shape checks happen once in [`StarmaGarch::new`]; evaluation never
//!   re-validates the stack or the initial variance.
//! - Optimizer space `θ` holds only the free entries of the mask, each
//!   mapped through its [`Transform`](crate::starma::core::mask::Transform):
//!   identity for `mu`, `phi`, `theta`; softplus for `omega`, `alpha`, `beta`.
//! - [`LogLikelihood::grad`] runs the forward-sensitivity recursion for the
//!   free keys and applies the diagonal transform Jacobian.
//! - [`StarmaGarch::fit`] never aborts on a singular information matrix:
//!   unidentified parameters get `NaN` standard errors, z-values and
//!   p-values.
//!
//! Conventions
//! -----------
//! - `value` / `grad` follow the optimizer layer: they return `ℓ(θ)` and
//!   `∇ℓ(θ)`. The convenience methods [`StarmaGarch::negloglik`] and
//!   [`StarmaGarch::gradient`] return the cost `−ℓ` and its gradient.
//! - Recursion buffers live in a `RefCell`; a bundle is single-threaded.
use std::cell::RefCell;

use crate::{
    inference::hessian::{observed_information, standard_errors},
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Grad, LogLikelihood, Theta, maximize},
        numerical_stability::transformations::delta_method_diag,
    },
    starma::{
        core::{
            data::LatticeSeries,
            mask::{FreeParamMap, ParameterMask},
            neighborhood::NeighborhoodStack,
            options::FitOptions,
            params::{ParamKey, ParameterSet},
            recursion::{RecursionScratch, loglik, loglik_and_grad},
            validation::{
                validate_init_variance, validate_stack_covers, validate_stack_matches_series,
                validate_time_steps,
            },
        },
        errors::{StarmaError, StarmaResult},
        models::fit_result::FitResult,
    },
};
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info, warn};

/// Callable STARMA-GARCH likelihood over one observed series.
#[derive(Debug)]
pub struct StarmaGarch<'a> {
    series: &'a LatticeSeries,
    stack: &'a NeighborhoodStack,
    init_variance: Array1<f64>,
    free_map: FreeParamMap,
    free_keys: Vec<ParamKey>,
    t0: usize,
    options: FitOptions,
    scratch: RefCell<RecursionScratch>,
}

impl<'a> StarmaGarch<'a> {
    /// Build the likelihood bundle.
    ///
    /// # Errors
    /// - [`StarmaError::DimensionMismatch`] if the stack and series disagree
    ///   on the location count, the initial variance has the wrong length,
    ///   or the stack has fewer spatial lags than `init_params` uses.
    /// - [`StarmaError::InvalidInitVariance`] for a negative or non-finite
    ///   initial variance.
    /// - [`StarmaError::InsufficientTimeSteps`] if `T ≤ t0`.
    /// - [`StarmaError::UnknownMaskKey`] / [`StarmaError::NoFreeParameters`]
    ///   from resolving `mask`.
    pub fn new(
        series: &'a LatticeSeries, stack: &'a NeighborhoodStack, init_variance: Array1<f64>,
        init_params: &ParameterSet, mask: &ParameterMask, options: FitOptions,
    ) -> StarmaResult<Self> {
        validate_stack_matches_series(stack, series)?;
        validate_init_variance(init_variance.view(), series.n_locations())?;
        validate_stack_covers(stack, init_params)?;
        let t0 = init_params.max_temporal_lag();
        validate_time_steps(series, t0)?;
        let free_map = FreeParamMap::resolve(init_params, mask)?;
        let free_keys = free_map.keys();
        let scratch =
            RecursionScratch::new(series.n_locations(), series.n_steps(), free_keys.len(), t0);
        debug!(
            n_locations = series.n_locations(),
            n_steps = series.n_steps(),
            n_params = init_params.n_params(),
            n_free = free_keys.len(),
            t0,
            "built likelihood bundle"
        );
        Ok(StarmaGarch {
            series,
            stack,
            init_variance,
            free_map,
            free_keys,
            t0,
            options,
            scratch: RefCell::new(scratch),
        })
    }

    /// Starting point in optimizer space.
    pub fn theta0(&self) -> &Theta {
        self.free_map.theta0()
    }

    /// Free keys in optimizer order.
    pub fn free_keys(&self) -> &[ParamKey] {
        &self.free_keys
    }

    pub fn n_free(&self) -> usize {
        self.free_keys.len()
    }

    /// Number of leading columns the likelihood conditions on.
    pub fn t0(&self) -> usize {
        self.t0
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Model-space parameters for an optimizer vector.
    pub fn reconstruct(&self, theta: &Theta) -> StarmaResult<ParameterSet> {
        Ok(self.free_map.reconstruct(theta)?)
    }

    /// Negative log-likelihood `−ℓ(θ)` on the bundled series.
    pub fn negloglik(&self, theta: &Theta) -> StarmaResult<f64> {
        let params = self.free_map.reconstruct(theta)?;
        let mut scratch = self.scratch.borrow_mut();
        let ll = loglik(
            &params,
            self.stack,
            self.series.view(),
            self.init_variance.view(),
            &self.options.variance_guards,
            &mut scratch,
        )?;
        Ok(-ll)
    }

    /// Gradient of [`negloglik`](Self::negloglik) with respect to `θ`.
    pub fn gradient(&self, theta: &Theta) -> StarmaResult<Grad> {
        let (_, grad) = self.loglik_grad(theta, self.series)?;
        Ok(-grad)
    }

    /// Hessian of [`negloglik`](Self::negloglik) with respect to `θ`, which
    /// is the observed information `−∇²ℓ(θ)`.
    pub fn hessian(&self, theta: &Theta) -> StarmaResult<Array2<f64>> {
        Ok(observed_information(self, theta, self.series)?)
    }

    /// Maximize the likelihood on `data` and assemble a [`FitResult`].
    ///
    /// `data` must have the shape of the series the bundle was built on.
    /// Non-convergence is reported through [`FitResult::converged`] and a
    /// warning rather than an error. `verbose` turns on the optimizer's
    /// progress logging for this call.
    ///
    /// # Errors
    /// - [`StarmaError::DimensionMismatch`] for a mis-shaped `data`.
    /// - [`StarmaError::OptimizationFailed`] if the optimizer itself fails
    ///   (invalid options, non-finite objective at the start, ...).
    pub fn fit(&self, data: &LatticeSeries, verbose: bool) -> StarmaResult<FitResult> {
        self.check_data(data)?;
        let mut mle_opts = self.options.mle_opts.clone();
        mle_opts.verbose |= verbose;
        info!(
            n_locations = data.n_locations(),
            n_steps = data.n_steps(),
            n_free = self.n_free(),
            t0 = self.t0,
            "fitting STARMA-GARCH model"
        );

        let outcome = maximize(self, self.theta0().clone(), data, &mle_opts)?;
        if !outcome.converged {
            warn!(
                status = %outcome.status,
                iterations = outcome.iterations,
                "optimizer stopped without converging"
            );
        }
        let theta_hat = outcome.theta_hat;
        let params = self.free_map.reconstruct(&theta_hat)?;
        let (log_likelihood, residuals, variance) = {
            let mut scratch = self.scratch.borrow_mut();
            let ll = loglik(
                &params,
                self.stack,
                data.view(),
                self.init_variance.view(),
                &self.options.variance_guards,
                &mut scratch,
            )?;
            (ll, scratch.eps.clone(), scratch.h.clone())
        };
        let fitted = &data.view() - &residuals;

        let estimates = self.free_map.model_values(&theta_hat)?;
        let std_errors = if self.options.compute_std_errors {
            self.model_std_errors(&theta_hat, data)?
        } else {
            Array1::from_elem(self.n_free(), f64::NAN)
        };
        let (z_values, p_values) = wald_statistics(&estimates, &std_errors)?;

        let k = self.n_free() as f64;
        let n_obs = data.n_locations() * (data.n_steps() - self.t0);
        let aic = 2.0 * k - 2.0 * log_likelihood;
        let bic = k * (n_obs as f64).ln() - 2.0 * log_likelihood;
        info!(
            log_likelihood,
            aic,
            bic,
            converged = outcome.converged,
            iterations = outcome.iterations,
            "fit finished"
        );

        Ok(FitResult {
            keys: self.free_keys.clone(),
            params,
            theta_hat,
            estimates,
            std_errors,
            z_values,
            p_values,
            log_likelihood,
            aic,
            bic,
            residuals,
            fitted_values: fitted,
            variance,
            n_obs,
            t0: self.t0,
            converged: outcome.converged,
            status: outcome.status,
            iterations: outcome.iterations,
        })
    }

    // ---- Helper methods ----

    /// `ℓ(θ)` and `∇ℓ(θ)` in optimizer space.
    fn loglik_grad(&self, theta: &Theta, data: &LatticeSeries) -> StarmaResult<(f64, Grad)> {
        let params = self.free_map.reconstruct(theta)?;
        let jacobian = self.free_map.jacobian_diag(theta)?;
        let mut scratch = self.scratch.borrow_mut();
        let (ll, grad) = loglik_and_grad(
            &params,
            self.stack,
            data.view(),
            self.init_variance.view(),
            &self.options.variance_guards,
            &self.free_keys,
            &mut scratch,
        )?;
        Ok((ll, grad * jacobian))
    }

    /// Delta-method standard errors in model space. An information matrix
    /// that cannot be formed yields all-`NaN` errors.
    fn model_std_errors(
        &self, theta_hat: &Theta, data: &LatticeSeries,
    ) -> StarmaResult<Array1<f64>> {
        let info = observed_information(self, theta_hat, data);
        let se_theta = match info.and_then(|info| standard_errors(&info)) {
            Ok(se) => se,
            Err(err) => {
                warn!(error = %err, "observed information unavailable; standard errors set to NaN");
                return Ok(Array1::from_elem(self.n_free(), f64::NAN));
            }
        };
        let n_nan = se_theta.iter().filter(|v| v.is_nan()).count();
        if n_nan > 0 {
            warn!(n_nan, "singular observed information; some standard errors are NaN");
        }
        let jacobian = self.free_map.jacobian_diag(theta_hat)?;
        Ok(delta_method_diag(jacobian.view(), se_theta.view()))
    }

    fn check_data(&self, data: &LatticeSeries) -> StarmaResult<()> {
        if data.n_locations() != self.series.n_locations() {
            return Err(StarmaError::DimensionMismatch {
                what: "series locations",
                expected: self.series.n_locations(),
                actual: data.n_locations(),
            });
        }
        if data.n_steps() != self.series.n_steps() {
            return Err(StarmaError::DimensionMismatch {
                what: "series time steps",
                expected: self.series.n_steps(),
                actual: data.n_steps(),
            });
        }
        Ok(())
    }
}

/// z-values and two-sided normal p-values; `NaN` standard errors propagate.
fn wald_statistics(
    estimates: &Array1<f64>, std_errors: &Array1<f64>,
) -> StarmaResult<(Array1<f64>, Array1<f64>)> {
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| StarmaError::InferenceFailed { text: e.to_string() })?;
    let z = estimates / std_errors;
    let p = z.mapv(|z| if z.is_nan() { f64::NAN } else { 2.0 * (1.0 - normal.cdf(z.abs())) });
    Ok((z, p))
}

impl LogLikelihood for StarmaGarch<'_> {
    type Data = LatticeSeries;

    /// Conditional Gaussian log-likelihood `ℓ(θ)`.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        self.check_data(data)?;
        let params = self.free_map.reconstruct(theta)?;
        let mut scratch = self.scratch.borrow_mut();
        Ok(loglik(
            &params,
            self.stack,
            data.view(),
            self.init_variance.view(),
            &self.options.variance_guards,
            &mut scratch,
        )?)
    }

    /// Rejects a wrong-length or non-finite `θ` and a mis-shaped series.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        self.check_data(data)?;
        if theta.len() != self.n_free() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.n_free(),
                actual: theta.len(),
            });
        }
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(OptError::InvalidThetaInput { index, value });
        }
        Ok(())
    }

    /// Analytic `∇ℓ(θ)`: model-space sensitivities times the transform
    /// Jacobian.
    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        self.check_data(data)?;
        let (_, grad) = self.loglik_grad(theta, data)?;
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::starma::core::{
        grid::{GridShape, Topology},
        options::SimOpts,
        params::ParamBlock,
        simulate::simulate_series,
    };
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction-time validation of the bundle.
    // - Agreement of the analytic optimizer-space gradient with central
    //   differences of the objective, under a partial mask.
    // - A closed-form fit: only `mu` free on white noise.
    //
    // They intentionally DO NOT cover:
    // - Parameter recovery on simulated STARMA-GARCH data; see the
    //   integration tests.
    // -------------------------------------------------------------------------

    fn params() -> ParameterSet {
        ParameterSet::new(
            0.1,
            array![[0.3], [0.15]],
            array![[0.1]],
            0.2,
            array![[0.1], [0.05]],
            array![[0.5]],
        )
        .expect("valid params")
    }

    fn mu_only(mu: f64, omega: f64) -> ParameterSet {
        ParameterSet::new(
            mu,
            Array2::zeros((0, 0)),
            Array2::zeros((0, 0)),
            omega,
            Array2::zeros((0, 0)),
            Array2::zeros((0, 0)),
        )
        .expect("valid params")
    }

    #[test]
    // Purpose
    // -------
    // Ensure `new` rejects inconsistent inputs with typed errors.
    //
    // Given
    // -----
    // - A 3 × 3 rook torus with a two-lag stack and a 9 × 40 series.
    //
    // Expect
    // ------
    // - `DimensionMismatch` for a short initial variance and a one-lag
    //   stack, `InvalidInitVariance` for a negative entry,
    //   `InsufficientTimeSteps` for a single-column series,
    //   `UnknownMaskKey` for a key outside the layout and
    //   `NoFreeParameters` when everything is fixed.
    fn new_rejects_inconsistent_inputs() {
        // Arrange
        let grid = GridShape::new(&[3, 3]).expect("valid grid");
        let stack = NeighborhoodStack::build(&grid, 2, Topology::Rook, true).expect("stack");
        let short_stack = NeighborhoodStack::build(&grid, 1, Topology::Rook, true).expect("stack");
        let opts_sim = SimOpts::seeded(5);
        let series =
            simulate_series(&params(), 40, &grid, Some(&stack), Topology::Rook, true, &opts_sim)
                .expect("sim");
        let one_col = LatticeSeries::new(Array2::zeros((9, 1))).expect("series");
        let ones = Array1::from_elem(9, 1.0);
        let mut negative = ones.clone();
        negative[4] = -1.0;
        let all_fixed = ParamBlock::ALL
            .iter()
            .fold(ParameterMask::all_free(), |m, &b| m.fix_block(b, &params()));
        let free = ParameterMask::all_free();
        let opts = FitOptions::default;

        // Act / Assert
        assert!(matches!(
            StarmaGarch::new(&series, &stack, Array1::ones(4), &params(), &free, opts()),
            Err(StarmaError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            StarmaGarch::new(&series, &short_stack, ones.clone(), &params(), &free, opts()),
            Err(StarmaError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            StarmaGarch::new(&series, &stack, negative, &params(), &free, opts()),
            Err(StarmaError::InvalidInitVariance { index: 4, .. })
        ));
        assert!(matches!(
            StarmaGarch::new(&one_col, &stack, ones.clone(), &params(), &free, opts()),
            Err(StarmaError::InsufficientTimeSteps { .. })
        ));
        let bad_key =
            ParameterMask::all_free().with_fixed(ParamKey::Beta { spatial: 1, temporal: 1 }, 0.0);
        assert!(matches!(
            StarmaGarch::new(&series, &stack, ones.clone(), &params(), &bad_key, opts()),
            Err(StarmaError::UnknownMaskKey { .. })
        ));
        assert_eq!(
            StarmaGarch::new(&series, &stack, ones, &params(), &all_fixed, opts()).err(),
            Some(StarmaError::NoFreeParameters)
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify the optimizer-space gradient against central differences of
    // the objective with a block of the layout fixed.
    //
    // Given
    // -----
    // - A 3 × 3 rook torus, 60 simulated steps, the `theta` block fixed, and
    //   an evaluation point away from θ₀.
    //
    // Expect
    // ------
    // - Each gradient entry within 1e-4 (relative) of its difference
    //   quotient; `negloglik` and `gradient` are the negated `value` and
    //   `grad`.
    fn gradient_matches_central_differences_under_mask() {
        // Arrange
        let grid = GridShape::new(&[3, 3]).expect("valid grid");
        let stack = NeighborhoodStack::build(&grid, 2, Topology::Rook, true).expect("stack");
        let opts_sim = SimOpts::seeded(9);
        let series =
            simulate_series(&params(), 60, &grid, Some(&stack), Topology::Rook, true, &opts_sim)
                .expect("sim");
        let mask = ParameterMask::all_free().fix_block(ParamBlock::Theta, &params());
        let init = Array1::from_elem(9, 0.5);
        let model = StarmaGarch::new(&series, &stack, init, &params(), &mask, FitOptions::default())
            .expect("bundle");
        let theta = model.theta0().mapv(|x| x + 0.05);

        // Act
        let grad = model.grad(&theta, &series).expect("gradient");
        let value = model.value(&theta, &series).expect("value");

        // Assert
        assert_eq!(grad.len(), 7);
        let step = 1e-6;
        for k in 0..grad.len() {
            let mut up = theta.clone();
            let mut down = theta.clone();
            up[k] += step;
            down[k] -= step;
            let fd = (model.value(&up, &series).expect("value")
                - model.value(&down, &series).expect("value"))
                / (2.0 * step);
            assert!(
                (grad[k] - fd).abs() <= 1e-4 * fd.abs().max(1.0),
                "key {}: analytic {} vs fd {}",
                model.free_keys()[k],
                grad[k],
                fd
            );
        }
        assert_eq!(model.negloglik(&theta).expect("cost"), -value);
        assert_eq!(model.gradient(&theta).expect("cost gradient"), -grad);
    }

    #[test]
    // Purpose
    // -------
    // Check `fit` against the closed form when only `mu` is free.
    //
    // Given
    // -----
    // - A 2 × 2 grid, 50 steps of N(2, 1) noise simulated with only `mu` and
    //   `omega` active, `omega` fixed at 1 and `mu` started at 0.
    //
    // Expect
    // ------
    // - `mu_hat` equal to the sample mean, SE equal to `1/sqrt(N·T)`,
    //   AIC / BIC from one free parameter, and a converged run.
    fn fit_recovers_closed_form_mean() {
        // Arrange
        let grid = GridShape::new(&[2, 2]).expect("valid grid");
        let series = simulate_series(
            &mu_only(2.0, 1.0),
            50,
            &grid,
            None,
            Topology::Rook,
            false,
            &SimOpts::seeded(21),
        )
        .expect("sim");
        let stack = NeighborhoodStack::build(&grid, 1, Topology::Rook, false).expect("stack");
        let mask = ParameterMask::all_free().with_fixed(ParamKey::Omega, 1.0);
        let start = mu_only(0.0, 1.0);
        let model =
            StarmaGarch::new(&series, &stack, Array1::ones(4), &start, &mask, FitOptions::default())
                .expect("bundle");

        // Act
        let fit = model.fit(&series, false).expect("fit");

        // Assert
        let mean = series.view().mean().expect("non-empty");
        let n_obs = 4.0 * 50.0;
        assert!(fit.converged(), "status: {}", fit.status());
        assert_eq!(fit.n_free(), 1);
        assert_eq!(fit.n_obs(), 200);
        assert!((fit.estimates()[0] - mean).abs() < 1e-5);
        assert!((fit.std_errors()[0] - 1.0 / f64::sqrt(n_obs)).abs() < 1e-4);
        assert!((fit.aic() - (2.0 - 2.0 * fit.log_likelihood())).abs() < 1e-12);
        assert!((fit.bic() - (n_obs.ln() - 2.0 * fit.log_likelihood())).abs() < 1e-12);
        assert_eq!(fit.coefficients().omega, 1.0);
        assert!(fit.p_values()[0] < 1e-6);
    }
}
