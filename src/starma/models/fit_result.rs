//! Estimation output of [`StarmaGarch::fit`](super::likelihood::StarmaGarch::fit).
//!
//! A [`FitResult`] is built once per optimizer run and never mutated. Per-key
//! statistics (`estimates`, `std_errors`, `z_values`, `p_values`) follow the
//! free-key order of the likelihood bundle; fixed entries only appear in the
//! full [`ParameterSet`] returned by [`FitResult::coefficients`].
use crate::{
    optimization::loglik_optimizer::Theta,
    starma::core::params::{ParamKey, ParameterSet},
};
use ndarray::{Array1, Array2, s};

/// One row of [`FitResult::coef_table`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefRow {
    pub key: ParamKey,
    pub estimate: f64,
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub(crate) keys: Vec<ParamKey>,
    pub(crate) params: ParameterSet,
    pub(crate) theta_hat: Theta,
    pub(crate) estimates: Array1<f64>,
    pub(crate) std_errors: Array1<f64>,
    pub(crate) z_values: Array1<f64>,
    pub(crate) p_values: Array1<f64>,
    pub(crate) log_likelihood: f64,
    pub(crate) aic: f64,
    pub(crate) bic: f64,
    pub(crate) residuals: Array2<f64>,
    pub(crate) fitted_values: Array2<f64>,
    pub(crate) variance: Array2<f64>,
    pub(crate) n_obs: usize,
    pub(crate) t0: usize,
    pub(crate) converged: bool,
    pub(crate) status: String,
    pub(crate) iterations: usize,
}

impl FitResult {
    /// Full estimated parameter set, fixed entries included.
    pub fn coefficients(&self) -> &ParameterSet {
        &self.params
    }

    /// Estimated value of any entry of the layout, free or fixed.
    pub fn coefficient(&self, key: ParamKey) -> Option<f64> {
        self.params.get(key).ok()
    }

    /// Free keys, in the order of the per-key statistics.
    pub fn free_keys(&self) -> &[ParamKey] {
        &self.keys
    }

    pub fn estimates(&self) -> &Array1<f64> {
        &self.estimates
    }

    /// Delta-method standard errors; `NaN` where the information matrix is
    /// singular or was not computed.
    pub fn std_errors(&self) -> &Array1<f64> {
        &self.std_errors
    }

    pub fn z_values(&self) -> &Array1<f64> {
        &self.z_values
    }

    /// Two-sided normal p-values.
    pub fn p_values(&self) -> &Array1<f64> {
        &self.p_values
    }

    /// Key, estimate, SE, z and p for each free parameter.
    pub fn coef_table(&self) -> Vec<CoefRow> {
        self.keys
            .iter()
            .enumerate()
            .map(|(i, &key)| CoefRow {
                key,
                estimate: self.estimates[i],
                std_error: self.std_errors[i],
                z_value: self.z_values[i],
                p_value: self.p_values[i],
            })
            .collect()
    }

    /// Optimizer-space optimum, usable as a warm start.
    pub fn theta_hat(&self) -> &Theta {
        &self.theta_hat
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Residuals `ε`, `N × T`; the first `t0` columns are zero.
    pub fn residuals(&self) -> &Array2<f64> {
        &self.residuals
    }

    /// Conditional means `Y − ε`, `N × T`.
    pub fn fitted_values(&self) -> &Array2<f64> {
        &self.fitted_values
    }

    /// Conditional variance path `h`, `N × T`; the first `t0` columns hold
    /// the initial variance.
    pub fn conditional_variance(&self) -> &Array2<f64> {
        &self.variance
    }

    /// `ε / sqrt(h)` over the in-sample columns `t ≥ t0`, `N × (T − t0)`.
    pub fn standardized_residuals(&self) -> Array2<f64> {
        let eps = self.residuals.slice(s![.., self.t0..]);
        let h = self.variance.slice(s![.., self.t0..]);
        &eps / &h.mapv(f64::sqrt)
    }

    pub fn n_free(&self) -> usize {
        self.keys.len()
    }

    /// Number of likelihood terms, `N · (T − t0)`.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn t0(&self) -> usize {
        self.t0
    }

    /// `true` only for a tolerance-based stop of the optimizer.
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Table assembly and lookups on a hand-built result.
    // - Standardized residuals skip the conditioning window.
    // -------------------------------------------------------------------------

    fn result() -> FitResult {
        let params = ParameterSet::new(
            0.5,
            array![[0.2]],
            Array2::zeros((0, 0)),
            1.0,
            Array2::zeros((0, 0)),
            Array2::zeros((0, 0)),
        )
        .expect("valid params");
        FitResult {
            keys: vec![ParamKey::Mu, ParamKey::Phi { spatial: 0, temporal: 1 }],
            params,
            theta_hat: array![0.5, 0.2],
            estimates: array![0.5, 0.2],
            std_errors: array![0.25, f64::NAN],
            z_values: array![2.0, f64::NAN],
            p_values: array![0.0455, f64::NAN],
            log_likelihood: -10.0,
            aic: 24.0,
            bic: 25.0,
            residuals: array![[0.0, 2.0, -1.0], [0.0, 0.5, 3.0]],
            fitted_values: Array2::zeros((2, 3)),
            variance: array![[9.0, 4.0, 1.0], [9.0, 0.25, 9.0]],
            n_obs: 4,
            t0: 1,
            converged: true,
            status: "Solver converged".to_string(),
            iterations: 7,
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the coefficient table and key lookups.
    //
    // Given
    // -----
    // - A result with `mu` and `phi[0,1]` free and `omega` fixed at 1.
    //
    // Expect
    // ------
    // - Two rows in key order with NaN carried through; lookups hit fixed
    //   entries and miss keys outside the layout.
    fn coef_table_and_lookup() {
        // Arrange
        let fit = result();

        // Act
        let table = fit.coef_table();

        // Assert
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].key, ParamKey::Mu);
        assert_eq!(table[0].z_value, 2.0);
        assert!(table[1].std_error.is_nan());
        assert_eq!(fit.coefficient(ParamKey::Omega), Some(1.0));
        assert_eq!(fit.coefficient(ParamKey::Phi { spatial: 0, temporal: 1 }), Some(0.2));
        assert_eq!(fit.coefficient(ParamKey::Alpha { spatial: 0, temporal: 1 }), None);
        assert_eq!(fit.n_free(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Check `standardized_residuals` divides by `sqrt(h)` after `t0`.
    //
    // Given
    // -----
    // - `t0 = 1` and residual / variance paths with exact square roots.
    //
    // Expect
    // ------
    // - A 2 × 2 matrix [[1, -1], [1, 1]].
    fn standardized_residuals_skip_window() {
        // Act
        let z = result().standardized_residuals();

        // Assert
        assert_eq!(z, array![[1.0, -1.0], [1.0, 1.0]]);
    }
}
