//! STARMA-GARCH recursions: conditional mean, conditional variance, the
//! Gaussian conditional log-likelihood and its analytic gradient.
//!
//! ## Model
//! With `W_0 = I, W_1, …` from the neighborhood stack:
//!
//! ```text
//! m_t = μ + Σ_j Σ_l φ[l, j-1] W_l Y_{t-j} + Σ_j Σ_l θ[l, j-1] W_l ε_{t-j}
//! ε_t = Y_t − m_t
//! h_t = ω + Σ_j Σ_l α[l, j-1] W_l ε²_{t-j} + Σ_j Σ_l β[l, j-1] W_l h_{t-j}
//! ℓ   = −½ Σ_{t ≥ t0} Σ_i [ ln 2π + ln h_{t,i} + ε²_{t,i} / h_{t,i} ]
//! ```
//!
//! The likelihood conditions on the first `t0 = max(p, q, r, s)` columns:
//! there `ε = 0` and `h` equals the supplied initial variance.
//!
//! ## Numerical guards
//! - `h_t` is clamped into the [`VarianceGuards`] range.
//! - `|ε_t|` is capped at [`RESIDUAL_CAP`].
//!
//! Both keep the objective finite while a line search probes explosive
//! coefficients. A clamped or capped entry has zero sensitivity, which is the
//! exact derivative of the guarded objective.
//!
//! ## Gradient
//! Forward sensitivities `∂ε_t/∂ψ` and `∂h_t/∂ψ` are propagated alongside the
//! filter for each requested key `ψ`:
//!
//! ```text
//! ∂ε_t = −( ∂m_t/∂ψ |direct + Σ θ W_l ∂ε_{t-j} )
//! ∂h_t =    ∂h_t/∂ψ |direct + Σ α W_l (2 ε_{t-j} ⊙ ∂ε_{t-j}) + Σ β W_l ∂h_{t-j}
//! ∂ℓ   = −½ Σ [ ∂h/h · (1 − ε²/h) + 2 ε ∂ε / h ]
//! ```
//!
//! Sensitivities are kept in a ring buffer of `t0 + 1` slots.
use crate::starma::{
    core::{
        guards::VarianceGuards,
        neighborhood::NeighborhoodStack,
        params::{ParamKey, ParameterSet},
        validation::{validate_init_variance, validate_stack_covers},
    },
    errors::{StarmaError, StarmaResult},
};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayViewMut1, Zip, s};
use std::f64::consts::PI;

/// Largest residual magnitude the likelihood evaluates.
pub const RESIDUAL_CAP: f64 = 1e10;

/// Reusable buffers for likelihood / gradient evaluation.
///
/// Sizes are fixed by the series (`N × T`), the number of keys the gradient
/// is taken for, and the longest temporal lag.
#[derive(Debug, Clone, PartialEq)]
pub struct RecursionScratch {
    /// Residual path `ε`, `N × T`.
    pub eps: Array2<f64>,
    /// Conditional-variance path `h`, `N × T`.
    pub h: Array2<f64>,
    d_eps: Array3<f64>,
    d_h: Array3<f64>,
    mean: Array1<f64>,
    sq: Array1<f64>,
    d_tmp: Array1<f64>,
    capped: Vec<bool>,
    clamped: Vec<bool>,
}

impl RecursionScratch {
    pub fn new(n_locations: usize, n_steps: usize, n_keys: usize, max_lag: usize) -> Self {
        let slots = max_lag + 1;
        RecursionScratch {
            eps: Array2::zeros((n_locations, n_steps)),
            h: Array2::zeros((n_locations, n_steps)),
            d_eps: Array3::zeros((slots, n_keys, n_locations)),
            d_h: Array3::zeros((slots, n_keys, n_locations)),
            mean: Array1::zeros(n_locations),
            sq: Array1::zeros(n_locations),
            d_tmp: Array1::zeros(n_locations),
            capped: vec![false; n_locations],
            clamped: vec![false; n_locations],
        }
    }

    fn n_keys(&self) -> usize {
        self.d_eps.shape()[1]
    }
}

/// Write `m_t` into `out`.
///
/// Requires `t ≥ p` and `t ≥ q` so every lagged column exists.
pub(crate) fn conditional_mean(
    params: &ParameterSet, stack: &NeighborhoodStack, y: ArrayView2<f64>, eps: ArrayView2<f64>,
    t: usize, mut out: ArrayViewMut1<f64>,
) {
    out.fill(params.mu);
    let (rows, cols) = params.phi.dim();
    for j in 1..=cols {
        for l in 0..rows {
            stack.mix_add(l, params.phi[[l, j - 1]], y.column(t - j), out.view_mut());
        }
    }
    let (rows, cols) = params.theta.dim();
    for j in 1..=cols {
        for l in 0..rows {
            stack.mix_add(l, params.theta[[l, j - 1]], eps.column(t - j), out.view_mut());
        }
    }
}

/// Write the unguarded `h_t` into `out`; `sq` is scratch of length `N`.
pub(crate) fn conditional_variance(
    params: &ParameterSet, stack: &NeighborhoodStack, eps: ArrayView2<f64>, h: ArrayView2<f64>,
    t: usize, sq: &mut Array1<f64>, mut out: ArrayViewMut1<f64>,
) {
    out.fill(params.omega);
    let (rows, cols) = params.alpha.dim();
    for j in 1..=cols {
        Zip::from(&mut *sq).and(eps.column(t - j)).for_each(|s, &e| *s = e * e);
        for l in 0..rows {
            stack.mix_add(l, params.alpha[[l, j - 1]], sq.view(), out.view_mut());
        }
    }
    let (rows, cols) = params.beta.dim();
    for j in 1..=cols {
        for l in 0..rows {
            stack.mix_add(l, params.beta[[l, j - 1]], h.column(t - j), out.view_mut());
        }
    }
}

/// Conditional log-likelihood. Leaves `ε` and `h` in `scratch`.
///
/// # Errors
/// - [`StarmaError::DimensionMismatch`] if the stack, `y`, `init_variance`
///   and `scratch` disagree on their sizes, or the stack is shorter than the
///   spatial order of `params`.
/// - [`StarmaError::InvalidInitVariance`] for a negative or non-finite
///   initial variance.
/// - [`StarmaError::NonFiniteVariance`] if the variance recursion yields NaN.
pub fn loglik(
    params: &ParameterSet, stack: &NeighborhoodStack, y: ArrayView2<f64>,
    init_variance: ArrayView1<f64>, guards: &VarianceGuards, scratch: &mut RecursionScratch,
) -> StarmaResult<f64> {
    run(params, stack, y, init_variance, guards, &[], scratch).map(|(ll, _)| ll)
}

/// Conditional log-likelihood and `∂ℓ/∂ψ` for each of `keys` (model space).
///
/// `scratch` must have been sized for `keys.len()` sensitivities and every
/// key must belong to the layout of `params`. Otherwise fails like [`loglik`].
pub fn loglik_and_grad(
    params: &ParameterSet, stack: &NeighborhoodStack, y: ArrayView2<f64>,
    init_variance: ArrayView1<f64>, guards: &VarianceGuards, keys: &[ParamKey],
    scratch: &mut RecursionScratch,
) -> StarmaResult<(f64, Array1<f64>)> {
    if scratch.n_keys() != keys.len() {
        return Err(StarmaError::DimensionMismatch {
            what: "gradient keys",
            expected: scratch.n_keys(),
            actual: keys.len(),
        });
    }
    for &key in keys {
        params.get(key)?;
    }
    run(params, stack, y, init_variance, guards, keys, scratch)
}

fn check_shapes(
    params: &ParameterSet, stack: &NeighborhoodStack, y: ArrayView2<f64>,
    init_variance: ArrayView1<f64>, scratch: &RecursionScratch,
) -> StarmaResult<()> {
    let (n, n_steps) = y.dim();
    if stack.n_locations() != n {
        return Err(StarmaError::DimensionMismatch {
            what: "series locations",
            expected: stack.n_locations(),
            actual: n,
        });
    }
    validate_stack_covers(stack, params)?;
    validate_init_variance(init_variance, n)?;
    let (rows, cols) = scratch.eps.dim();
    if rows != n {
        return Err(StarmaError::DimensionMismatch {
            what: "scratch locations",
            expected: n,
            actual: rows,
        });
    }
    if cols != n_steps {
        return Err(StarmaError::DimensionMismatch {
            what: "scratch time steps",
            expected: n_steps,
            actual: cols,
        });
    }
    Ok(())
}

fn run(
    params: &ParameterSet, stack: &NeighborhoodStack, y: ArrayView2<f64>,
    init_variance: ArrayView1<f64>, guards: &VarianceGuards, keys: &[ParamKey],
    scratch: &mut RecursionScratch,
) -> StarmaResult<(f64, Array1<f64>)> {
    check_shapes(params, stack, y, init_variance, scratch)?;
    let t0 = params.max_temporal_lag();
    let slots = scratch.d_eps.shape()[0];
    if slots < t0 + 1 {
        return Err(StarmaError::DimensionMismatch {
            what: "sensitivity buffer slots",
            expected: t0 + 1,
            actual: slots,
        });
    }
    let (n, n_steps) = y.dim();
    let ln_2pi = (2.0 * PI).ln();
    let mut ll = 0.0;
    let mut grad = Array1::zeros(keys.len());

    let RecursionScratch { eps, h, d_eps, d_h, mean, sq, d_tmp, capped, clamped } = scratch;

    for t in 0..n_steps {
        let slot = t % slots;
        if t < t0 {
            eps.column_mut(t).fill(0.0);
            h.column_mut(t).assign(&init_variance);
            d_eps.slice_mut(s![slot, .., ..]).fill(0.0);
            d_h.slice_mut(s![slot, .., ..]).fill(0.0);
            continue;
        }

        // ---- residual ----
        conditional_mean(params, stack, y, eps.view(), t, mean.view_mut());
        for i in 0..n {
            let e = y[[i, t]] - mean[i];
            let (e, cap) = if e.is_nan() {
                (RESIDUAL_CAP, true)
            } else if e.abs() > RESIDUAL_CAP {
                (RESIDUAL_CAP.copysign(e), true)
            } else {
                (e, false)
            };
            eps[[i, t]] = e;
            capped[i] = cap;
        }

        // ---- variance ----
        conditional_variance(params, stack, eps.view(), h.view(), t, sq, mean.view_mut());
        for i in 0..n {
            let raw = mean[i];
            if raw.is_nan() {
                return Err(StarmaError::NonFiniteVariance { t, location: i, value: raw });
            }
            let (v, hit) = guards.clamp(raw);
            h[[i, t]] = v;
            clamped[i] = hit;
        }

        for i in 0..n {
            let (e, v) = (eps[[i, t]], h[[i, t]]);
            ll -= 0.5 * (ln_2pi + v.ln() + e * e / v);
        }

        // ---- sensitivities ----
        for (k, key) in keys.iter().enumerate() {
            d_tmp.fill(0.0);
            match *key {
                ParamKey::Mu => d_tmp.fill(1.0),
                ParamKey::Phi { spatial, temporal } => {
                    stack.mix_add(spatial, 1.0, y.column(t - temporal), d_tmp.view_mut())
                }
                ParamKey::Theta { spatial, temporal } => {
                    stack.mix_add(spatial, 1.0, eps.column(t - temporal), d_tmp.view_mut())
                }
                _ => {}
            }
            let (rows, cols) = params.theta.dim();
            for j in 1..=cols {
                let prev = d_eps.slice(s![(t - j) % slots, k, ..]);
                for l in 0..rows {
                    stack.mix_add(l, params.theta[[l, j - 1]], prev, d_tmp.view_mut());
                }
            }
            for i in 0..n {
                d_eps[[slot, k, i]] = if capped[i] { 0.0 } else { -d_tmp[i] };
            }

            d_tmp.fill(0.0);
            match *key {
                ParamKey::Omega => d_tmp.fill(1.0),
                ParamKey::Alpha { spatial, temporal } => {
                    Zip::from(&mut *sq)
                        .and(eps.column(t - temporal))
                        .for_each(|s, &e| *s = e * e);
                    stack.mix_add(spatial, 1.0, sq.view(), d_tmp.view_mut());
                }
                ParamKey::Beta { spatial, temporal } => {
                    stack.mix_add(spatial, 1.0, h.column(t - temporal), d_tmp.view_mut())
                }
                _ => {}
            }
            let (rows, cols) = params.alpha.dim();
            for j in 1..=cols {
                let prev = (t - j) % slots;
                Zip::from(&mut *sq)
                    .and(eps.column(t - j))
                    .and(d_eps.slice(s![prev, k, ..]))
                    .for_each(|s, &e, &de| *s = 2.0 * e * de);
                for l in 0..rows {
                    stack.mix_add(l, params.alpha[[l, j - 1]], sq.view(), d_tmp.view_mut());
                }
            }
            let (rows, cols) = params.beta.dim();
            for j in 1..=cols {
                let prev = d_h.slice(s![(t - j) % slots, k, ..]);
                for l in 0..rows {
                    stack.mix_add(l, params.beta[[l, j - 1]], prev, d_tmp.view_mut());
                }
            }
            let mut g = 0.0;
            for i in 0..n {
                let dh = if clamped[i] { 0.0 } else { d_tmp[i] };
                d_h[[slot, k, i]] = dh;
                let (e, v, de) = (eps[[i, t]], h[[i, t]], d_eps[[slot, k, i]]);
                g -= 0.5 * (dh / v * (1.0 - e * e / v) + 2.0 * e * de / v);
            }
            grad[k] += g;
        }
    }
    Ok((ll, grad))
}
