//! Integration tests for the STARMA-GARCH lattice pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end flow: grid → neighborhood stack → simulation →
//!   likelihood bundle → fit → standard errors and diagnostics.
//! - Exercise realistic settings (tori and bounded grids, several spatial
//!   orders, masked and unmasked layouts) rather than toy edge cases only.
//!
//! Coverage
//! --------
//! - `starma::core::neighborhood`: identity-only stacks and row sums.
//! - `starma::core::simulate`: seeded determinism and burn-in handling.
//! - `starma::models`: masking, round-trip recovery, NaN standard errors on
//!   unidentified directions, and dimension checks.
//!
//! Exclusions
//! ----------
//! - Fine-grained checks of recursions, transforms and guards; those are
//!   covered by unit tests.
//! - Long-sample stress runs; these belong in benchmarks.
use ndarray::{Array1, Array2, array};
use rust_starmagarch::{
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
    starma::{
        FitOptions, FitResult, GridShape, LatticeSeries, NeighborhoodStack, ParamBlock, ParamKey,
        ParameterMask, ParameterSet, SimOpts, StarmaError, StarmaGarch, Topology,
        VarianceGuards, simulate_series,
    },
};
use tracing_subscriber::EnvFilter;

/// Route crate logs to the test harness; `RUST_LOG` overrides the default
/// `warn` level. Safe to call from every test.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rust_starmagarch=warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Purpose
/// -------
/// Fit options with tolerances suited to a few thousand likelihood terms.
///
/// Configuration
/// -------------
/// - `tol_grad = 1e-4`, `tol_cost = 1e-9`, `max_iter = 500`.
/// - More–Thuente line search, default L-BFGS memory.
/// - Default variance guards; standard errors on.
fn fit_options() -> FitOptions {
    let tols = Tolerances::new(Some(1e-4), Some(1e-9), Some(500))
        .expect("Tolerances::new should accept positive tolerances");
    let mle_opts = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None)
        .expect("MLEOptions::new should accept default memory");
    FitOptions::new(mle_opts, VarianceGuards::default(), true)
}

/// Purpose
/// -------
/// The 12-entry layout used for masking tests: two spatial lags on every
/// matrix block and two temporal lags on `beta`.
fn twelve_param_set(mu: f64, phi: f64, theta: f64) -> ParameterSet {
    ParameterSet::new(
        mu,
        array![[phi], [phi / 2.0]],
        array![[theta], [theta / 2.0]],
        0.3,
        array![[0.1], [0.05]],
        array![[0.4, 0.1], [0.05, 0.05]],
    )
    .expect("valid 12-entry parameter set")
}

/// Purpose
/// -------
/// The round-trip data set: a 5 × 5 rook torus with `sp = 2` and 1000 steps
/// simulated from μ = 0.5, φ = (0.3, 0.2), ω = 0.5, α = 0.1, β = 0.5.
fn simulated_rook_torus() -> (NeighborhoodStack, LatticeSeries) {
    let grid = GridShape::new(&[5, 5]).expect("valid grid");
    let stack = NeighborhoodStack::build(&grid, 2, Topology::Rook, true).expect("stack");
    let truth = ParameterSet::new(
        0.5,
        array![[0.3], [0.2]],
        Array2::zeros((0, 0)),
        0.5,
        array![[0.1]],
        array![[0.5]],
    )
    .expect("valid truth");
    let series = simulate_series(
        &truth,
        1000,
        &grid,
        Some(&stack),
        Topology::Rook,
        true,
        &SimOpts::seeded(2024),
    )
    .expect("sim");
    (stack, series)
}

/// Each estimate of a fit on [`simulated_rook_torus`] lies within a loose
/// band of its true value.
fn assert_within_recovery_bands(fit: &FitResult) {
    let bands = [
        (ParamKey::Mu, 0.5, 0.1),
        (ParamKey::Phi { spatial: 0, temporal: 1 }, 0.3, 0.05),
        (ParamKey::Phi { spatial: 1, temporal: 1 }, 0.2, 0.05),
        (ParamKey::Omega, 0.5, 0.3),
        (ParamKey::Alpha { spatial: 0, temporal: 1 }, 0.1, 0.05),
        (ParamKey::Beta { spatial: 0, temporal: 1 }, 0.5, 0.25),
    ];
    for (key, true_value, tol) in bands {
        let est = fit.coefficient(key).expect("key in layout");
        assert!((est - true_value).abs() < tol, "{key}: estimate {est}, truth {true_value}");
    }
}

#[test]
// Purpose
// -------
// Check neighborhood stacks at the two extremes: only `W_0`, and a
// multi-lag torus stack.
//
// Given
// -----
// - A 3 × 4 rook grid with `sp = 1`.
// - A 5 × 5 queen torus with `sp = 3`.
//
// Expect
// ------
// - The single-matrix stack is the identity.
// - Every row of every lag ≥ 1 sums to 1 on the torus.
fn neighborhood_stack_identity_and_row_sums() {
    // Arrange
    let small = GridShape::new(&[3, 4]).expect("valid grid");
    let torus = GridShape::new(&[5, 5]).expect("valid grid");

    // Act
    let identity = NeighborhoodStack::build(&small, 1, Topology::Rook, false).expect("stack");
    let stack = NeighborhoodStack::build(&torus, 3, Topology::Queen, true).expect("stack");

    // Assert
    assert_eq!(identity.len(), 1);
    assert_eq!(identity.matrix(0), Some(Array2::<f64>::eye(12)));
    assert_eq!(stack.len(), 3);
    for lag in 1..3 {
        let w = stack.matrix(lag).expect("lag within stack");
        for row in w.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12, "lag {lag}: {row}");
        }
    }
}

#[test]
// Purpose
// -------
// Verify seeded determinism and that burn-in never changes the output
// shape.
//
// Given
// -----
// - The 12-entry layout on a 4 × 4 rook torus, `n = 80`.
// - Seed 7 twice with burn-in 100, then burn-in 0 and 250.
//
// Expect
// ------
// - Bit-identical series for the same seed and burn-in.
// - Shape 16 × 80 for every burn-in.
fn simulation_is_reproducible_and_burn_in_independent() {
    // Arrange
    let grid = GridShape::new(&[4, 4]).expect("valid grid");
    let params = twelve_param_set(0.2, 0.2, 0.1);
    let sim = |burn_in: usize| {
        let opts = SimOpts::new(Some(7), burn_in, false, false);
        simulate_series(&params, 80, &grid, None, Topology::Rook, true, &opts).expect("sim")
    };

    // Act
    let a = sim(100);
    let b = sim(100);
    let short = sim(0);
    let long = sim(250);

    // Assert
    assert_eq!(a, b);
    for s in [&a, &short, &long] {
        assert_eq!((s.n_locations(), s.n_steps()), (16, 80));
        assert!(s.view().iter().all(|v| v.is_finite()));
    }
    assert_ne!(a, short);
}

#[test]
// Purpose
// -------
// Ensure masking removes pinned entries from the free vector and from the
// reported statistics.
//
// Given
// -----
// - A pure GARCH series on a 3 × 3 rook torus (mean blocks zero).
// - The 12-entry layout fully free, and with `mu`, `phi`, `theta` pinned
//   at zero.
//
// Expect
// ------
// - 12 free entries unmasked and 7 masked.
// - The masked fit reports 7 rows, none of them a mean-block key, and the
//   pinned values come back unchanged in the full coefficient set.
fn masking_reduces_free_parameters() {
    init_tracing();

    // Arrange
    let grid = GridShape::new(&[3, 3]).expect("valid grid");
    let stack = NeighborhoodStack::build(&grid, 2, Topology::Rook, true).expect("stack");
    let truth = twelve_param_set(0.0, 0.0, 0.0);
    let series = simulate_series(
        &truth,
        300,
        &grid,
        Some(&stack),
        Topology::Rook,
        true,
        &SimOpts::seeded(31),
    )
    .expect("sim");
    let init = Array1::from_elem(9, 0.5);
    let start = twelve_param_set(0.0, 0.0, 0.0);
    let mask = ParameterMask::all_free()
        .fix_block(ParamBlock::Mu, &start)
        .fix_block(ParamBlock::Phi, &start)
        .fix_block(ParamBlock::Theta, &start);

    // Act
    let unmasked = StarmaGarch::new(
        &series,
        &stack,
        init.clone(),
        &start,
        &ParameterMask::all_free(),
        fit_options(),
    )
    .expect("unmasked bundle");
    let masked =
        StarmaGarch::new(&series, &stack, init, &start, &mask, fit_options()).expect("bundle");
    let fit = masked.fit(&series, false).expect("masked fit");

    // Assert
    assert_eq!(unmasked.n_free(), 12);
    assert_eq!(masked.n_free(), 7);
    let table = fit.coef_table();
    assert_eq!(table.len(), 7);
    assert!(table.iter().all(|row| !matches!(
        row.key.block(),
        ParamBlock::Mu | ParamBlock::Phi | ParamBlock::Theta
    )));
    assert_eq!(fit.coefficients().mu, 0.0);
    assert_eq!(fit.coefficients().phi, Array2::<f64>::zeros((2, 1)));
    assert!(fit.log_likelihood().is_finite());
    assert_eq!(fit.n_obs(), 9 * (300 - 2));
}

#[test]
// Purpose
// -------
// Round-trip recovery: simulate from known parameters and fit the same
// model order.
//
// Given
// -----
// - A 5 × 5 rook torus, `n = 1000` (25 000 likelihood terms).
// - Truth: μ = 0.5, φ = (0.3, 0.2), ω = 0.5, α = 0.1, β = 0.5.
// - Start: μ = 0, φ = (0, 0), ω = 1, α = 0.05, β = 0.3.
//
// Expect
// ------
// - Each estimate within a loose band of its true value.
// - Finite, positive standard errors; the GARCH path and residuals have
//   the series' shape.
fn fit_recovers_simulated_parameters() {
    init_tracing();

    // Arrange
    let (stack, series) = simulated_rook_torus();
    let start = ParameterSet::new(
        0.0,
        array![[0.0], [0.0]],
        Array2::zeros((0, 0)),
        1.0,
        array![[0.05]],
        array![[0.3]],
    )
    .expect("valid start");
    let model = StarmaGarch::new(
        &series,
        &stack,
        Array1::from_elem(25, 1.0),
        &start,
        &ParameterMask::all_free(),
        fit_options(),
    )
    .expect("bundle");

    // Act
    let fit = model.fit(&series, false).expect("fit");

    // Assert
    assert_within_recovery_bands(&fit);
    assert!(fit.std_errors().iter().all(|&se| se.is_finite() && se > 0.0));
    assert!(fit.p_values().iter().all(|&p| (0.0..=1.0).contains(&p)));
    assert_eq!(fit.conditional_variance().dim(), (25, 1000));
    assert_eq!(fit.residuals().dim(), (25, 1000));
    assert_eq!(fit.standardized_residuals().dim(), (25, 999));
    assert!(fit.aic() < fit.bic());
}

#[test]
// Purpose
// -------
// Ensure variance coefficients started at zero still move: a zero start
// must not pin `alpha` / `beta` on the flat tail of the positivity map.
//
// Given
// -----
// - The round-trip data set of `fit_recovers_simulated_parameters`.
// - Start: μ = 0, φ = (0, 0), ω = 1, α = β = 0.
//
// Expect
// ------
// - The fit converges and every estimate lies within the recovery bands;
//   in particular α̂ and β̂ are far from zero.
fn fit_from_zero_variance_coefficients_recovers_parameters() {
    init_tracing();

    // Arrange
    let (stack, series) = simulated_rook_torus();
    let start = ParameterSet::new(
        0.0,
        array![[0.0], [0.0]],
        Array2::zeros((0, 0)),
        1.0,
        array![[0.0]],
        array![[0.0]],
    )
    .expect("valid start");
    let model = StarmaGarch::new(
        &series,
        &stack,
        Array1::from_elem(25, 1.0),
        &start,
        &ParameterMask::all_free(),
        fit_options(),
    )
    .expect("bundle");

    // Act
    let fit = model.fit(&series, false).expect("fit");

    // Assert
    assert!(fit.converged(), "status: {}", fit.status());
    assert_within_recovery_bands(&fit);
    let alpha = fit.coefficient(ParamKey::Alpha { spatial: 0, temporal: 1 }).expect("key");
    let beta = fit.coefficient(ParamKey::Beta { spatial: 0, temporal: 1 }).expect("key");
    assert!(alpha > 0.01 && beta > 0.1, "alpha {alpha}, beta {beta}");
}

#[test]
// Purpose
// -------
// Ensure a direction with no curvature yields NaN statistics instead of
// aborting the fit.
//
// Given
// -----
// - A bounded line of 3 cells with `sp = 4`; nothing lies at distance 3,
//   so `W_3` is the zero matrix and `phi[3,1]` cannot affect the
//   likelihood.
// - White noise, `omega` pinned at 1.
//
// Expect
// ------
// - `fit` succeeds; `phi[3,1]` has NaN SE, z and p while `mu` has a
//   finite SE.
fn unidentified_parameter_gets_nan_standard_error() {
    init_tracing();

    // Arrange
    let grid = GridShape::new(&[3]).expect("valid grid");
    let stack = NeighborhoodStack::build(&grid, 4, Topology::Rook, false).expect("stack");
    let noise = ParameterSet::new(
        0.0,
        Array2::zeros((0, 0)),
        Array2::zeros((0, 0)),
        1.0,
        Array2::zeros((0, 0)),
        Array2::zeros((0, 0)),
    )
    .expect("valid params");
    let opts = SimOpts::seeded(3);
    let series =
        simulate_series(&noise, 200, &grid, None, Topology::Rook, false, &opts).expect("sim");
    let start = ParameterSet::new(
        0.0,
        array![[0.1], [0.1], [0.1], [0.1]],
        Array2::zeros((0, 0)),
        1.0,
        Array2::zeros((0, 0)),
        Array2::zeros((0, 0)),
    )
    .expect("valid start");
    let mask = ParameterMask::all_free().with_fixed(ParamKey::Omega, 1.0);
    let model = StarmaGarch::new(&series, &stack, Array1::ones(3), &start, &mask, fit_options())
        .expect("bundle");

    // Act
    let fit = model.fit(&series, false).expect("fit with singular information");

    // Assert
    let table = fit.coef_table();
    let unidentified = table
        .iter()
        .find(|row| row.key == ParamKey::Phi { spatial: 3, temporal: 1 })
        .expect("free key");
    assert!(unidentified.std_error.is_nan());
    assert!(unidentified.z_value.is_nan());
    assert!(unidentified.p_value.is_nan());
    let mu = table.iter().find(|row| row.key == ParamKey::Mu).expect("free key");
    assert!(mu.std_error.is_finite() && mu.std_error > 0.0);
}

#[test]
// Purpose
// -------
// Ensure shape inconsistencies are rejected before any evaluation.
//
// Given
// -----
// - A 3 × 3 series and stacks / vectors that disagree with it.
//
// Expect
// ------
// - `DimensionMismatch` for a short initial variance, a stack with too few
//   lags, a stack for another grid, and fitting on a mis-shaped series.
fn dimension_mismatches_are_reported() {
    // Arrange
    let grid = GridShape::new(&[3, 3]).expect("valid grid");
    let other = GridShape::new(&[2, 3]).expect("valid grid");
    let params = twelve_param_set(0.1, 0.2, 0.1);
    let stack = NeighborhoodStack::build(&grid, 2, Topology::Queen, true).expect("stack");
    let short = NeighborhoodStack::build(&grid, 1, Topology::Queen, true).expect("stack");
    let foreign = NeighborhoodStack::build(&other, 2, Topology::Queen, true).expect("stack");
    let opts = SimOpts::seeded(1);
    let series = simulate_series(&params, 50, &grid, Some(&stack), Topology::Queen, true, &opts)
        .expect("sim");
    let mis_shaped = LatticeSeries::new(Array2::zeros((9, 49))).expect("series");
    let init = || Array1::from_elem(9, 1.0);
    let free = ParameterMask::all_free();

    // Act / Assert
    let cases = [
        StarmaGarch::new(&series, &stack, Array1::ones(8), &params, &free, fit_options()),
        StarmaGarch::new(&series, &short, init(), &params, &free, fit_options()),
        StarmaGarch::new(&series, &foreign, init(), &params, &free, fit_options()),
    ];
    for case in cases {
        assert!(matches!(case, Err(StarmaError::DimensionMismatch { .. })));
    }
    let model =
        StarmaGarch::new(&series, &stack, init(), &params, &free, fit_options()).expect("bundle");
    assert!(matches!(
        model.fit(&mis_shaped, false),
        Err(StarmaError::DimensionMismatch { what: "series time steps", .. })
    ));
}
