//! loglik_optimizer::builders: L-BFGS solver construction helpers.
//!
//! The builders pick the line search, apply the history size and the optional
//! gradient / cost-change tolerances from [`MLEOptions`]. Initial parameters
//! and `max_iters` are runtime concerns applied by `run_lbfgs`, so the
//! builders stay side-effect free.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// Construct L-BFGS with a Hager–Zhang line search.
///
/// Uses `opts.lbfgs_mem` (or [`DEFAULT_LBFGS_MEM`]) and forwards the optional
/// tolerances through [`configure_lbfgs`].
///
/// # Errors
/// - `OptError` converted from argmin when a tolerance is rejected.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(hager_zhang, mem), opts)
}

/// Construct L-BFGS with a More–Thuente line search.
///
/// # Errors
/// - `OptError` converted from argmin when a tolerance is rejected.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(more_thuente, mem), opts)
}

/// Apply `tol_grad` / `tol_cost` to an L-BFGS solver of any line-search type.
///
/// A `None` tolerance leaves argmin's default in place.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction of both L-BFGS variants with default and explicit memory.
    // - Application of tolerances via `configure_lbfgs`.
    //
    // They intentionally DO NOT cover:
    // - Executor behavior (`run_lbfgs`), exercised by the model fits.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure both builders succeed with the default history size.
    //
    // Given
    // -----
    // - Valid tolerances and `lbfgs_mem = None`.
    //
    // Expect
    // ------
    // - Both builders return `Ok(_)`.
    fn builders_accept_default_memory() {
        // Arrange
        let tols =
            Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).expect("Tolerances should be valid");
        let hz = MLEOptions::new(tols, LineSearcher::HagerZhang, false, None)
            .expect("MLEOptions should be valid");
        let mt = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None)
            .expect("MLEOptions should be valid");

        // Act / Assert
        assert!(build_optimizer_hager_zhang(&hz).is_ok());
        assert!(build_optimizer_more_thuente(&mt).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Verify explicit memory values are accepted.
    //
    // Given
    // -----
    // - `lbfgs_mem = Some(11)`.
    //
    // Expect
    // ------
    // - Both builders return `Ok(_)`.
    fn builders_respect_explicit_memory() {
        // Arrange
        let tols = Tolerances::new(Some(1e-6), None, Some(25)).expect("Tolerances should be valid");
        let opts = MLEOptions::new(tols, LineSearcher::HagerZhang, false, Some(11))
            .expect("MLEOptions should be valid");

        // Act / Assert
        assert!(build_optimizer_hager_zhang(&opts).is_ok());
        assert!(build_optimizer_more_thuente(&opts).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Confirm `configure_lbfgs` works with and without tolerances.
    //
    // Given
    // -----
    // - One option set with both tolerances, one with neither.
    //
    // Expect
    // ------
    // - Both configurations succeed.
    fn configure_lbfgs_handles_present_and_absent_tolerances() {
        // Arrange
        let full = Tolerances::new(Some(1e-6), Some(1e-8), Some(100)).expect("valid");
        let bare = Tolerances::new(None, None, Some(50)).expect("valid");
        let full_opts = MLEOptions::new(full, LineSearcher::HagerZhang, false, None).expect("valid");
        let bare_opts = MLEOptions::new(bare, LineSearcher::MoreThuente, false, None).expect("valid");

        // Act
        let a = configure_lbfgs(LBFGS::new(HagerZhangLS::new(), DEFAULT_LBFGS_MEM), &full_opts);
        let b = configure_lbfgs(LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM), &bare_opts);

        // Assert
        assert!(a.is_ok());
        assert!(b.is_ok());
    }
}
