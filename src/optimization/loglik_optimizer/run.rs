//! Execution helper that runs an `argmin` solver on a log-likelihood problem and
//! returns a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin_math::ArgminL2Norm;
use tracing::{debug, info};

/// Run an `argmin` optimization for a log-likelihood problem.
///
/// Shared runner for both line-search variants. It sets `theta0` on the
/// executor state, applies `max_iters` when configured, optionally attaches
/// the slog observer (`obs_slog` feature + `opts.verbose`), executes the solver
/// and converts the final state into an [`OptimOutcome`].
///
/// When `opts.verbose` is set, ℓ(θ₀) and ‖∇c(θ₀)‖ are emitted at `info` level
/// before the first iteration.
///
/// # Errors
/// - Any `argmin` runtime error (solver, line search, observer) converted via
///   `From<argmin::core::Error>`.
/// - Validation errors raised while building the [`OptimOutcome`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    debug!(iterations, status = ?termination, "l-bfgs finished");
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

// ---- Helper Methods ----

fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    match problem.gradient(theta0) {
        Ok(g) => info!(loglik = ll0, grad_norm = g.l2_norm(), n_free = theta0.len(), "l-bfgs start"),
        Err(_) => info!(loglik = ll0, n_free = theta0.len(), "l-bfgs start"),
    }
    Ok(())
}
