//! Executor wiring shared by both line-search variants.
use std::time::Instant;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin_math::ArgminL2Norm;

/// Run `solver` from `theta0` and normalize the final state.
///
/// The iteration cap from `opts.tols.max_iter` is applied here. With
/// `opts.verbose` the starting log-likelihood is logged at `info` and, under
/// the `obs_slog` feature, argmin's terminal observer is attached for every
/// iteration.
///
/// # Errors
/// - argmin runtime failures (line search breakdown, model errors raised
///   inside a cost evaluation) via `From<argmin::core::Error>`.
/// - [`OptimOutcome::new`] validation failures.
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
    let mut executor = Executor::new(problem, solver).configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        executor = executor.configure(|state| state.max_iters(max_iter as u64));
    }

    let started = Instant::now();
    let mut state = executor.run()?.state().clone();
    log::debug!(
        "L-BFGS finished after {} iterations in {:.3}s",
        state.get_iter(),
        started.elapsed().as_secs_f64()
    );

    let iterations = state.get_iter();
    let fn_evals = state.get_func_counts().clone();
    let termination = state.get_termination_status().clone();
    let grad = state.take_gradient();
    OptimOutcome::new(
        state.take_best_param(),
        -state.get_best_cost(),
        termination,
        iterations,
        fn_evals,
        grad,
    )
}

fn log_initial_state<F: LogLikelihood>(
    theta0: &Theta, problem: &ArgMinAdapter<'_, F>,
) -> OptResult<()> {
    let ll0 = -problem.cost(theta0)?;
    match problem.gradient(theta0) {
        Ok(g) => log::info!("initial log-likelihood {ll0:.6}, |grad| {:.6}", g.l2_norm()),
        Err(_) => log::info!("initial log-likelihood {ll0:.6}"),
    }
    Ok(())
}
