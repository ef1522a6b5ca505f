//! Entry point: maximize a [`LogLikelihood`] with L-BFGS.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize `ℓ(θ)` starting from `theta0`.
///
/// `f.check` runs once up front; after that the model is wrapped so argmin
/// sees `-ℓ(θ)`, and the line search named in `opts` picks the solver.
///
/// # Errors
/// - Whatever `f.check` rejects.
/// - Solver construction failures.
/// - Runtime failures from [`run_lbfgs`], including model errors raised
///   while evaluating the cost.
///
/// Reaching `max_iter` is not an error: inspect [`OptimOutcome::converged`].
///
/// # Example
/// ```
/// use lick_glm::optimization::{errors::OptResult, loglik_optimizer::*};
/// use ndarray::array;
///
/// struct Quadratic;
/// impl LogLikelihood for Quadratic {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
///     fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
///         Ok(theta.mapv(|t| -2.0 * t))
///     }
/// }
///
/// let out = maximize(&Quadratic, array![0.3, -0.2], &(), &MLEOptions::default()).unwrap();
/// assert!(out.theta_hat.iter().all(|t| t.abs() < 1e-5));
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            run_lbfgs(theta0, opts, problem, build_optimizer_more_thuente(opts)?)
        }
        LineSearcher::HagerZhang => {
            run_lbfgs(theta0, opts, problem, build_optimizer_hager_zhang(opts)?)
        }
    }
}
