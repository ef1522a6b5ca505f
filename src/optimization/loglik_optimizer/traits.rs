//! Public optimizer surface: the trait models implement, the options they
//! are fitted with, and the outcome they get back.
//!
//! - [`LogLikelihood`]: implemented by a model (the licking GLM implements
//!   it with `ℓ(θ) = -NLL(θ)`).
//! - [`MLEOptions`], [`Tolerances`], [`LineSearcher`]: solver configuration.
//! - [`OptimOutcome`]: normalized solver result.
//!
//! Convention: `ℓ(θ)` is maximized by minimizing `c(θ) = -ℓ(θ)`. Analytic
//! gradients returned by [`LogLikelihood::grad`] are `∇ℓ(θ)`; the adapter
//! flips the sign.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        types::{Cost, FnEvalMap, Grad, Theta},
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Log-likelihood interface consumed by [`maximize`](super::maximize).
///
/// `Data` is the full payload the objective needs. It is passed explicitly
/// on every call so an implementation never has to capture outer state.
///
/// Required:
/// - `value(θ, data)`: evaluate `ℓ(θ)`; invalid inputs are `Err`, not panics.
/// - `check(θ, data)`: cheap validation run once before the solver starts.
///
/// Optional:
/// - `grad(θ, data)`: analytic `∇ℓ(θ)`. The default returns
///   [`OptError::GradientNotImplemented`], which switches the adapter to
///   finite differences.
pub trait LogLikelihood {
    type Data: 'static;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Line search used inside L-BFGS.
///
/// Parses case-insensitively from `"MoreThuente"` / `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Solver configuration.
///
/// Defaults: `tol_grad = 1e-6`, no cost tolerance, `max_iter = 300`,
/// More–Thuente line search, not verbose, L-BFGS memory
/// [`DEFAULT_LBFGS_MEM`](super::DEFAULT_LBFGS_MEM).
///
/// `verbose` attaches argmin's slog observer when the crate is built with
/// the `obs_slog` feature; without it the flag only raises log levels.
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Build options from validated tolerances.
    ///
    /// # Errors
    /// [`OptError::InvalidLBFGSMem`] when `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(0) = lbfgs_mem {
            return Err(OptError::InvalidLBFGSMem {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, verbose: false, lbfgs_mem })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Stopping rules.
///
/// Any field may be `None`, but at least one must be set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == Some(0)`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(0) = max_iter {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Result returned by [`maximize`](super::maximize).
///
/// - `theta_hat`: best parameters found.
/// - `value`: `ℓ(θ̂)`, not the cost.
/// - `converged`: `true` only when argmin stopped on a convergence
///   criterion (gradient or cost tolerance, target cost). Hitting
///   `max_iter` or any other stop leaves it `false`.
/// - `status`: argmin's termination status, formatted.
/// - `fn_evals`: argmin's counters.
/// - `grad_norm`: norm of the last gradient, when the solver kept one.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build an outcome from raw solver state.
    ///
    /// # Errors
    /// Propagates validation failures for `theta_hat` and `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, format!("{reason:?}"))
            }
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn line_searcher_parses_case_insensitively() {
        assert_eq!("morethuente".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert_eq!("HAGERZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert!(matches!(
            "bfgs".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // `Tolerances::new` insists on at least one stopping rule and a positive
    // iteration cap.
    fn tolerances_reject_empty_and_zero_iterations() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(Some(1e-6), None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
        assert!(Tolerances::new(None, Some(1e-9), None).is_ok());
    }

    #[test]
    fn mle_options_reject_zero_memory() {
        let tols = Tolerances::new(Some(1e-6), None, Some(10)).unwrap();
        assert!(matches!(
            MLEOptions::new(tols, LineSearcher::MoreThuente, Some(0)),
            Err(OptError::InvalidLBFGSMem { .. })
        ));
        let opts = MLEOptions::new(tols, LineSearcher::HagerZhang, Some(5)).unwrap();
        assert!(!opts.verbose);
        assert!(opts.with_verbose(true).verbose);
    }

    #[test]
    // Purpose
    // -------
    // Only convergence-type termination reasons count as converged; running
    // out of iterations is reported but not flagged as converged.
    //
    // Given
    // -----
    // - Identical solver state with three different termination statuses.
    //
    // Expect
    // ------
    // - `SolverConverged` → converged.
    // - `MaxItersReached` and `NotTerminated` → not converged.
    fn outcome_converged_flag_follows_termination_reason() {
        let build = |status| {
            OptimOutcome::new(Some(array![0.1]), -3.0, status, 4, FnEvalMap::new(), None)
                .expect("valid outcome")
        };

        let ok = build(TerminationStatus::Terminated(TerminationReason::SolverConverged));
        let capped = build(TerminationStatus::Terminated(TerminationReason::MaxItersReached));
        let running = build(TerminationStatus::NotTerminated);

        assert!(ok.converged);
        assert!(!capped.converged);
        assert!(capped.status.contains("MaxIters"));
        assert!(!running.converged);
        assert_eq!(ok.iterations, 4);
    }
}
