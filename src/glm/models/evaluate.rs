//! Post-fit evaluation: the authoritative forward pass and BIC.
//!
//! The optimizer's own bookkeeping is never trusted for reported numbers.
//! [`evaluate`] re-runs the model once at `θ̂`, so `nll` and `latent` in a
//! [`FitResult`] always describe exactly the stored `x`.
use crate::{
    glm::{
        core::data::SessionData,
        errors::{GLMError, GLMResult},
        models::lick_model::LickModel,
    },
    inference::hessian::calc_standard_errors,
    optimization::loglik_optimizer::{FnEvalMap, OptimOutcome},
};
use ndarray::Array1;
use std::cell::RefCell;

/// `ln(n_bins) · n_params + 2 · NLL`.
///
/// The sample size is the number of time bins, not the number of licks.
pub fn compute_bic(nll: f64, num_params: usize, num_data_points: usize) -> f64 {
    (num_data_points as f64).ln() * num_params as f64 + 2.0 * nll
}

/// FitResult — immutable summary of one fit.
///
/// Fields are read through getters; a result is never changed after
/// [`evaluate`] builds it.
///
/// Fields
/// ------
/// - `x`: fitted parameters, laid out by the model's channel layout.
/// - `nll`: penalized negative log-likelihood at `x`.
/// - `latent`: per-bin rate at `x`, length `stop_time`.
/// - `bic`: [`compute_bic`] of `nll`, `x.len()` and `latent.len()`.
/// - `converged`, `status`, `iterations`, `fn_evals`, `grad_norm`: copied
///   from the optimizer outcome. A non-converged fit is still a result.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub(crate) x: Array1<f64>,
    pub(crate) nll: f64,
    pub(crate) latent: Array1<f64>,
    pub(crate) bic: f64,
    pub(crate) converged: bool,
    pub(crate) status: String,
    pub(crate) iterations: usize,
    pub(crate) fn_evals: FnEvalMap,
    pub(crate) grad_norm: Option<f64>,
}

impl FitResult {
    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn nll(&self) -> f64 {
        self.nll
    }

    pub fn latent(&self) -> &Array1<f64> {
        &self.latent
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn fn_evals(&self) -> &FnEvalMap {
        &self.fn_evals
    }

    /// Gradient norm at the last iterate, when argmin reported one.
    pub fn grad_norm(&self) -> Option<f64> {
        self.grad_norm
    }

    /// Number of fitted parameters.
    pub fn n_params(&self) -> usize {
        self.x.len()
    }

    /// Classical standard errors of `x` from the observed information of
    /// `model` on `data`.
    ///
    /// A parameter the session cannot identify (for example a reward filter
    /// in a session without rewards) gets an infinite standard error.
    ///
    /// # Errors
    /// - [`LickModel::validate`] failures of `x` on `data`, such as
    ///   [`GLMError::ParamCountMismatch`] or [`GLMError::MissingCovariate`].
    /// - The first model error raised while differencing the gradient.
    /// - Hessian failures, reported as [`GLMError::OptimizationFailed`].
    pub fn standard_errors(&self, model: &LickModel, data: &SessionData) -> GLMResult<Array1<f64>> {
        model.validate(self.x.view(), data)?;
        let closure_err: RefCell<Option<GLMError>> = RefCell::new(None);
        let grad = |theta: &Array1<f64>| match model.nll_gradient(theta.view(), data) {
            Ok(g) => g,
            Err(e) => {
                closure_err.borrow_mut().get_or_insert(e);
                Array1::from_elem(theta.len(), f64::NAN)
            }
        };
        let se = calc_standard_errors(&grad, &self.x);
        if let Some(err) = closure_err.take() {
            return Err(err);
        }
        Ok(se?)
    }
}

/// Build the [`FitResult`] for `outcome`.
///
/// # Errors
/// Forward-pass errors at `outcome.theta_hat`.
pub fn evaluate(model: &LickModel, outcome: &OptimOutcome, data: &SessionData) -> GLMResult<FitResult> {
    let x = outcome.theta_hat.clone();
    let (nll, latent) = model.forward(x.view(), data)?;
    let bic = compute_bic(nll, x.len(), latent.len());
    log::debug!("evaluated fit: nll = {nll:.4}, bic = {bic:.4}, {} params", x.len());
    Ok(FitResult {
        x,
        nll,
        latent,
        bic,
        converged: outcome.converged,
        status: outcome.status.clone(),
        iterations: outcome.iterations,
        fn_evals: outcome.fn_evals.clone(),
        grad_norm: outcome.grad_norm,
    })
}
