//! Nested-model comparison: ΔBIC and the likelihood-ratio test.
//!
//! Purpose
//! -------
//! Decide whether adding channels to a model is worth their parameters.
//! Both fits must come from the same session on the same grid, and the
//! restricted layout must be a sub-layout of the full one; only the
//! parameter counts and rate lengths are checked here.
//!
//! Conventions
//! -----------
//! - `delta_bic = bic_full - bic_restricted`: negative favours the full
//!   model.
//! - `lr_statistic = 2 (NLL_r - NLL_f)`, referred to `χ²(k_f - k_r)`.
//!   With an L2 penalty the statistic is on penalized NLLs and the χ²
//!   reference is only approximate.
use crate::glm::{
    errors::{GLMError, GLMResult},
    models::evaluate::FitResult,
};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Summary of a nested comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelComparison {
    pub delta_bic: f64,
    pub lr_statistic: f64,
    pub df: usize,
    pub p_value: f64,
}

impl ModelComparison {
    /// BIC prefers the full model.
    pub fn prefers_full(&self) -> bool {
        self.delta_bic < 0.0
    }

    /// Likelihood-ratio test rejects the restricted model at level `alpha`.
    pub fn rejects_restricted(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Compare `restricted` against the larger `full` fit.
///
/// A negative likelihood-ratio statistic (the full fit ended worse, e.g. an
/// unconverged run) is reported as is and tested as 0.
///
/// # Errors
/// - [`GLMError::NotNested`] unless `full` has strictly more parameters.
/// - [`GLMError::LengthMismatch`] if the two rates differ in length.
/// - [`GLMError::InvalidDegreesOfFreedom`] from statrs.
pub fn compare_nested(restricted: &FitResult, full: &FitResult) -> GLMResult<ModelComparison> {
    let (k_r, k_f) = (restricted.n_params(), full.n_params());
    if k_r >= k_f {
        return Err(GLMError::NotNested { restricted: k_r, full: k_f });
    }
    if restricted.latent.len() != full.latent.len() {
        return Err(GLMError::LengthMismatch {
            name: "latent",
            expected: full.latent.len(),
            actual: restricted.latent.len(),
        });
    }
    let df = k_f - k_r;
    let chi2 = ChiSquared::new(df as f64).map_err(|e| GLMError::InvalidDegreesOfFreedom {
        df: df as f64,
        text: e.to_string(),
    })?;
    let lr_statistic = 2.0 * (restricted.nll - full.nll);
    Ok(ModelComparison {
        delta_bic: full.bic - restricted.bic,
        lr_statistic,
        df,
        p_value: chi2.sf(lr_statistic.max(0.0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        glm::models::evaluate::compute_bic, optimization::loglik_optimizer::FnEvalMap,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    fn fit(nll: f64, k: usize, n: usize) -> FitResult {
        FitResult {
            x: Array1::zeros(k),
            nll,
            latent: Array1::ones(n),
            bic: compute_bic(nll, k, n),
            converged: true,
            status: "SolverConverged".to_string(),
            iterations: 10,
            fn_evals: FnEvalMap::new(),
            grad_norm: None,
        }
    }

    #[test]
    // Purpose
    // -------
    // A large NLL drop for two extra parameters is significant and favoured
    // by BIC.
    //
    // Given
    // -----
    // - restricted: nll 500, 1 param; full: nll 480, 3 params; 10000 bins.
    //
    // Expect
    // ------
    // - LR = 40 on 2 df, p = exp(-20); ΔBIC = 2 ln(10000) - 40 < 0.
    fn significant_improvement_is_detected() {
        let cmp = compare_nested(&fit(500.0, 1, 10_000), &fit(480.0, 3, 10_000)).unwrap();

        assert_eq!(cmp.df, 2);
        assert_abs_diff_eq!(cmp.lr_statistic, 40.0, epsilon = 1e-12);
        // χ²(2) survival is exp(-x/2).
        assert_abs_diff_eq!(cmp.p_value, (-20.0f64).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(cmp.delta_bic, 2.0 * 10_000f64.ln() - 40.0, epsilon = 1e-9);
        assert!(cmp.prefers_full());
        assert!(cmp.rejects_restricted(0.05));
    }

    #[test]
    fn worse_full_fit_gets_p_value_one() {
        let cmp = compare_nested(&fit(100.0, 2, 500), &fit(101.0, 4, 500)).unwrap();

        assert_eq!(cmp.lr_statistic, -2.0);
        assert_abs_diff_eq!(cmp.p_value, 1.0, epsilon = 1e-12);
        assert!(!cmp.prefers_full());
    }

    #[test]
    fn non_nested_inputs_are_rejected() {
        assert_eq!(
            compare_nested(&fit(1.0, 3, 10), &fit(1.0, 3, 10)),
            Err(GLMError::NotNested { restricted: 3, full: 3 })
        );
        assert!(matches!(
            compare_nested(&fit(1.0, 1, 10), &fit(1.0, 3, 11)),
            Err(GLMError::LengthMismatch { name: "latent", .. })
        ));
    }
}
