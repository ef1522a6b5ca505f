//! L-BFGS construction.
//!
//! The builders only attach the line search, the history length and the
//! optional gradient/cost tolerances. Initial parameters and the iteration
//! cap are executor settings and are applied in [`run`](super::run).
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

/// L-BFGS with a Hager–Zhang line search.
///
/// # Errors
/// Any tolerance argmin refuses, converted to [`OptError`](crate::optimization::errors::OptError).
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    configure_lbfgs(LBFGS::new(HagerZhangLS::new(), history_len(opts)), opts)
}

/// L-BFGS with a More–Thuente line search; the default for GLM fits.
///
/// # Errors
/// Any tolerance argmin refuses.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    configure_lbfgs(LBFGS::new(MoreThuenteLS::new(), history_len(opts)), opts)
}

/// Apply whichever of `tol_grad` / `tol_cost` is set. Unset tolerances keep
/// argmin's defaults.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(tol) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol)?;
    }
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol)?;
    }
    Ok(solver)
}

fn history_len(opts: &MLEOptions) -> usize {
    opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::traits::{LineSearcher, Tolerances};

    #[test]
    // Purpose
    // -------
    // Both builders accept the stock GLM options (memory left to the default).
    fn builders_accept_default_glm_options() {
        let opts = MLEOptions::default();

        assert!(build_optimizer_more_thuente(&opts).is_ok());
        assert!(build_optimizer_hager_zhang(&opts).is_ok());
        assert_eq!(history_len(&opts), DEFAULT_LBFGS_MEM);
    }

    #[test]
    fn explicit_memory_overrides_default() {
        let tols = Tolerances::new(Some(1e-5), None, Some(40)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::HagerZhang, Some(12)).unwrap();

        assert_eq!(history_len(&opts), 12);
        assert!(build_optimizer_hager_zhang(&opts).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // With only an iteration cap configured, `configure_lbfgs` leaves the
    // solver untouched and succeeds.
    fn configure_lbfgs_without_tolerances_is_noop() {
        let tols = Tolerances::new(None, None, Some(20)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, None).unwrap();
        let raw = LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);

        assert!(configure_lbfgs(raw, &opts).is_ok());
    }

    #[test]
    fn configure_lbfgs_applies_both_tolerances() {
        let tols = Tolerances::new(Some(1e-7), Some(1e-10), Some(20)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, Some(5)).unwrap();
        let raw = LBFGS::new(HagerZhangLS::new(), 5);

        assert!(configure_lbfgs(raw, &opts).is_ok());
    }
}
