//! Finite-difference derivatives on top of `finitediff`.
//!
//! Two consumers:
//! - the argmin adapter, when a model has no analytic gradient
//!   ([`run_fd_diff`]);
//! - the inference layer, which differentiates the analytic GLM gradient
//!   once more to get the observed information ([`compute_hessian`]).
//!
//! `finitediff` closures must return plain `f64`, so objective errors are
//! parked in a `RefCell<Option<Error>>` while the closure returns `NaN`,
//! then surfaced once differencing finishes.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`.
///
/// Clears `closure_err` first; any error the closure records during
/// differencing wins over the (meaningless) numeric result.
///
/// # Errors
/// - The first error captured by the closure.
/// - [`validate_grad`] failures on the resulting vector.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&grad, theta.len())?;
    Ok(grad)
}

/// Hessian from a gradient function: central differences, retried with
/// forward differences if the central result is not a finite square
/// matrix. The returned matrix is symmetrized.
///
/// # Errors
/// [`validate_hessian`] failures of the forward-difference fallback.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut hess = theta.central_hessian(f);
    if validate_hessian(&hess, dim).is_err() {
        hess = theta.forward_hessian(f);
        validate_hessian(&hess, dim)?;
    }
    symmetrize_hess(&mut hess);
    Ok(hess)
}

fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use approx::assert_abs_diff_eq;
    use argmin::core::ArgminError;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Forward differences of a Poisson-style objective `Σ exp(θ) - θ`
    // approximate the analytic gradient `exp(θ) - 1`.
    fn run_fd_diff_matches_analytic_gradient() {
        let theta = array![0.0, 0.5];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |x: &Theta| x.mapv(|v| v.exp() - v).sum();

        let grad = run_fd_diff(&theta, &f, &closure_err).expect("finite gradient");

        assert_abs_diff_eq!(grad[0], 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(grad[1], 0.5_f64.exp() - 1.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // An error recorded by the objective closure is returned instead of the
    // NaN-filled gradient.
    //
    // Given
    // -----
    // - A closure that stores a parameter-count mismatch and returns NaN.
    //
    // Expect
    // ------
    // - `run_fd_diff` returns that same `OptError` variant.
    fn run_fd_diff_surfaces_captured_error() {
        let theta = array![1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| {
            closure_err
                .replace(Some(OptError::ParamCountMismatch { expected: 2, actual: 1 }.into()));
            f64::NAN
        };

        let err = run_fd_diff(&theta, &f, &closure_err).expect_err("captured error wins");

        assert_eq!(err, OptError::ParamCountMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn run_fd_diff_maps_argmin_errors() {
        let theta = array![1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| {
            closure_err.replace(Some(ArgminError::NotImplemented { text: "fd".into() }.into()));
            f64::NAN
        };

        let err = run_fd_diff(&theta, &f, &closure_err).unwrap_err();

        assert!(matches!(err, OptError::NotImplemented { .. }));
    }

    #[test]
    fn run_fd_diff_rejects_nan_objective() {
        let theta = array![0.0, 1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| f64::NAN;

        assert!(matches!(
            run_fd_diff(&theta, &f, &closure_err),
            Err(OptError::InvalidGradient { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Differentiating the gradient of `Σ exp(θ)` yields `diag(exp(θ))`, the
    // Poisson information for independent bins.
    fn compute_hessian_recovers_diagonal_information() {
        let theta = array![0.0, 1.0];
        let grad_fn = |x: &Theta| x.mapv(f64::exp);

        let hess = compute_hessian(&grad_fn, &theta).expect("finite Hessian");

        assert_eq!(hess.shape(), &[2, 2]);
        assert_abs_diff_eq!(hess[[0, 0]], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(hess[[1, 1]], 1.0_f64.exp(), epsilon = 1e-4);
        assert_abs_diff_eq!(hess[[0, 1]], 0.0, epsilon = 1e-6);
        assert_eq!(hess[[0, 1]], hess[[1, 0]]);
    }

    #[test]
    fn compute_hessian_reports_non_finite_entries() {
        let theta = array![0.0];
        let grad_fn = |_: &Theta| array![f64::NAN];

        assert!(matches!(
            compute_hessian(&grad_fn, &theta),
            Err(OptError::InvalidHessian { .. })
        ));
    }

    #[test]
    fn symmetrize_hess_averages_off_diagonal() {
        let mut h = array![[1.0, 2.0], [0.0, 3.0]];

        symmetrize_hess(&mut h);

        assert_eq!(h, array![[1.0, 1.0], [1.0, 3.0]]);
    }
}
