//! inference::hessian — observed information and classical standard errors.
//!
//! Purpose
//! -------
//! Turn a gradient map of the negative log-likelihood into classical
//! standard errors at the fitted parameters. The observed information is a
//! finite-difference Jacobian of that gradient; standard errors come from
//! its pseudo-inverse.
//!
//! Key behaviors
//! -------------
//! - [`observed_information`] differentiates the NLL gradient with
//!   [`compute_hessian`] (central differences, forward fallback, then
//!   symmetrized).
//! - [`calc_standard_errors`] decomposes the information with nalgebra's
//!   `symmetric_eigen` and returns `sqrt(diag(J⁺))`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The gradient map is of the *summed* NLL over all bins, so the
//!   information and the standard errors are on that scale; no `1/n`
//!   rescaling is applied.
//! - Eigenvalues at or below [`EIGEN_EPS`] are dropped from the
//!   pseudo-inverse. A coordinate with weight on a dropped direction (a
//!   filter whose event never occurs) cannot be identified and gets an
//!   infinite standard error.
//! - No explicit inverse is ever formed.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{Hessian, finite_diff::compute_hessian},
    numerical_stability::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

// Squared loading on truncated directions above which a coordinate counts
// as unidentified.
const NULL_WEIGHT_TOL: f64 = 1e-6;

/// Observed information `J(θ̂) = ∂² NLL / ∂θ ∂θᵀ` from the NLL gradient map.
///
/// # Errors
/// Whatever [`compute_hessian`] rejects (non-finite entries, shape
/// mismatch).
pub fn observed_information<F: Fn(&Array1<f64>) -> Array1<f64>>(
    nll_grad: &F, theta_hat: &Array1<f64>,
) -> OptResult<Hessian> {
    compute_hessian(nll_grad, theta_hat)
}

/// Classical standard errors `sqrt(diag(J(θ̂)⁺))`.
///
/// `nll_grad` maps `θ` to the gradient of the negative log-likelihood. It
/// must be C¹ around `theta_hat`. Unidentified coordinates are reported as
/// `f64::INFINITY`, never as `0`.
///
/// # Errors
/// Same as [`observed_information`].
///
/// # Example
/// ```
/// use lick_glm::inference::hessian::calc_standard_errors;
/// use ndarray::{Array1, array};
///
/// // NLL = 2θ₀² + θ₁²/2 → J = diag(4, 1).
/// let grad = |t: &Array1<f64>| array![4.0 * t[0], t[1]];
/// let se = calc_standard_errors(&grad, &array![0.3, -1.0]).unwrap();
/// assert!((se[0] - 0.5).abs() < 1e-6);
/// assert!((se[1] - 1.0).abs() < 1e-6);
/// ```
pub fn calc_standard_errors<F: Fn(&Array1<f64>) -> Array1<f64>>(
    nll_grad: &F, theta_hat: &Array1<f64>,
) -> OptResult<Array1<f64>> {
    let info = observed_information(nll_grad, theta_hat)?;
    Ok(pseudo_inverse_se(to_dmatrix(&info)))
}

fn to_dmatrix(info: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(info.nrows(), info.ncols(), |i, j| info[[i, j]])
}

// Var(θ̂_i) = Σ_{k: λ_k > EIGEN_EPS} Q[i,k]² / λ_k with J = Q Λ Qᵀ.
// e_i outside range(J) means infinite variance.
fn pseudo_inverse_se(info: DMatrix<f64>) -> Array1<f64> {
    let n = info.nrows();
    let eigen = info.symmetric_eigen();
    let q = eigen.eigenvectors;
    Array1::from_shape_fn(n, |i| {
        let mut var = 0.0;
        let mut null_weight = 0.0;
        for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
            let w = q[(i, k)] * q[(i, k)];
            if lambda > EIGEN_EPS {
                var += w / lambda;
            } else {
                null_weight += w;
            }
        }
        if null_weight > NULL_WEIGHT_TOL { f64::INFINITY } else { var.sqrt() }
    })
}
