//! Poisson point-process likelihood with an L2 penalty.
//!
//! Purpose
//! -------
//! Score a latent rate against observed lick bins and provide the exact
//! gradient with respect to the parameters.
//!
//! Key behaviors
//! -------------
//! - [`poisson_nll`]: `-Σ_{e ∈ licks} ln λ[e] + Σ_t λ[t] + l2 · Σ θ²`.
//!   Duplicated licks count once per occurrence.
//! - [`nll_gradient`]: `(∂η/∂θ)ᵀ r + 2 · l2 · θ` with
//!   `r_t = (λ_t - y_t) · 1{|η_t| ≤ 700}`, `y_t` the lick count of bin `t`.
//!
//! Invariants & assumptions
//! ------------------------
//! - A lick index `≥ λ.len()` is an upstream data error
//!   ([`GLMError::EventIndexOutOfRange`]), never silently dropped.
//! - Zero rates are nudged to machine epsilon before the log, so the NLL
//!   stays finite.
//! - Bins whose predictor sits on the ±700 clip contribute no gradient; the
//!   clipped map is flat there.
use crate::{
    glm::{
        core::{data::SessionData, latent::LatentAssembler},
        errors::{GLMError, GLMResult},
    },
    optimization::numerical_stability::{clipped_exp, nudged_ln, within_clip},
};
use ndarray::{Array1, ArrayView1, Zip};

/// `l2 · Σ θ²`.
pub fn l2_penalty(theta: ArrayView1<f64>, l2: f64) -> f64 {
    if l2 == 0.0 { 0.0 } else { l2 * theta.dot(&theta) }
}

/// Negative log-likelihood of `licks` under `latent`, plus the L2 penalty.
///
/// # Errors
/// [`GLMError::EventIndexOutOfRange`] for a lick outside `latent`.
pub fn poisson_nll(
    licks: &[usize], latent: ArrayView1<f64>, theta: ArrayView1<f64>, l2: f64,
) -> GLMResult<f64> {
    let mut event_term = 0.0;
    for &lick in licks {
        let rate = latent
            .get(lick)
            .ok_or(GLMError::EventIndexOutOfRange { index: lick, len: latent.len() })?;
        event_term += nudged_ln(*rate);
    }
    Ok(-event_term + latent.sum() + l2_penalty(theta, l2))
}

/// Per-bin residual `(λ_t - y_t)`, zeroed where the clip is active.
///
/// # Errors
/// [`GLMError::EventIndexOutOfRange`] for a lick outside `eta`.
pub fn poisson_residual(eta: ArrayView1<f64>, licks: &[usize]) -> GLMResult<Array1<f64>> {
    let mut resid = eta.mapv(clipped_exp);
    for &lick in licks {
        let slot = resid
            .get_mut(lick)
            .ok_or(GLMError::EventIndexOutOfRange { index: lick, len: eta.len() })?;
        *slot -= 1.0;
    }
    Zip::from(&mut resid).and(&eta).for_each(|r, &e| {
        if !within_clip(e) {
            *r = 0.0;
        }
    });
    Ok(resid)
}

/// Analytic gradient of [`poisson_nll`] with respect to `θ`.
///
/// # Errors
/// Predictor errors from the assembler and
/// [`GLMError::EventIndexOutOfRange`].
pub fn nll_gradient(
    assembler: &LatentAssembler, theta: ArrayView1<f64>, data: &SessionData, l2: f64,
) -> GLMResult<Array1<f64>> {
    let eta = assembler.linear_predictor(theta, data)?;
    let resid = poisson_residual(eta.view(), data.licks.bins())?;
    let mut grad = assembler.pullback(resid.view(), data)?;
    if l2 != 0.0 {
        grad.scaled_add(2.0 * l2, &theta);
    }
    Ok(grad)
}
