//! Numerical safety nets for the Poisson GLM.
//!
//! The latent rate is `exp(η)` for a linear predictor `η` that the optimizer
//! is free to push anywhere during a line search. These helpers keep the
//! exponential and the logarithm inside `f64` range:
//!
//! - [`LATENT_CLIP`]: symmetric bound applied to `η` before exponentiation.
//!   `exp(700)` ≈ 1e304 is still finite; `exp(710)` is not.
//! - [`clipped_exp`]: `exp(clip(η, -LATENT_CLIP, LATENT_CLIP))`.
//! - [`within_clip`]: indicator used by the gradient, since the clipped
//!   exponential is flat outside the bound.
//! - [`nudged_ln`]: natural log with zeros nudged by machine epsilon.
//!
//! In realistic fits the predictor never comes close to the bound; the clip
//! only matters for wild trial steps.

/// Bound applied to the linear predictor before exponentiation.
pub const LATENT_CLIP: f64 = 700.0;

/// Eigenvalues at or below this magnitude are treated as zero when
/// pseudo-inverting an information matrix.
pub const EIGEN_EPS: f64 = 1e-10;

/// `exp(η)` with `η` clipped to `[-LATENT_CLIP, LATENT_CLIP]`.
///
/// Always finite and strictly positive for finite input; `NaN` propagates.
#[inline]
pub fn clipped_exp(eta: f64) -> f64 {
    eta.clamp(-LATENT_CLIP, LATENT_CLIP).exp()
}

/// `true` when `η` lies inside the clip window, where `d clipped_exp / dη`
/// equals `clipped_exp(η)` rather than zero.
#[inline]
pub fn within_clip(eta: f64) -> bool {
    eta.abs() <= LATENT_CLIP
}

/// Natural logarithm where an exact zero is replaced by `f64::EPSILON`.
#[inline]
pub fn nudged_ln(x: f64) -> f64 {
    if x == 0.0 { f64::EPSILON.ln() } else { x.ln() }
}
