//! Gaussian basis filters.
//!
//! Purpose
//! -------
//! Parameterize a temporal response kernel as a weighted sum of `K`
//! normalized Gaussian bumps, so a smooth filter of any length costs only
//! `K` parameters.
//!
//! Key behaviors
//! -------------
//! - [`filter_time_vec`] lists the evaluation points `dt, 2·dt, …` strictly
//!   below the filter duration.
//! - [`BasisFunctions`] evaluates the `K` bumps once (a `K × L` matrix) so
//!   repeated likelihood evaluations only pay for a matrix-vector product.
//! - [`build_filter`] is the one-shot form: bumps and weighted sum in one
//!   call.
//!
//! Invariants & assumptions
//! ------------------------
//! - Bump `i` is centered at `spacing · i` with
//!   `spacing = (last - first) / (K - 1)`, so the first center sits at 0,
//!   not at the first evaluation point. With `K = 1` there is no spacing and
//!   the single bump is centered at 0.
//! - Bumps are evaluated only on the supplied points: mass outside the
//!   window is truncated, never renormalized.
use crate::glm::errors::{GLMError, GLMResult};
use ndarray::{Array1, Array2, ArrayView1};
use std::f64::consts::PI;

// Relative slack for float drift in `(duration - dt) / dt`.
const GRID_DRIFT: f64 = 1e-9;

/// Evaluation points `dt, 2·dt, …` strictly below `duration`.
///
/// Empty when `duration <= dt`. A duration that is an exact multiple of `dt`
/// is excluded, matching a half-open `[dt, duration)` range.
pub fn filter_time_vec(dt: f64, duration: f64) -> Array1<f64> {
    let steps = ((duration - dt) / dt - GRID_DRIFT).ceil();
    let len = if steps.is_finite() && steps > 0.0 { steps as usize } else { 0 };
    Array1::from_shape_fn(len, |i| (i + 1) as f64 * dt)
}

/// Normalized Gaussian density `exp(-(t-μ)²/2σ²) / sqrt(2πσ²)`.
pub fn gaussian_bump(t: f64, mu: f64, sigma: f64) -> f64 {
    let var = sigma * sigma;
    (-(t - mu).powi(2) / (2.0 * var)).exp() / (2.0 * PI * var).sqrt()
}

/// Bump centers for `k` weights over `time_vec`.
pub fn bump_centers(k: usize, time_vec: ArrayView1<f64>) -> Array1<f64> {
    if k <= 1 || time_vec.is_empty() {
        return Array1::zeros(k);
    }
    let spacing = (time_vec[time_vec.len() - 1] - time_vec[0]) / (k - 1) as f64;
    Array1::from_shape_fn(k, |i| spacing * i as f64)
}

/// Precomputed `K × L` bump matrix for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisFunctions {
    time_vec: Array1<f64>,
    bumps: Array2<f64>,
}

impl BasisFunctions {
    /// # Errors
    /// - [`GLMError::EmptyBasis`] if `n_params == 0`.
    /// - [`GLMError::EmptyTimeVector`] if `time_vec` is empty.
    /// - [`GLMError::InvalidSigma`] unless `sigma` is finite and > 0.
    pub fn new(n_params: usize, time_vec: Array1<f64>, sigma: f64) -> GLMResult<Self> {
        if n_params == 0 {
            return Err(GLMError::EmptyBasis);
        }
        if time_vec.is_empty() {
            return Err(GLMError::EmptyTimeVector);
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(GLMError::InvalidSigma { sigma });
        }
        let centers = bump_centers(n_params, time_vec.view());
        let bumps = Array2::from_shape_fn((n_params, time_vec.len()), |(i, k)| {
            gaussian_bump(time_vec[k], centers[i], sigma)
        });
        Ok(Self { time_vec, bumps })
    }

    pub fn n_params(&self) -> usize {
        self.bumps.nrows()
    }

    /// Filter length `L`.
    pub fn len(&self) -> usize {
        self.bumps.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.bumps.ncols() == 0
    }

    pub fn time_vec(&self) -> ArrayView1<'_, f64> {
        self.time_vec.view()
    }

    /// Row `i` is bump `i` sampled on the time vector.
    pub fn bumps(&self) -> &Array2<f64> {
        &self.bumps
    }

    /// Weighted sum of the bumps. `weights.len()` must equal `n_params()`;
    /// callers slice weights through the channel layout, which guarantees it.
    pub fn filter(&self, weights: ArrayView1<f64>) -> Array1<f64> {
        weights.dot(&self.bumps)
    }

    /// Pull a gradient with respect to the filter taps back onto the weights.
    pub fn pullback(&self, tap_grad: ArrayView1<f64>) -> Array1<f64> {
        self.bumps.dot(&tap_grad)
    }
}

/// Weighted sum of `params.len()` Gaussian bumps evaluated on `time_vec`.
///
/// # Errors
/// Same as [`BasisFunctions::new`].
pub fn build_filter(
    params: ArrayView1<f64>, time_vec: ArrayView1<f64>, sigma: f64,
) -> GLMResult<Array1<f64>> {
    let basis = BasisFunctions::new(params.len(), time_vec.to_owned(), sigma)?;
    Ok(basis.filter(params))
}
