//! GLM options — fitting configuration for the licking model.
//!
//! Purpose
//! -------
//! Bundle the optimizer settings and the ridge strength into one validated
//! value, so a [`LickModel`](crate::glm::models::LickModel) is configured by
//! a single argument instead of loose knobs.
//!
//! Conventions
//! -----------
//! - Defaults follow the stock fitting setup: L-BFGS with More–Thuente line
//!   search, gradient tolerance 1e-6, 300 iterations, no penalty.
use crate::{
    glm::errors::{GLMError, GLMResult},
    optimization::loglik_optimizer::MLEOptions,
};

/// GLMOptions — estimation-time configuration for the licking GLM.
///
/// Purpose
/// -------
/// Carry everything `fit` needs besides the layout, the grid and the data.
///
/// Fields
/// ------
/// - `mle_opts`: [`MLEOptions`]
///   Tolerances, iteration cap, line search and L-BFGS memory. Validated by
///   its own constructor.
/// - `l2`: `f64`
///   Ridge strength in `l2 · Σ θ²`. Finite and `>= 0`; the mean-rate weight
///   is penalized like every other parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct GLMOptions {
    pub mle_opts: MLEOptions,
    pub l2: f64,
}

impl GLMOptions {
    /// # Errors
    /// [`GLMError::InvalidL2`] unless `l2` is finite and non-negative.
    pub fn new(mle_opts: MLEOptions, l2: f64) -> GLMResult<Self> {
        if !l2.is_finite() || l2 < 0.0 {
            return Err(GLMError::InvalidL2 { l2 });
        }
        Ok(Self { mle_opts, l2 })
    }
}

impl Default for GLMOptions {
    fn default() -> Self {
        Self { mle_opts: MLEOptions::default(), l2: 0.0 }
    }
}
