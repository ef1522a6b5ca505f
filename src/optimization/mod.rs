//! optimization — argmin-backed MLE stack, numerical guards, error surface.
//!
//! Purpose
//! -------
//! Provide the model-agnostic half of the fitting engine: a
//! log-likelihood maximizer built on argmin's L-BFGS, finite-difference
//! fallbacks for gradients and Hessians, the numerical safety nets used by
//! the Poisson likelihood, and one error type for all of it.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer`: implement [`LogLikelihood`] for a model, call
//!   [`maximize`], get an [`OptimOutcome`] back. Convergence criteria, step
//!   sizes and line searches live entirely in argmin.
//! - `numerical_stability`: clipped exponential, epsilon-nudged logarithm,
//!   eigenvalue cutoff.
//! - `errors`: [`OptError`] / [`OptResult`], including conversions from
//!   argmin errors and from the GLM layer's `GLMError`.
//!
//! Conventions
//! -----------
//! - The optimizer always *maximizes* `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`.
//!   For the licking GLM, `ℓ(θ) = -NLL(θ)`.
//! - Parameters and gradients are `ndarray::Array1<f64>` ([`Theta`],
//!   [`Grad`]).
//! - Non-convergence is reported through `OptimOutcome::converged`, never
//!   as an error.
//!
//! [`LogLikelihood`]: loglik_optimizer::LogLikelihood
//! [`maximize`]: loglik_optimizer::maximize
//! [`OptimOutcome`]: loglik_optimizer::OptimOutcome
//! [`OptError`]: errors::OptError
//! [`OptResult`]: errors::OptResult
//! [`Theta`]: loglik_optimizer::Theta
//! [`Grad`]: loglik_optimizer::Grad

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
