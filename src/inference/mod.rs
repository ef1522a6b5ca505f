//! inference — post-fit uncertainty for the licking GLM.
//!
//! Purpose
//! -------
//! Quantify uncertainty around a fitted parameter vector `θ̂`. Only the
//! classical observed-information estimator is provided: lick bins are
//! treated as conditionally independent Poisson draws given the history the
//! filters already encode.
//!
//! Key behaviors
//! -------------
//! - [`hessian::observed_information`]: finite-difference Jacobian of the
//!   NLL gradient.
//! - [`hessian::calc_standard_errors`]: `sqrt(diag(J⁺))` via symmetric
//!   eigendecomposition with eigenvalue truncation.
//!
//! Conventions
//! -----------
//! - Everything is in the optimizer's parameter space, which for this model
//!   is also the natural one (filter weights and the mean log-rate).
//! - Errors are reported as `OptResult`; model-level callers such as
//!   `FitResult::standard_errors` convert them into `GLMError`.

pub mod hessian;

pub use self::hessian::{calc_standard_errors, observed_information};

pub mod prelude {
    pub use super::hessian::{calc_standard_errors, observed_information};
}
