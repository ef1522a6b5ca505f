//! loglik_optimizer — argmin L-BFGS behind a log-likelihood trait.
//!
//! Purpose
//! -------
//! Let a model implement [`LogLikelihood`] and get maximum-likelihood
//! estimates from [`maximize`] without touching argmin types.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the cost `-ℓ(θ)` and
//!   falls back to finite differences when no analytic gradient exists.
//! - [`builders`] build L-BFGS with a More–Thuente or Hager–Zhang line
//!   search and apply tolerances; [`run`] applies the iteration cap,
//!   executes, and normalizes the result into an [`OptimOutcome`].
//! - [`finite_diff`] also exposes [`finite_diff::compute_hessian`], used by
//!   the inference layer for observed-information standard errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Model code implements `ℓ` and `∇ℓ`, never the cost.
//! - Model failures are `OptError` values; nothing in this module panics.
//! - [`Tolerances`] and [`MLEOptions`] are validated when constructed.
//!
//! Testing notes
//! -------------
//! - Each submodule tests its own piece on small Poisson objectives with
//!   closed-form answers; the GLM integration tests drive [`maximize`]
//!   end to end.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Hessian, Theta};
}
