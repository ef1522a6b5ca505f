//! models — the licking GLM, its fit summary and model comparison.
//!
//! Purpose
//! -------
//! Sit on top of `glm::core` and the generic optimizer: [`LickModel`] turns
//! a channel layout into a [`LogLikelihood`], `fit` runs L-BFGS and
//! [`evaluate`] produces the authoritative [`FitResult`]. [`compare_nested`]
//! weighs two fits of the same session against each other.
//!
//! Key behaviors
//! -------------
//! - [`LickModel::fit`] validates data up front, maximizes `-NLL`, logs
//!   start, non-convergence and finish, then evaluates once at `θ̂`.
//! - [`compute_bic`] is `ln(n_bins) · k + 2 · NLL`.
//! - [`FitResult::standard_errors`] gives classical SEs through
//!   `crate::inference`.
//! - [`compare_nested`] reports ΔBIC and a χ² likelihood-ratio test.
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`FitResult`] is never mutated after `evaluate`; refitting produces a
//!   new one.
//! - Sessions passed to a model must be on the model's grid.
//!
//! Downstream usage
//! ----------------
//! - Typical flow:
//!   1. Prepare [`SessionData`](crate::glm::core::SessionData), usually with
//!      `SessionData::from_raw`.
//!   2. Build a [`ChannelLayout`](crate::glm::core::ChannelLayout) and a
//!      [`LickModel`] on the session's grid.
//!   3. `fit(model.initial_params(), &data)`, or warm-start from a smaller
//!      model with `ChannelLayout::transfer_params`.
//!   4. Compare fits with [`compare_nested`] or by BIC directly.
//!
//! [`LogLikelihood`]: crate::optimization::loglik_optimizer::LogLikelihood

pub mod compare;
pub mod evaluate;
pub mod lick_model;

pub use self::compare::{ModelComparison, compare_nested};
pub use self::evaluate::{FitResult, compute_bic, evaluate};
pub use self::lick_model::LickModel;
