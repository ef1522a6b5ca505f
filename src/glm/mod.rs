//! glm — point-process GLM of licking: data, filters, likelihood, models.
//!
//! Purpose
//! -------
//! Model the instantaneous lick rate of an animal as
//! `λ_t = exp(η_t)`, where `η_t` sums a constant mean log-rate and causal
//! filters driven by the animal's own licks, running speed and acceleration,
//! rewards, image flashes and image changes. Filters are weighted sums of
//! Gaussian bumps. Parameters are fitted by penalized Poisson maximum
//! likelihood and models are compared by BIC.
//!
//! Key behaviors
//! -------------
//! - [`core`]: time grid and session data, basis filters, response
//!   composition, channel layout, latent rate and Poisson likelihood.
//! - [`models`]: [`LickModel`], [`FitResult`], BIC, nested comparison.
//! - [`errors`]: [`GLMError`] / [`GLMResult`], with conversions to and from
//!   the optimizer's `OptError` (and into `PyErr` with `python-bindings`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Causality: no channel affects the bin of the event that drives it.
//! - Exact parameter accounting: `θ.len()` equals the layout's total.
//! - The latent rate is strictly positive everywhere.
//! - Non-convergence is a property of a fit, not an error.
//!
//! Conventions
//! -----------
//! - Times are seconds; bins are 0-based `usize` indices on a
//!   [`TimeGrid`].
//! - Channel order in `θ`: mean rate, post-lick, running speed, reward,
//!   flash, change flash, running acceleration.
//! - Logging goes through the `log` facade; nothing here installs a logger.
//!
//! Testing notes
//! -------------
//! - Unit tests in each `core` module cover discretization, basis
//!   normalization, causality, parameter accounting and gradient
//!   correctness.
//! - `tests/integration_glm_pipeline.rs` simulates sessions from a known
//!   model and checks recovery, BIC comparison and warm starts end to end.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    Channel, ChannelKind, ChannelLayout, EventTrain, FilterSpec, GLMOptions, RawSession,
    RunningSpeedFilter, SessionData, TimeGrid, discretize,
};

pub use self::errors::{GLMError, GLMResult};

pub use self::models::{FitResult, LickModel, ModelComparison, compare_nested, compute_bic};

pub mod prelude {
    pub use super::{
        Channel, ChannelKind, ChannelLayout, EventTrain, FilterSpec, FitResult, GLMError,
        GLMOptions, GLMResult, LickModel, ModelComparison, RawSession, RunningSpeedFilter,
        SessionData, TimeGrid, compare_nested, compute_bic, discretize,
    };
}
