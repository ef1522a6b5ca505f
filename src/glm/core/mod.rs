//! core — time grid, channel layout, filters and the Poisson objective.
//!
//! Purpose
//! -------
//! Collect the building blocks of the licking GLM: discretized session data,
//! Gaussian basis filters, causal response composition, the channel layout
//! that partitions `θ`, latent rate assembly, and the penalized Poisson
//! likelihood with its analytic gradient. The model layer in
//! `glm::models` wires these together behind the optimizer.
//!
//! Key behaviors
//! -------------
//! - [`grid`]: `round(t / dt)` discretization ([`discretize`]), the
//!   validated [`TimeGrid`], [`EventTrain`] and covariate resampling.
//! - [`data`]: [`SessionData`] on the grid and its preparation from a
//!   [`RawSession`].
//! - [`basis`]: normalized Gaussian bumps and [`build_filter`].
//! - [`compose`]: event-triggered responses and causal convolutions, plus
//!   their transposes for gradients.
//! - [`channels`]: the closed [`Channel`] enum, [`FilterSpec`] defaults and
//!   the ordered [`ChannelLayout`].
//! - [`latent`]: [`LatentAssembler`] (θ → η → λ and back).
//! - [`likelihood`]: [`poisson_nll`] and [`nll_gradient`].
//! - [`options`]: [`GLMOptions`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Every channel's effect starts strictly after the event or covariate
//!   sample that drives it.
//! - Parameter accounting is exact: the layout's block sizes sum to
//!   `θ.len()` or evaluation fails.
//! - Latent rates are strictly positive (`exp` of a clipped predictor).
//!
//! Conventions
//! -----------
//! - Bins are 0-based; valid indices are `[0, stop_time)`.
//! - Channels always appear in `θ` in declaration order: mean rate,
//!   post-lick, running speed, reward, flash, change flash, running
//!   acceleration.
//! - No I/O here; `log` is only used for data-preparation summaries and
//!   warm-start notes.

pub mod basis;
pub mod channels;
pub mod compose;
pub mod data;
pub mod grid;
pub mod latent;
pub mod likelihood;
pub mod options;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::basis::{BasisFunctions, build_filter, filter_time_vec};
pub use self::channels::{
    Channel, ChannelBlock, ChannelKind, ChannelLayout, FilterSpec, MEAN_RATE_INIT,
    RunningSpeedFilter,
};
pub use self::compose::{compose_causal_convolution, compose_event_response};
pub use self::data::{RawSession, SessionData, extract_change_flashes, running_acceleration};
pub use self::grid::{EventTrain, TimeGrid, discretize, resample_covariate};
pub use self::latent::LatentAssembler;
pub use self::likelihood::{l2_penalty, nll_gradient, poisson_nll};
pub use self::options::GLMOptions;
