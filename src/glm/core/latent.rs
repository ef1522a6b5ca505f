//! Latent rate assembly.
//!
//! Purpose
//! -------
//! Turn a flat parameter vector into the per-bin linear predictor `η` and
//! the latent rate `λ = exp(clip(η))`, and pull per-bin residuals back onto
//! the parameters for the analytic gradient.
//!
//! Key behaviors
//! -------------
//! - [`LatentAssembler::new`] precomputes one [`BasisFunctions`] per
//!   basis-expanded channel, so evaluations only pay for products and
//!   convolutions.
//! - [`LatentAssembler::linear_predictor`] walks the layout with a running
//!   cursor and adds each channel's contribution.
//! - [`LatentAssembler::pullback`] is the transpose of `linear_predictor`:
//!   `∂η/∂θ` applied to a residual.
//!
//! Invariants & assumptions
//! ------------------------
//! - A channel whose slice of `θ` is shorter than its declared count is a
//!   [`GLMError::ParamMisalignment`]; a cursor that does not end exactly at
//!   `θ.len()` is a [`GLMError::ParamCountMismatch`]. Nothing is padded or
//!   truncated.
//! - Covariate channels need their covariate in [`SessionData`]; a missing
//!   one is a [`GLMError::MissingCovariate`].
use crate::{
    glm::{
        core::{
            basis::{BasisFunctions, filter_time_vec},
            channels::{Channel, ChannelKind, ChannelLayout},
            compose::{
                add_causal_convolution, add_event_response, covariate_lag_sums, event_lag_sums,
            },
            data::SessionData,
            grid::TimeGrid,
        },
        errors::{GLMError, GLMResult},
    },
    optimization::numerical_stability::clipped_exp,
};
use ndarray::{Array1, ArrayView1, s};

/// What a channel reads from the session.
#[derive(Debug, Clone, Copy)]
enum ChannelInput<'a> {
    Constant,
    Events(&'a [usize]),
    Covariate(ArrayView1<'a, f64>),
}

#[derive(Debug, Clone, PartialEq)]
struct AssembledChannel {
    kind: ChannelKind,
    n_params: usize,
    // None for the mean rate and raw running-speed taps.
    basis: Option<BasisFunctions>,
}

impl AssembledChannel {
    fn from_channel(channel: &Channel, dt: f64) -> GLMResult<Self> {
        let basis = match channel.filter_spec() {
            Some(spec) => {
                let time_vec = filter_time_vec(dt, spec.duration);
                if time_vec.is_empty() {
                    return Err(GLMError::EmptyFilter { duration: spec.duration, dt });
                }
                Some(BasisFunctions::new(spec.n_params, time_vec, spec.sigma)?)
            }
            None => None,
        };
        Ok(Self { kind: channel.kind(), n_params: channel.n_params(), basis })
    }

    fn filter(&self, params: ArrayView1<f64>) -> Array1<f64> {
        match &self.basis {
            Some(basis) => basis.filter(params),
            None => params.to_owned(),
        }
    }

    fn filter_len(&self) -> usize {
        self.basis.as_ref().map_or(self.n_params, BasisFunctions::len)
    }

    fn pull_taps(&self, tap_grad: Array1<f64>) -> Array1<f64> {
        match &self.basis {
            Some(basis) => basis.pullback(tap_grad.view()),
            None => tap_grad,
        }
    }
}

/// Layout-driven builder of `η` for one time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentAssembler {
    grid: TimeGrid,
    channels: Vec<AssembledChannel>,
}

impl LatentAssembler {
    /// # Errors
    /// - [`GLMError::EmptyFilter`] when a filter duration holds no grid point.
    /// - Basis construction errors.
    pub fn new(layout: &ChannelLayout, grid: TimeGrid) -> GLMResult<Self> {
        let channels = layout
            .blocks()
            .iter()
            .map(|block| AssembledChannel::from_channel(&block.channel, grid.dt))
            .collect::<GLMResult<Vec<_>>>()?;
        Ok(Self { grid, channels })
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Sum of the declared parameter counts.
    pub fn n_params(&self) -> usize {
        self.channels.iter().map(|c| c.n_params).sum()
    }

    /// `η_t = Σ_channels contribution_t(θ_channel)` over `[0, stop_time)`.
    ///
    /// # Errors
    /// [`GLMError::ParamMisalignment`], [`GLMError::ParamCountMismatch`] or
    /// [`GLMError::MissingCovariate`].
    pub fn linear_predictor(&self, theta: ArrayView1<f64>, data: &SessionData) -> GLMResult<Array1<f64>> {
        let mut eta = Array1::zeros(self.grid.stop_time);
        let mut cursor = 0;
        for channel in &self.channels {
            let params = take_params(theta, &mut cursor, channel)?;
            match channel_input(channel.kind, data)? {
                ChannelInput::Constant => eta += params[0],
                ChannelInput::Events(events) => {
                    add_event_response(eta.view_mut(), events, channel.filter(params).view())
                }
                ChannelInput::Covariate(covariate) => {
                    add_causal_convolution(eta.view_mut(), covariate, channel.filter(params).view())
                }
            }
        }
        finish_params(theta, cursor)?;
        Ok(eta)
    }

    /// `exp(clip(η))` for every bin.
    pub fn latent(&self, theta: ArrayView1<f64>, data: &SessionData) -> GLMResult<Array1<f64>> {
        Ok(self.linear_predictor(theta, data)?.mapv(clipped_exp))
    }

    /// `(∂η/∂θ)ᵀ · resid`, laid out like `θ`.
    ///
    /// # Errors
    /// [`GLMError::MissingCovariate`] as in
    /// [`linear_predictor`](Self::linear_predictor).
    pub fn pullback(&self, resid: ArrayView1<f64>, data: &SessionData) -> GLMResult<Array1<f64>> {
        let mut grad = Array1::zeros(self.n_params());
        let mut cursor = 0;
        for channel in &self.channels {
            let block = cursor..cursor + channel.n_params;
            cursor = block.end;
            let len = channel.filter_len();
            let local = match channel_input(channel.kind, data)? {
                ChannelInput::Constant => Array1::from_elem(1, resid.sum()),
                ChannelInput::Events(events) => {
                    channel.pull_taps(event_lag_sums(events, resid, len))
                }
                ChannelInput::Covariate(covariate) => {
                    channel.pull_taps(covariate_lag_sums(covariate, resid, len))
                }
            };
            grad.slice_mut(s![block]).assign(&local);
        }
        Ok(grad)
    }

    /// Linear filter of `kind` at `theta`; `None` if the channel is absent.
    ///
    /// Raw channels return their taps, basis channels the expanded filter.
    ///
    /// # Errors
    /// [`GLMError::ParamCountMismatch`] unless `theta` covers the whole layout.
    pub fn channel_filter(
        &self, kind: ChannelKind, theta: ArrayView1<f64>,
    ) -> GLMResult<Option<Array1<f64>>> {
        finish_params(theta, self.n_params())?;
        let mut cursor = 0;
        for channel in &self.channels {
            let params = take_params(theta, &mut cursor, channel)?;
            if channel.kind == kind {
                return Ok(Some(channel.filter(params)));
            }
        }
        Ok(None)
    }
}

fn take_params<'a>(
    theta: ArrayView1<'a, f64>, cursor: &mut usize, channel: &AssembledChannel,
) -> GLMResult<ArrayView1<'a, f64>> {
    let start = *cursor;
    let available = theta.len().saturating_sub(start);
    if available < channel.n_params {
        return Err(GLMError::ParamMisalignment {
            channel: channel.kind.name(),
            expected: channel.n_params,
            found: available,
        });
    }
    *cursor += channel.n_params;
    Ok(theta.slice_move(s![start..*cursor]))
}

fn finish_params(theta: ArrayView1<f64>, cursor: usize) -> GLMResult<()> {
    if cursor != theta.len() {
        return Err(GLMError::ParamCountMismatch { expected: cursor, actual: theta.len() });
    }
    Ok(())
}

fn channel_input(kind: ChannelKind, data: &SessionData) -> GLMResult<ChannelInput<'_>> {
    match kind {
        ChannelKind::MeanRate => Ok(ChannelInput::Constant),
        ChannelKind::PostLick => Ok(ChannelInput::Events(data.licks.bins())),
        ChannelKind::Reward => Ok(ChannelInput::Events(data.rewards.bins())),
        ChannelKind::Flash => Ok(ChannelInput::Events(data.flashes.bins())),
        ChannelKind::ChangeFlash => Ok(ChannelInput::Events(data.change_flashes.bins())),
        ChannelKind::RunningSpeed => covariate_input(kind, data.running_speed.as_ref()),
        ChannelKind::RunningAcceleration => {
            covariate_input(kind, data.running_acceleration.as_ref())
        }
    }
}

fn covariate_input(kind: ChannelKind, values: Option<&Array1<f64>>) -> GLMResult<ChannelInput<'_>> {
    values
        .map(|v| ChannelInput::Covariate(v.view()))
        .ok_or(GLMError::MissingCovariate { channel: kind.name() })
}

/// Whether `layout` needs the covariate of `kind` to be present.
pub fn requires_covariate(layout: &ChannelLayout, kind: ChannelKind) -> bool {
    matches!(kind, ChannelKind::RunningSpeed | ChannelKind::RunningAcceleration)
        && layout.contains(kind)
}
