//! Feature channels and the parameter layout they induce.
//!
//! Purpose
//! -------
//! Describe which additive terms make up the linear predictor and how the
//! flat parameter vector is split between them.
//!
//! Key behaviors
//! -------------
//! - [`Channel`] is a closed set of variants, each carrying its own typed
//!   filter configuration. A channel that is not wanted is simply left out.
//! - [`ChannelLayout::new`] validates every filter spec, sorts channels into
//!   the fixed order (mean, post-lick, running speed, reward, flash,
//!   change-flash, running acceleration), rejects duplicates and assigns
//!   each channel a contiguous parameter range.
//! - [`ChannelLayout::initial_params`] and
//!   [`ChannelLayout::transfer_params`] produce starting points, the latter
//!   warm-starting from a previous fit with a possibly different layout.
//!
//! Invariants & assumptions
//! ------------------------
//! - Ranges are contiguous, in channel order, and cover `0..n_params()`
//!   exactly.
//! - Basis channels have `n_params ≥ 1`, finite `duration > 0` and
//!   `sigma > 0`; whether the duration covers at least one grid point is
//!   checked later, once `dt` is known.
use crate::{
    glm::errors::{GLMError, GLMResult},
    optimization::loglik_optimizer::Theta,
};
use ndarray::{Array1, s};
use std::{ops::Range, str::FromStr};

/// Starting value of the mean log-rate, roughly 0.6 licks per bin.
pub const MEAN_RATE_INIT: f64 = -0.5;

/// Channel identity, ordered as channels appear in the parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelKind {
    MeanRate,
    PostLick,
    RunningSpeed,
    Reward,
    Flash,
    ChangeFlash,
    RunningAcceleration,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 7] = [
        ChannelKind::MeanRate,
        ChannelKind::PostLick,
        ChannelKind::RunningSpeed,
        ChannelKind::Reward,
        ChannelKind::Flash,
        ChannelKind::ChangeFlash,
        ChannelKind::RunningAcceleration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChannelKind::MeanRate => "mean_rate",
            ChannelKind::PostLick => "post_lick",
            ChannelKind::RunningSpeed => "running_speed",
            ChannelKind::Reward => "reward",
            ChannelKind::Flash => "flash",
            ChannelKind::ChangeFlash => "change_flash",
            ChannelKind::RunningAcceleration => "running_acceleration",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown channel '{s}'"))
    }
}

/// Gaussian-basis filter configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    /// Number of bumps, i.e. parameters.
    pub n_params: usize,
    /// Filter length in seconds; the filter covers `[dt, duration)`.
    pub duration: f64,
    /// Bump standard deviation in seconds.
    pub sigma: f64,
}

impl FilterSpec {
    pub fn new(n_params: usize, duration: f64, sigma: f64) -> Self {
        Self { n_params, duration, sigma }
    }

    pub fn post_lick() -> Self {
        Self::new(10, 0.21, 0.025)
    }

    pub fn running_speed() -> Self {
        Self::new(6, 0.25, 0.025)
    }

    pub fn reward() -> Self {
        Self::new(20, 4.0, 0.25)
    }

    pub fn flash() -> Self {
        Self::new(15, 0.76, 0.05)
    }

    pub fn change_flash() -> Self {
        Self::new(15, 0.76, 0.05)
    }

    pub fn running_acceleration() -> Self {
        Self::new(10, 1.01, 0.2)
    }

    /// # Errors
    /// [`GLMError::InvalidParamCount`], [`GLMError::InvalidDuration`] or
    /// [`GLMError::InvalidSigma`], tagged with `channel`.
    pub fn validate(&self, channel: &'static str) -> GLMResult<()> {
        if self.n_params == 0 {
            return Err(GLMError::InvalidParamCount { channel });
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(GLMError::InvalidDuration { channel, duration: self.duration });
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(GLMError::InvalidSigma { sigma: self.sigma });
        }
        Ok(())
    }
}

/// How running speed enters the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunningSpeedFilter {
    /// Parameters are the filter taps themselves (lag 1, 2, … bins).
    Raw { n_params: usize },
    /// Parameters weight a Gaussian basis.
    Basis(FilterSpec),
}

impl RunningSpeedFilter {
    pub fn n_params(&self) -> usize {
        match self {
            RunningSpeedFilter::Raw { n_params } => *n_params,
            RunningSpeedFilter::Basis(spec) => spec.n_params,
        }
    }
}

impl Default for RunningSpeedFilter {
    fn default() -> Self {
        RunningSpeedFilter::Raw { n_params: FilterSpec::running_speed().n_params }
    }
}

/// One additive term of the linear predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Channel {
    MeanRate,
    PostLick(FilterSpec),
    RunningSpeed(RunningSpeedFilter),
    Reward(FilterSpec),
    Flash(FilterSpec),
    ChangeFlash(FilterSpec),
    RunningAcceleration(FilterSpec),
}

impl Channel {
    pub fn kind(&self) -> ChannelKind {
        match self {
            Channel::MeanRate => ChannelKind::MeanRate,
            Channel::PostLick(_) => ChannelKind::PostLick,
            Channel::RunningSpeed(_) => ChannelKind::RunningSpeed,
            Channel::Reward(_) => ChannelKind::Reward,
            Channel::Flash(_) => ChannelKind::Flash,
            Channel::ChangeFlash(_) => ChannelKind::ChangeFlash,
            Channel::RunningAcceleration(_) => ChannelKind::RunningAcceleration,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn n_params(&self) -> usize {
        match self {
            Channel::MeanRate => 1,
            Channel::RunningSpeed(filter) => filter.n_params(),
            Channel::PostLick(spec)
            | Channel::Reward(spec)
            | Channel::Flash(spec)
            | Channel::ChangeFlash(spec)
            | Channel::RunningAcceleration(spec) => spec.n_params,
        }
    }

    /// Basis configuration, if this channel is basis-expanded.
    pub fn filter_spec(&self) -> Option<&FilterSpec> {
        match self {
            Channel::MeanRate | Channel::RunningSpeed(RunningSpeedFilter::Raw { .. }) => None,
            Channel::RunningSpeed(RunningSpeedFilter::Basis(spec))
            | Channel::PostLick(spec)
            | Channel::Reward(spec)
            | Channel::Flash(spec)
            | Channel::ChangeFlash(spec)
            | Channel::RunningAcceleration(spec) => Some(spec),
        }
    }

    /// The channel of this kind with its stock configuration.
    pub fn default_for(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::MeanRate => Channel::MeanRate,
            ChannelKind::PostLick => Channel::PostLick(FilterSpec::post_lick()),
            ChannelKind::RunningSpeed => Channel::RunningSpeed(RunningSpeedFilter::default()),
            ChannelKind::Reward => Channel::Reward(FilterSpec::reward()),
            ChannelKind::Flash => Channel::Flash(FilterSpec::flash()),
            ChannelKind::ChangeFlash => Channel::ChangeFlash(FilterSpec::change_flash()),
            ChannelKind::RunningAcceleration => {
                Channel::RunningAcceleration(FilterSpec::running_acceleration())
            }
        }
    }

    fn validate(&self) -> GLMResult<()> {
        match self {
            Channel::RunningSpeed(RunningSpeedFilter::Raw { n_params: 0 }) => {
                Err(GLMError::InvalidParamCount { channel: self.name() })
            }
            _ => self.filter_spec().map_or(Ok(()), |spec| spec.validate(self.name())),
        }
    }
}

/// A channel and the slice of `θ` it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBlock {
    pub channel: Channel,
    pub range: Range<usize>,
}

/// Active channels in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLayout {
    blocks: Vec<ChannelBlock>,
    n_params: usize,
}

impl ChannelLayout {
    /// Validate, order and lay out `channels`.
    ///
    /// # Errors
    /// - [`GLMError::EmptyLayout`] for an empty list.
    /// - [`GLMError::DuplicateChannel`] if a kind repeats.
    /// - Filter-spec validation errors.
    pub fn new(mut channels: Vec<Channel>) -> GLMResult<Self> {
        if channels.is_empty() {
            return Err(GLMError::EmptyLayout);
        }
        for channel in &channels {
            channel.validate()?;
        }
        channels.sort_by_key(Channel::kind);
        if let Some(pair) = channels.windows(2).find(|w| w[0].kind() == w[1].kind()) {
            return Err(GLMError::DuplicateChannel { channel: pair[0].name() });
        }

        Ok(Self::from_sorted(channels))
    }

    /// Every channel with its stock configuration.
    pub fn full() -> Self {
        Self::from_sorted(ChannelKind::ALL.into_iter().map(Channel::default_for).collect())
    }

    fn from_sorted(channels: Vec<Channel>) -> Self {
        let mut cursor = 0;
        let blocks = channels
            .into_iter()
            .map(|channel| {
                let range = cursor..cursor + channel.n_params();
                cursor = range.end;
                ChannelBlock { channel, range }
            })
            .collect();
        Self { blocks, n_params: cursor }
    }

    pub fn blocks(&self) -> &[ChannelBlock] {
        &self.blocks
    }

    /// Total parameter count.
    pub fn n_params(&self) -> usize {
        self.n_params
    }

    pub fn get(&self, kind: ChannelKind) -> Option<&ChannelBlock> {
        self.blocks.iter().find(|b| b.channel.kind() == kind)
    }

    pub fn contains(&self, kind: ChannelKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        self.blocks.iter().map(|b| b.channel.kind())
    }

    /// Mean log-rate at [`MEAN_RATE_INIT`], every filter weight at zero.
    pub fn initial_params(&self) -> Theta {
        let mut theta = Array1::zeros(self.n_params);
        if let Some(block) = self.get(ChannelKind::MeanRate) {
            theta[block.range.start] = MEAN_RATE_INIT;
        }
        theta
    }

    /// Warm start from a fit made with `previous`.
    ///
    /// Blocks of channels present in both layouts with the same parameter
    /// count are copied; everything else keeps its
    /// [`initial_params`](Self::initial_params) value.
    ///
    /// # Errors
    /// [`GLMError::ParamCountMismatch`] if `previous_x` does not match
    /// `previous`.
    pub fn transfer_params(&self, previous: &ChannelLayout, previous_x: &Theta) -> GLMResult<Theta> {
        if previous_x.len() != previous.n_params {
            return Err(GLMError::ParamCountMismatch {
                expected: previous.n_params,
                actual: previous_x.len(),
            });
        }
        let mut theta = self.initial_params();
        for block in &self.blocks {
            let Some(old) = previous.get(block.channel.kind()) else { continue };
            if old.range.len() != block.range.len() {
                log::debug!(
                    "not transferring '{}': {} params before, {} now",
                    block.channel.name(),
                    old.range.len(),
                    block.range.len()
                );
                continue;
            }
            theta
                .slice_mut(s![block.range.clone()])
                .assign(&previous_x.slice(s![old.range.clone()]));
        }
        Ok(theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Channels are laid out in declaration order no matter how they are
    // listed, with contiguous ranges.
    //
    // Given
    // -----
    // - Reward (3 params), mean rate, post-lick (2 params), listed out of order.
    //
    // Expect
    // ------
    // - Order mean, post-lick, reward; ranges 0..1, 1..3, 3..6; total 6.
    fn layout_sorts_and_assigns_ranges() {
        let layout = ChannelLayout::new(vec![
            Channel::Reward(FilterSpec::new(3, 4.0, 0.25)),
            Channel::MeanRate,
            Channel::PostLick(FilterSpec::new(2, 0.21, 0.025)),
        ])
        .unwrap();

        let kinds: Vec<_> = layout.kinds().collect();
        assert_eq!(kinds, vec![ChannelKind::MeanRate, ChannelKind::PostLick, ChannelKind::Reward]);
        let ranges: Vec<_> = layout.blocks().iter().map(|b| b.range.clone()).collect();
        assert_eq!(ranges, vec![0..1, 1..3, 3..6]);
        assert_eq!(layout.n_params(), 6);
    }

    #[test]
    fn layout_rejects_duplicates_empty_and_bad_specs() {
        assert_eq!(ChannelLayout::new(vec![]), Err(GLMError::EmptyLayout));
        assert_eq!(
            ChannelLayout::new(vec![
                Channel::Flash(FilterSpec::flash()),
                Channel::MeanRate,
                Channel::Flash(FilterSpec::flash()),
            ]),
            Err(GLMError::DuplicateChannel { channel: "flash" })
        );
        assert_eq!(
            ChannelLayout::new(vec![Channel::Reward(FilterSpec::new(0, 4.0, 0.25))]),
            Err(GLMError::InvalidParamCount { channel: "reward" })
        );
        assert!(matches!(
            ChannelLayout::new(vec![Channel::PostLick(FilterSpec::new(3, -1.0, 0.1))]),
            Err(GLMError::InvalidDuration { channel: "post_lick", .. })
        ));
        assert!(matches!(
            ChannelLayout::new(vec![Channel::RunningSpeed(RunningSpeedFilter::Raw { n_params: 0 })]),
            Err(GLMError::InvalidParamCount { channel: "running_speed" })
        ));
    }

    #[test]
    fn full_layout_uses_stock_sizes() {
        let layout = ChannelLayout::full();

        // 1 + 10 + 6 + 20 + 15 + 15 + 10
        assert_eq!(layout.n_params(), 77);
        assert_eq!(layout.blocks().len(), 7);
        assert_eq!(layout.blocks().last().map(|b| b.range.end), Some(77));
    }

    #[test]
    fn initial_params_set_mean_only() {
        let layout = ChannelLayout::new(vec![
            Channel::MeanRate,
            Channel::PostLick(FilterSpec::new(2, 0.21, 0.025)),
        ])
        .unwrap();

        assert_eq!(layout.initial_params(), array![-0.5, 0.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // Warm starts copy blocks that exist in both layouts with the same size
    // and fall back to defaults for new or resized channels.
    //
    // Given
    // -----
    // - Previous: mean (1), post-lick (2), flash (2).
    // - Current: mean (1), post-lick (3), flash (2), reward (1).
    //
    // Expect
    // ------
    // - mean and flash copied; post-lick and reward at zero.
    fn transfer_params_copies_matching_blocks() {
        let previous = ChannelLayout::new(vec![
            Channel::MeanRate,
            Channel::PostLick(FilterSpec::new(2, 0.21, 0.025)),
            Channel::Flash(FilterSpec::new(2, 0.76, 0.05)),
        ])
        .unwrap();
        let previous_x = array![-4.0, 1.0, 2.0, 3.0, 4.0];
        let current = ChannelLayout::new(vec![
            Channel::MeanRate,
            Channel::PostLick(FilterSpec::new(3, 0.21, 0.025)),
            Channel::Flash(FilterSpec::new(2, 0.76, 0.05)),
            Channel::Reward(FilterSpec::new(1, 4.0, 0.25)),
        ])
        .unwrap();

        let theta = current.transfer_params(&previous, &previous_x).unwrap();

        assert_eq!(theta, array![-4.0, 0.0, 0.0, 0.0, 0.0, 3.0, 4.0]);
        assert_eq!(
            current.transfer_params(&previous, &array![1.0]),
            Err(GLMError::ParamCountMismatch { expected: 5, actual: 1 })
        );
    }

    #[test]
    fn channel_kind_names_round_trip() {
        for kind in ChannelKind::ALL {
            assert_eq!(kind.name().parse::<ChannelKind>(), Ok(kind));
        }
        assert!("licks".parse::<ChannelKind>().is_err());
    }
}
