//! Licking GLM: penalized Poisson likelihood over a channel layout.
//!
//! This module wires a [`ChannelLayout`] and a [`TimeGrid`] to the
//! [`LogLikelihood`] trait. The model is immutable configuration: `fit`
//! takes `&self`, receives every data series explicitly, and hands back a
//! fresh [`FitResult`], so one model can fit many sessions on the same grid.
//!
//! Key ideas:
//! - `ℓ(θ) = -NLL(θ)`; the optimizer maximizes `ℓ` and the analytic gradient
//!   is `-∇NLL`.
//! - All basis matrices are built once in [`LickModel::new`]; a likelihood
//!   evaluation is a handful of products and causal convolutions over the
//!   grid.
//! - Data problems (grid mismatch, missing covariates, licks off the grid)
//!   are rejected by `check` before the optimizer starts.
use crate::{
    glm::{
        core::{
            channels::{ChannelKind, ChannelLayout},
            data::SessionData,
            grid::TimeGrid,
            latent::{LatentAssembler, requires_covariate},
            likelihood::{nll_gradient, poisson_nll},
            options::GLMOptions,
        },
        errors::{GLMError, GLMResult},
        models::evaluate::{FitResult, evaluate},
    },
    optimization::{
        errors::OptResult,
        loglik_optimizer::{Grad, LogLikelihood, Theta, maximize},
    },
};
use ndarray::{Array1, ArrayView1};
use std::time::Instant;

/// Poisson point-process GLM of lick times.
///
/// Holds the ordered channel layout, the time grid every session must be
/// discretized on, the fitting options and the precomputed basis matrices.
///
/// # Notes
/// - Implements [`LogLikelihood`] with `Data = SessionData`, so it plugs
///   straight into [`maximize`].
/// - No interior mutability: concurrent evaluations on one model are safe.
#[derive(Debug, Clone, PartialEq)]
pub struct LickModel {
    layout: ChannelLayout,
    options: GLMOptions,
    assembler: LatentAssembler,
}

impl LickModel {
    /// # Errors
    /// Basis construction errors for any filter channel, e.g.
    /// [`GLMError::EmptyFilter`] when a duration is not longer than `dt`.
    pub fn new(layout: ChannelLayout, grid: TimeGrid, options: GLMOptions) -> GLMResult<Self> {
        let assembler = LatentAssembler::new(&layout, grid)?;
        log::debug!(
            "model layout: {}",
            layout
                .blocks()
                .iter()
                .map(|b| format!("{}[{}..{}]", b.channel.name(), b.range.start, b.range.end))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self { layout, options, assembler })
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    pub fn grid(&self) -> &TimeGrid {
        self.assembler.grid()
    }

    pub fn options(&self) -> &GLMOptions {
        &self.options
    }

    pub fn n_params(&self) -> usize {
        self.layout.n_params()
    }

    /// Mean log-rate -0.5, zero filters.
    pub fn initial_params(&self) -> Theta {
        self.layout.initial_params()
    }

    /// Penalized NLL and latent rate at `theta`.
    ///
    /// # Errors
    /// Parameter accounting, missing covariates, or
    /// [`GLMError::EventIndexOutOfRange`].
    pub fn forward(&self, theta: ArrayView1<f64>, data: &SessionData) -> GLMResult<(f64, Array1<f64>)> {
        let latent = self.assembler.latent(theta, data)?;
        let nll = poisson_nll(data.licks.bins(), latent.view(), theta, self.options.l2)?;
        Ok((nll, latent))
    }

    /// Penalized NLL only.
    pub fn nll(&self, theta: ArrayView1<f64>, data: &SessionData) -> GLMResult<f64> {
        Ok(self.forward(theta, data)?.0)
    }

    /// Analytic gradient of [`nll`](Self::nll).
    pub fn nll_gradient(&self, theta: ArrayView1<f64>, data: &SessionData) -> GLMResult<Array1<f64>> {
        nll_gradient(&self.assembler, theta, data, self.options.l2)
    }

    /// Fitted linear filter of one channel; `None` if the channel is not in
    /// the layout.
    ///
    /// # Errors
    /// [`GLMError::ParamCountMismatch`] if `x` does not match the layout.
    pub fn linear_filter(&self, kind: ChannelKind, x: ArrayView1<f64>) -> GLMResult<Option<Array1<f64>>> {
        self.assembler.channel_filter(kind, x)
    }

    /// Fit by maximum likelihood from `theta0`.
    ///
    /// Non-convergence is not an error: the result carries
    /// `converged = false` and argmin's termination status.
    ///
    /// # Errors
    /// - Anything [`validate`](Self::validate) rejects, before optimizing.
    /// - Optimizer failures, as [`GLMError::OptimizationFailed`].
    pub fn fit(&self, theta0: Theta, data: &SessionData) -> GLMResult<FitResult> {
        self.validate(theta0.view(), data)?;
        log::info!("fitting model with {} params", self.n_params());
        let start = Instant::now();

        let outcome = maximize(self, theta0, data, &self.options.mle_opts)?;
        if !outcome.converged {
            log::warn!(
                "optimizer stopped without converging after {} iterations: {}",
                outcome.iterations,
                outcome.status
            );
        }
        let fit = evaluate(self, &outcome, data)?;

        log::info!(
            "fit finished in {:.2?}: status {}, nll {:.4}, bic {:.4}",
            start.elapsed(),
            fit.status(),
            fit.nll(),
            fit.bic()
        );
        Ok(fit)
    }

    /// [`fit`](Self::fit) from [`initial_params`](Self::initial_params).
    pub fn fit_default(&self, data: &SessionData) -> GLMResult<FitResult> {
        self.fit(self.initial_params(), data)
    }

    /// Check that `theta` and `data` can be evaluated by this model.
    ///
    /// # Errors
    /// - [`GLMError::GridMismatch`] if `data` lives on another grid.
    /// - [`GLMError::ParamCountMismatch`] / [`GLMError::NonFiniteParam`].
    /// - [`GLMError::MissingCovariate`] for an enabled covariate channel.
    /// - [`GLMError::EventIndexOutOfRange`] for a lick at or past
    ///   `stop_time`.
    ///
    /// An event channel whose train is empty in `data` (for example change
    /// flashes from a session without image codes) is only logged as a
    /// warning: the channel contributes nothing and its weights stay put.
    pub fn validate(&self, theta: ArrayView1<f64>, data: &SessionData) -> GLMResult<()> {
        let grid = self.grid();
        if data.grid != *grid {
            return Err(GLMError::GridMismatch {
                model: (grid.dt, grid.stop_time),
                data: (data.grid.dt, data.grid.stop_time),
            });
        }
        if theta.len() != self.n_params() {
            return Err(GLMError::ParamCountMismatch {
                expected: self.n_params(),
                actual: theta.len(),
            });
        }
        if let Some(index) = theta.iter().position(|v| !v.is_finite()) {
            return Err(GLMError::NonFiniteParam { index, value: theta[index] });
        }
        let covariates = [
            (ChannelKind::RunningSpeed, data.running_speed.is_some()),
            (ChannelKind::RunningAcceleration, data.running_acceleration.is_some()),
        ];
        for (kind, present) in covariates {
            if requires_covariate(&self.layout, kind) && !present {
                return Err(GLMError::MissingCovariate { channel: kind.name() });
            }
        }
        if let Some(&index) = data.licks.bins().iter().find(|&&b| b >= grid.stop_time) {
            return Err(GLMError::EventIndexOutOfRange { index, len: grid.stop_time });
        }
        let event_sources = [
            (ChannelKind::Reward, data.rewards.is_empty()),
            (ChannelKind::Flash, data.flashes.is_empty()),
            (ChannelKind::ChangeFlash, data.change_flashes.is_empty()),
        ];
        for (kind, empty) in event_sources {
            if empty && self.layout.contains(kind) {
                log::warn!("session has no '{}' events; its filter is unidentified", kind.name());
            }
        }
        Ok(())
    }
}

impl LogLikelihood for LickModel {
    type Data = SessionData;

    /// `ℓ(θ) = -NLL(θ)`.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        Ok(-self.nll(theta.view(), data)?)
    }

    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        Ok(self.validate(theta.view(), data)?)
    }

    /// `∇ℓ(θ) = -∇NLL(θ)`, exact.
    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        Ok(-self.nll_gradient(theta.view(), data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        glm::core::{
            channels::{Channel, FilterSpec, RunningSpeedFilter},
            grid::EventTrain,
        },
        optimization::errors::OptError,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn mean_only(stop_time: usize) -> (LickModel, TimeGrid) {
        let grid = TimeGrid::new(0.01, stop_time).unwrap();
        let layout = ChannelLayout::new(vec![Channel::MeanRate]).unwrap();
        (LickModel::new(layout, grid, GLMOptions::default()).unwrap(), grid)
    }

    #[test]
    // Purpose
    // -------
    // A mean-rate-only fit recovers the empirical rate.
    //
    // Given
    // -----
    // - stop_time = 1000, a single lick at bin 500, θ₀ = -0.5.
    //
    // Expect
    // ------
    // - Converged, exp(x) ≈ 1/1000 and every latent bin equal to it.
    fn mean_rate_fit_recovers_empirical_rate() {
        let (model, grid) = mean_only(1000);
        let data = SessionData::new(grid, EventTrain::new(vec![500]));

        let fit = model.fit(model.initial_params(), &data).unwrap();

        assert!(fit.converged(), "status: {}", fit.status());
        assert_abs_diff_eq!(fit.x()[0].exp(), 1e-3, epsilon = 1e-5);
        assert!(fit.latent().iter().all(|&l| (l - fit.x()[0].exp()).abs() < 1e-15));
        assert_abs_diff_eq!(fit.bic(), 1000f64.ln() + 2.0 * fit.nll(), epsilon = 1e-9);
    }

    #[test]
    fn value_and_grad_are_negated_nll() {
        let (model, grid) = mean_only(200);
        let data = SessionData::new(grid, EventTrain::new(vec![10, 20]));
        let theta = array![-2.0];

        let value = model.value(&theta, &data).unwrap();
        let grad = model.grad(&theta, &data).unwrap();

        let nll = -2.0 * -2.0 + 200.0 * (-2.0f64).exp();
        assert_abs_diff_eq!(value, -nll, epsilon = 1e-10);
        assert_abs_diff_eq!(grad[0], -(200.0 * (-2.0f64).exp() - 2.0), epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // `check` rejects what would otherwise fail deep inside argmin.
    fn check_rejects_bad_theta_and_data() {
        let (model, grid) = mean_only(100);
        let data = SessionData::new(grid, EventTrain::new(vec![3]));

        assert_eq!(
            model.check(&array![0.0, 1.0], &data),
            Err(OptError::ParamCountMismatch { expected: 1, actual: 2 })
        );
        assert!(matches!(model.check(&array![f64::NAN], &data), Err(OptError::ModelError { .. })));

        let off_grid = SessionData::new(grid, EventTrain::new(vec![3, 100]));
        assert_eq!(
            model.validate(array![0.0].view(), &off_grid),
            Err(GLMError::EventIndexOutOfRange { index: 100, len: 100 })
        );

        let other = SessionData::new(TimeGrid::new(0.02, 100).unwrap(), EventTrain::default());
        assert!(matches!(
            model.validate(array![0.0].view(), &other),
            Err(GLMError::GridMismatch { .. })
        ));
    }

    #[test]
    fn fit_reports_missing_covariate_before_optimizing() {
        let grid = TimeGrid::new(0.01, 100).unwrap();
        let layout = ChannelLayout::new(vec![
            Channel::MeanRate,
            Channel::RunningSpeed(RunningSpeedFilter::Raw { n_params: 3 }),
        ])
        .unwrap();
        let model = LickModel::new(layout, grid, GLMOptions::default()).unwrap();
        let data = SessionData::new(grid, EventTrain::new(vec![4]));

        assert_eq!(
            model.fit_default(&data),
            Err(GLMError::MissingCovariate { channel: "running_speed" })
        );
    }

    #[test]
    fn linear_filter_follows_layout() {
        let grid = TimeGrid::new(0.01, 100).unwrap();
        let layout = ChannelLayout::new(vec![
            Channel::MeanRate,
            Channel::PostLick(FilterSpec::new(2, 0.21, 0.025)),
        ])
        .unwrap();
        let model = LickModel::new(layout, grid, GLMOptions::default()).unwrap();
        let x = array![-4.0, 1.0, -1.0];

        assert_eq!(model.linear_filter(ChannelKind::MeanRate, x.view()).unwrap(), Some(array![-4.0]));
        assert_eq!(
            model.linear_filter(ChannelKind::PostLick, x.view()).unwrap().map(|f| f.len()),
            Some(20)
        );
        assert_eq!(model.linear_filter(ChannelKind::Reward, x.view()).unwrap(), None);
        assert!(matches!(
            model.linear_filter(ChannelKind::MeanRate, array![0.0].view()),
            Err(GLMError::ParamCountMismatch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A change-flash channel on a session without change flashes is allowed:
    // it adds nothing to the rate and its gradient is exactly zero.
    //
    // Given
    // -----
    // - Mean + change-flash (2 weights), 200 bins, flashes but no changes.
    //
    // Expect
    // ------
    // - `validate` succeeds.
    // - Rate equals exp(mean) everywhere; change-flash gradient is [0, 0].
    fn empty_change_flash_train_is_inert() {
        let grid = TimeGrid::new(0.01, 200).unwrap();
        let layout = ChannelLayout::new(vec![
            Channel::MeanRate,
            Channel::ChangeFlash(FilterSpec::new(2, 0.5, 0.1)),
        ])
        .unwrap();
        let model = LickModel::new(layout, grid, GLMOptions::default()).unwrap();
        let data = SessionData::new(grid, EventTrain::new(vec![20, 120]))
            .with_flashes(EventTrain::new(vec![10, 85, 160]));
        let theta = array![-3.0, 0.7, -0.4];

        assert_eq!(model.validate(theta.view(), &data), Ok(()));
        let (_, latent) = model.forward(theta.view(), &data).unwrap();
        assert!(latent.iter().all(|&l| l == (-3.0f64).exp()));
        let grad = model.nll_gradient(theta.view(), &data).unwrap();
        assert_eq!(grad[1], 0.0);
        assert_eq!(grad[2], 0.0);
    }
}
