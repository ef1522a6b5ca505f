//! Session data on the model's time grid.
//!
//! Purpose
//! -------
//! Hold everything a likelihood evaluation reads (lick bins plus the inputs
//! of every channel) for one session, already discretized onto a
//! [`TimeGrid`], and build it from raw timestamps.
//!
//! Key behaviors
//! -------------
//! - [`SessionData::new`] plus the `with_*` builders assemble data that was
//!   discretized elsewhere.
//! - [`SessionData::from_raw`] does the whole preparation from a
//!   [`RawSession`]: grid from the last running sample, lick filtering,
//!   event discretization, change-flash extraction, running-speed
//!   resampling and running acceleration.
//! - [`extract_change_flashes`] and [`running_acceleration`] are exposed on
//!   their own for callers that prepare covariates piecemeal.
//!
//! Invariants & assumptions
//! ------------------------
//! - Continuous covariates have exactly `stop_time` samples.
//! - Lick bins are *not* range-checked here; an off-grid lick is reported by
//!   the likelihood as `EventIndexOutOfRange`. `from_raw` drops licks past
//!   the end of the session before that can happen.
//! - Timestamps are in seconds on the session clock; no alignment to the
//!   first running sample is applied.
use crate::glm::{
    core::grid::{EventTrain, TimeGrid, discretize, resample_covariate},
    errors::{GLMError, GLMResult},
};
use ndarray::Array1;

/// Stimulus code of an omitted flash.
pub const OMITTED_FLASH_ID: i64 = 8;

// Omitted flashes are recoded far away from real image ids so that a jump
// into or out of an omission is not mistaken for an image change.
const OMITTED_RECODE: i64 = 100;
const OMISSION_JUMP: i64 = 50;

// Window of the centered running mean used before differencing speed.
const SMOOTHING_WINDOW: usize = 5;

/// Raw per-session timestamps (seconds) and codes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSession {
    pub licks: Vec<f64>,
    pub running_timestamps: Vec<f64>,
    pub running_speed: Vec<f64>,
    pub rewards: Vec<f64>,
    /// Onset of every stimulus flash.
    pub flashes: Vec<f64>,
    /// Image identity per flash, parallel to `flashes`, or empty when the
    /// session has no image codes.
    pub stim_ids: Vec<i64>,
}

/// Discretized inputs of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub grid: TimeGrid,
    pub licks: EventTrain,
    pub rewards: EventTrain,
    pub flashes: EventTrain,
    pub change_flashes: EventTrain,
    pub running_speed: Option<Array1<f64>>,
    pub running_acceleration: Option<Array1<f64>>,
}

impl SessionData {
    /// Licks only; every other input empty.
    pub fn new(grid: TimeGrid, licks: EventTrain) -> Self {
        Self {
            grid,
            licks,
            rewards: EventTrain::default(),
            flashes: EventTrain::default(),
            change_flashes: EventTrain::default(),
            running_speed: None,
            running_acceleration: None,
        }
    }

    pub fn with_rewards(mut self, rewards: EventTrain) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_flashes(mut self, flashes: EventTrain) -> Self {
        self.flashes = flashes;
        self
    }

    pub fn with_change_flashes(mut self, change_flashes: EventTrain) -> Self {
        self.change_flashes = change_flashes;
        self
    }

    /// # Errors
    /// [`GLMError::LengthMismatch`] or [`GLMError::NonFiniteData`].
    pub fn with_running_speed(mut self, speed: Array1<f64>) -> GLMResult<Self> {
        check_covariate("running_speed", &speed, self.grid.stop_time)?;
        self.running_speed = Some(speed);
        Ok(self)
    }

    /// # Errors
    /// [`GLMError::LengthMismatch`] or [`GLMError::NonFiniteData`].
    pub fn with_running_acceleration(mut self, acceleration: Array1<f64>) -> GLMResult<Self> {
        check_covariate("running_acceleration", &acceleration, self.grid.stop_time)?;
        self.running_acceleration = Some(acceleration);
        Ok(self)
    }

    /// Prepare a session from raw timestamps.
    ///
    /// - `stop_time = round(last running timestamp / dt)`.
    /// - Licks falling at or after `stop_time` are dropped.
    /// - Rewards and flashes are discretized as-is (composers clip them).
    /// - Change flashes come from [`extract_change_flashes`].
    /// - Running speed is interpolated onto bin times; acceleration is
    ///   derived from the interpolated speed.
    ///
    /// # Errors
    /// - [`GLMError::EmptySeries`] without running samples.
    /// - Grid, resampling and stimulus-code errors.
    pub fn from_raw(raw: &RawSession, dt: f64) -> GLMResult<Self> {
        let last = raw
            .running_timestamps
            .last()
            .copied()
            .ok_or(GLMError::EmptySeries { name: "running_timestamps" })?;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(GLMError::InvalidDt { dt });
        }
        let grid = TimeGrid::new(dt, grid_len(last, dt))?;

        let licks = discretize(&raw.licks, dt).within(grid.stop_time);
        let change_times = extract_change_flashes(&raw.flashes, &raw.stim_ids)?;
        let speed =
            resample_covariate("running_speed", &raw.running_timestamps, &raw.running_speed, &grid)?;
        let acceleration = running_acceleration(&speed);

        log::debug!(
            "session prepared: {} bins, {} licks, {} rewards, {} flashes, {} changes",
            grid.stop_time,
            licks.len(),
            raw.rewards.len(),
            raw.flashes.len(),
            change_times.len()
        );

        Ok(Self {
            grid,
            licks,
            rewards: discretize(&raw.rewards, dt),
            flashes: discretize(&raw.flashes, dt),
            change_flashes: discretize(&change_times, dt),
            running_speed: Some(speed),
            running_acceleration: Some(acceleration),
        })
    }

    pub fn stop_time(&self) -> usize {
        self.grid.stop_time
    }
}

/// Onset times of flashes whose image differs from the previous flash.
///
/// Omitted flashes ([`OMITTED_FLASH_ID`]) never count: neither the omission
/// itself nor the return to the same image afterwards is a change. The first
/// flash is never a change.
///
/// Without image codes (`stim_ids` empty) there is nothing to compare and
/// the result is empty.
///
/// # Errors
/// [`GLMError::LengthMismatch`] if non-empty `stim_ids` is not parallel to
/// `flashes`.
pub fn extract_change_flashes(flashes: &[f64], stim_ids: &[i64]) -> GLMResult<Vec<f64>> {
    if stim_ids.is_empty() {
        return Ok(Vec::new());
    }
    if stim_ids.len() != flashes.len() {
        return Err(GLMError::LengthMismatch {
            name: "stim_ids",
            expected: flashes.len(),
            actual: stim_ids.len(),
        });
    }
    let recoded: Vec<i64> = stim_ids
        .iter()
        .map(|&id| if id == OMITTED_FLASH_ID { OMITTED_RECODE } else { id })
        .collect();
    Ok(recoded
        .windows(2)
        .zip(flashes.iter().skip(1))
        .filter(|(pair, _)| {
            let jump = pair[1] - pair[0];
            jump != 0 && jump.abs() <= OMISSION_JUMP
        })
        .map(|(_, &t)| t)
        .collect())
}

/// First difference of the smoothed running speed, with a leading 0.
///
/// Smoothing is a centered 5-sample running mean; the two samples at each
/// edge are left unsmoothed. Series shorter than the window are differenced
/// without smoothing.
pub fn running_acceleration(speed: &Array1<f64>) -> Array1<f64> {
    let n = speed.len();
    let half = SMOOTHING_WINDOW / 2;
    let mut smooth = speed.clone();
    if n >= SMOOTHING_WINDOW {
        for i in half..n - half {
            smooth[i] =
                speed.slice(ndarray::s![i - half..=i + half]).sum() / SMOOTHING_WINDOW as f64;
        }
    }
    Array1::from_shape_fn(n, |i| if i == 0 { 0.0 } else { smooth[i] - smooth[i - 1] })
}

fn grid_len(last_time: f64, dt: f64) -> usize {
    (last_time / dt).round_ties_even() as usize
}

fn check_covariate(name: &'static str, values: &Array1<f64>, stop_time: usize) -> GLMResult<()> {
    if values.len() != stop_time {
        return Err(GLMError::LengthMismatch { name, expected: stop_time, actual: values.len() });
    }
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(GLMError::NonFiniteData { name, index, value: values[index] }),
        None => Ok(()),
    }
}
