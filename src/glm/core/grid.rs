//! Discrete time grid and event trains.
//!
//! Purpose
//! -------
//! Map continuous session timestamps (seconds) onto the fixed-width bins the
//! GLM works in, and carry the resulting bin indices around as an immutable
//! [`EventTrain`].
//!
//! Key behaviors
//! -------------
//! - [`discretize`] rounds `t / dt` to the nearest bin, ties to even. No
//!   sorting, no deduplication, no validation.
//! - [`TimeGrid`] validates `dt` and `stop_time` once so the rest of the
//!   model can assume a usable grid.
//! - [`resample_covariate`] puts a continuously sampled covariate (running
//!   speed) onto the bin times `t · dt` by linear interpolation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Valid bin indices are `[0, stop_time)`. Event trains may contain
//!   indices outside that range; composers clip them and the likelihood
//!   rejects them.
//! - Negative or NaN timestamps are not checked: the float-to-integer cast
//!   saturates them to bin 0.
use crate::glm::errors::{GLMError, GLMResult};
use ndarray::Array1;

/// Bin width and session length in bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    /// Bin width in seconds.
    pub dt: f64,
    /// Number of bins.
    pub stop_time: usize,
}

impl TimeGrid {
    /// # Errors
    /// - [`GLMError::InvalidDt`] unless `dt` is finite and > 0.
    /// - [`GLMError::InvalidStopTime`] if `stop_time == 0`.
    pub fn new(dt: f64, stop_time: usize) -> GLMResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(GLMError::InvalidDt { dt });
        }
        if stop_time == 0 {
            return Err(GLMError::InvalidStopTime { stop_time });
        }
        Ok(Self { dt, stop_time })
    }

    /// Bin index of a single timestamp.
    pub fn bin_of(&self, time: f64) -> usize {
        to_bin(time, self.dt)
    }

    /// Left edge of every bin, `t · dt` for `t ∈ [0, stop_time)`.
    pub fn bin_times(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.stop_time, |t| t as f64 * self.dt)
    }
}

/// Bin indices of one event type. Order and multiplicity are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventTrain {
    bins: Vec<usize>,
}

impl EventTrain {
    pub fn new(bins: Vec<usize>) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Events that fall on the grid, i.e. bin `< stop_time`.
    pub fn within(&self, stop_time: usize) -> Self {
        Self { bins: self.bins.iter().copied().filter(|&b| b < stop_time).collect() }
    }

    /// Per-bin event counts over `[0, stop_time)`; off-grid events are ignored.
    pub fn counts(&self, stop_time: usize) -> Array1<f64> {
        let mut counts = Array1::zeros(stop_time);
        for &b in self.bins.iter().filter(|&&b| b < stop_time) {
            counts[b] += 1.0;
        }
        counts
    }
}

impl From<Vec<usize>> for EventTrain {
    fn from(bins: Vec<usize>) -> Self {
        Self::new(bins)
    }
}

/// `round(t / dt)` for every timestamp.
pub fn discretize(times: &[f64], dt: f64) -> EventTrain {
    EventTrain::new(times.iter().map(|&t| to_bin(t, dt)).collect())
}

/// Linearly interpolate `(timestamps, values)` onto the grid's bin times.
///
/// Bin times before the first sample take the first value; bin times after
/// the last sample take the last value.
///
/// # Errors
/// - [`GLMError::EmptySeries`] / [`GLMError::LengthMismatch`] on malformed
///   input.
/// - [`GLMError::NonFiniteData`] for NaN/±inf in either series.
/// - [`GLMError::UnsortedTimestamps`] when timestamps decrease.
pub fn resample_covariate(
    name: &'static str, timestamps: &[f64], values: &[f64], grid: &TimeGrid,
) -> GLMResult<Array1<f64>> {
    if timestamps.is_empty() {
        return Err(GLMError::EmptySeries { name });
    }
    if values.len() != timestamps.len() {
        return Err(GLMError::LengthMismatch {
            name,
            expected: timestamps.len(),
            actual: values.len(),
        });
    }
    check_finite(name, timestamps)?;
    check_finite(name, values)?;
    if let Some(i) = timestamps.windows(2).position(|w| w[1] < w[0]) {
        return Err(GLMError::UnsortedTimestamps { name, index: i + 1 });
    }

    let last = timestamps.len() - 1;
    let mut right = 0;
    Ok(grid.bin_times().mapv(|t| {
        if t <= timestamps[0] {
            return values[0];
        }
        if t >= timestamps[last] {
            return values[last];
        }
        // Bin times are increasing, so the bracket only moves forward.
        while timestamps[right] < t {
            right += 1;
        }
        let left = right - 1;
        let w = (t - timestamps[left]) / (timestamps[right] - timestamps[left]);
        values[left] + w * (values[right] - values[left])
    }))
}

fn to_bin(time: f64, dt: f64) -> usize {
    (time / dt).round_ties_even() as usize
}

fn check_finite(name: &'static str, xs: &[f64]) -> GLMResult<()> {
    match xs.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(GLMError::NonFiniteData { name, index, value: xs[index] }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    // Purpose
    // -------
    // Timestamps built as exact multiples of `dt` land on their intended
    // bins, with no off-by-one drift from float division.
    //
    // Given
    // -----
    // - dt = 0.01 and times k · dt for k in 0..5000 (stepped).
    //
    // Expect
    // ------
    // - `discretize` returns k for every k.
    fn exact_multiples_round_trip() {
        let dt = 0.01;
        let ks: Vec<usize> = (0..5000).step_by(7).collect();
        let times: Vec<f64> = ks.iter().map(|&k| k as f64 * dt).collect();

        let train = discretize(&times, dt);

        assert_eq!(train.bins(), ks.as_slice());
    }

    #[test]
    fn discretize_keeps_order_and_duplicates() {
        let train = discretize(&[0.5, 0.1, 0.1, 0.26], 0.1);

        assert_eq!(train.bins(), &[5, 1, 1, 3]);
    }

    #[test]
    // Purpose
    // -------
    // Garbage timestamps are not validated; the saturating cast sends them to
    // bin 0.
    fn negative_and_nan_times_saturate_to_zero() {
        let train = discretize(&[-3.0, f64::NAN], 0.01);

        assert_eq!(train.bins(), &[0, 0]);
    }

    #[test]
    fn time_grid_validates_inputs() {
        assert!(TimeGrid::new(0.01, 100).is_ok());
        assert_eq!(TimeGrid::new(0.0, 100), Err(GLMError::InvalidDt { dt: 0.0 }));
        assert!(matches!(TimeGrid::new(f64::NAN, 100), Err(GLMError::InvalidDt { .. })));
        assert_eq!(TimeGrid::new(0.01, 0), Err(GLMError::InvalidStopTime { stop_time: 0 }));
    }

    #[test]
    fn counts_and_within_ignore_off_grid_events() {
        let train = EventTrain::new(vec![2, 2, 4, 9]);

        assert_eq!(train.within(5).bins(), &[2, 2, 4]);
        assert_eq!(train.counts(5).to_vec(), vec![0.0, 0.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Resampling interpolates between samples and holds the edge values
    // outside the sampled range.
    //
    // Given
    // -----
    // - Samples (0.15, 1.0), (0.35, 3.0) on a grid with dt = 0.1, 5 bins.
    //
    // Expect
    // ------
    // - Bin times 0.0 and 0.1 hold 1.0; 0.2 → 1.5; 0.3 → 2.5; 0.4 holds 3.0.
    fn resample_interpolates_and_holds_edges() {
        let grid = TimeGrid::new(0.1, 5).unwrap();

        let out = resample_covariate("running", &[0.15, 0.35], &[1.0, 3.0], &grid).unwrap();

        let expected = [1.0, 1.0, 1.5, 2.5, 3.0];
        for (got, want) in out.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn resample_rejects_malformed_input() {
        let grid = TimeGrid::new(0.1, 5).unwrap();

        assert_eq!(
            resample_covariate("running", &[], &[], &grid),
            Err(GLMError::EmptySeries { name: "running" })
        );
        assert!(matches!(
            resample_covariate("running", &[0.0, 1.0], &[1.0], &grid),
            Err(GLMError::LengthMismatch { .. })
        ));
        assert_eq!(
            resample_covariate("running", &[0.0, 0.5, 0.2], &[1.0, 2.0, 3.0], &grid),
            Err(GLMError::UnsortedTimestamps { name: "running", index: 2 })
        );
        assert!(matches!(
            resample_covariate("running", &[0.0, 1.0], &[1.0, f64::INFINITY], &grid),
            Err(GLMError::NonFiniteData { index: 1, .. })
        ));
    }
}
