//! Event-triggered responses and causal convolutions.
//!
//! Every channel turns its filter into a per-bin contribution to the linear
//! predictor through one of two causal operators:
//!
//! - event channels (licks, rewards, flashes, change flashes): a copy of the
//!   filter starts one bin after each event, `out[i+1+k] += f[k]`;
//! - covariate channels (running speed, running acceleration): the covariate
//!   is convolved with the filter and shifted one bin forward,
//!   `out[t] = Σ_k f[k] · s[t-1-k]`.
//!
//! Both are clipped at `stop_time` and never touch the event's own bin. The
//! `*_lag_sums` functions are the transposes of these operators; the
//! likelihood gradient uses them to correlate the residual with each
//! channel's input.
use ndarray::{Array1, ArrayView1, ArrayViewMut1};

/// Accumulate `filter` after every event into `out` (length = `stop_time`).
///
/// Duplicated events add up. Events at or beyond `out.len() - 1` contribute
/// nothing.
pub fn add_event_response(mut out: ArrayViewMut1<f64>, events: &[usize], filter: ArrayView1<f64>) {
    let stop_time = out.len();
    for &event in events {
        let start = event.saturating_add(1);
        if start >= stop_time {
            continue;
        }
        let end = stop_time.min(start + filter.len());
        for (slot, &f) in out.slice_mut(ndarray::s![start..end]).iter_mut().zip(filter.iter()) {
            *slot += f;
        }
    }
}

/// Event-triggered response over `[0, stop_time)`.
pub fn compose_event_response(
    events: &[usize], filter: ArrayView1<f64>, stop_time: usize,
) -> Array1<f64> {
    let mut out = Array1::zeros(stop_time);
    add_event_response(out.view_mut(), events, filter);
    out
}

/// Accumulate the one-bin-shifted convolution of `covariate` with `filter`.
///
/// Covariate samples past the end of `covariate` count as zero.
pub fn add_causal_convolution(
    mut out: ArrayViewMut1<f64>, covariate: ArrayView1<f64>, filter: ArrayView1<f64>,
) {
    for t in 1..out.len() {
        // s[t-1-k] for k = 0..min(L, t)
        let taps = filter.len().min(t);
        let mut acc = 0.0;
        for k in 0..taps {
            if let Some(&s) = covariate.get(t - 1 - k) {
                acc += filter[k] * s;
            }
        }
        out[t] += acc;
    }
}

/// `out[t] = Σ_k filter[k] · covariate[t-1-k]` over `[0, stop_time)`.
///
/// Equivalent to a full convolution truncated to `stop_time`, shifted one
/// bin later (leading zero, last value dropped).
pub fn compose_causal_convolution(
    covariate: ArrayView1<f64>, filter: ArrayView1<f64>, stop_time: usize,
) -> Array1<f64> {
    let mut out = Array1::zeros(stop_time);
    add_causal_convolution(out.view_mut(), covariate, filter);
    out
}

/// Transpose of [`add_event_response`]: `G[k] = Σ_e resid[e+1+k]`.
pub fn event_lag_sums(events: &[usize], resid: ArrayView1<f64>, len: usize) -> Array1<f64> {
    let stop_time = resid.len();
    let mut sums = Array1::zeros(len);
    for &event in events {
        let start = event.saturating_add(1);
        if start >= stop_time {
            continue;
        }
        let end = stop_time.min(start + len);
        for (k, t) in (start..end).enumerate() {
            sums[k] += resid[t];
        }
    }
    sums
}

/// Transpose of [`add_causal_convolution`]: `G[k] = Σ_t resid[t] · covariate[t-1-k]`.
pub fn covariate_lag_sums(
    covariate: ArrayView1<f64>, resid: ArrayView1<f64>, len: usize,
) -> Array1<f64> {
    let mut sums = Array1::zeros(len);
    for t in 1..resid.len() {
        let r = resid[t];
        if r == 0.0 {
            continue;
        }
        for k in 0..len.min(t) {
            if let Some(&s) = covariate.get(t - 1 - k) {
                sums[k] += r * s;
            }
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // A single event never influences its own bin or anything before it;
    // the response starts exactly one bin later.
    //
    // Given
    // -----
    // - Event at bin 4, a strictly nonzero filter of length 3, stop_time 12.
    //
    // Expect
    // ------
    // - Bins 0..=4 are zero, bins 5..8 hold the filter, the rest is zero.
    fn event_response_is_causal() {
        let filter = array![1.5, -0.5, 2.0];

        let out = compose_event_response(&[4], filter.view(), 12);

        assert!(out.slice(ndarray::s![..5]).iter().all(|&v| v == 0.0));
        assert_eq!(out.slice(ndarray::s![5..8]), filter);
        assert!(out.slice(ndarray::s![8..]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn event_response_accumulates_duplicates_and_clips() {
        let filter = array![1.0, 2.0, 3.0];

        let out = compose_event_response(&[2, 2, 5, 6, 40], filter.view(), 8);

        // 2,2 -> bins 3..6 doubled; 5 -> bins 6,7; 6 -> bin 7; 40 off-grid.
        assert_eq!(out.to_vec(), vec![0.0, 0.0, 0.0, 2.0, 4.0, 6.0, 1.0, 3.0]);
    }

    #[test]
    fn huge_event_index_is_ignored() {
        let out = compose_event_response(&[usize::MAX], array![1.0].view(), 4);

        assert_eq!(out, Array1::<f64>::zeros(4));
    }

    #[test]
    // Purpose
    // -------
    // The causal convolution equals a full convolution with one leading zero
    // and the last value dropped.
    //
    // Given
    // -----
    // - s = [1, 2, 3, 4], f = [1, 10], stop_time = 4.
    //
    // Expect
    // ------
    // - full conv = [1, 12, 23, 34, 40]; truncated [1, 12, 23, 34];
    //   shifted [0, 1, 12, 23].
    fn causal_convolution_shifts_full_convolution() {
        let s = array![1.0, 2.0, 3.0, 4.0];
        let f = array![1.0, 10.0];

        let out = compose_causal_convolution(s.view(), f.view(), 4);

        assert_eq!(out.to_vec(), vec![0.0, 1.0, 12.0, 23.0]);
    }

    #[test]
    // Purpose
    // -------
    // The lag sums are the transposes of the two composers:
    // `<compose(f), r> == <f, lag_sums(r)>`.
    fn lag_sums_are_adjoint_to_composers() {
        let stop_time = 30;
        let f = Array1::from_shape_fn(5, |k| 0.3 * k as f64 - 0.4);
        let r = Array1::from_shape_fn(stop_time, |t| ((t * 7 % 11) as f64 - 5.0) / 3.0);
        let events = [0, 3, 3, 17, 27, 29];
        let s = Array1::from_shape_fn(stop_time, |t| (t as f64 * 0.37).cos());

        let ev = compose_event_response(&events, f.view(), stop_time);
        assert_abs_diff_eq!(
            ev.dot(&r),
            f.dot(&event_lag_sums(&events, r.view(), f.len())),
            epsilon = 1e-10
        );

        let cv = compose_causal_convolution(s.view(), f.view(), stop_time);
        assert_abs_diff_eq!(
            cv.dot(&r),
            f.dot(&covariate_lag_sums(s.view(), r.view(), f.len())),
            epsilon = 1e-10
        );
    }
}
