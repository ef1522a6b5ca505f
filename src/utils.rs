//! Conversion helpers for the Python bindings.
//!
//! Everything here turns loosely typed Python arguments into validated Rust
//! configuration; numerical work stays in `glm`. Errors surface as `PyErr`
//! through the `GLMError` conversion.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    glm::{
        core::{
            channels::{Channel, ChannelKind, ChannelLayout},
            data::RawSession,
            options::GLMOptions,
        },
        errors::GLMError,
    },
    optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArrayMethods, PyReadonlyArray1};

/// Channels fitted when the caller names none.
pub const DEFAULT_CHANNELS: [&str; 2] = ["mean_rate", "post_lick"];

/// Accept a contiguous float64 ndarray, anything with `to_numpy()`, or a
/// plain sequence of floats.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Owned copy of a float array argument; `None` becomes empty.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_vec<'py>(
    py: Python<'py>, name: &str, raw: Option<&Bound<'py, PyAny>>,
) -> PyResult<Vec<f64>> {
    let Some(raw) = raw else { return Ok(Vec::new()) };
    let arr = extract_f64_array(py, raw)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array or sequence"))
    })?;
    Ok(slice.to_vec())
}

#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
pub fn extract_raw_session<'py>(
    py: Python<'py>, licks: &Bound<'py, PyAny>, running_timestamps: &Bound<'py, PyAny>,
    running_speed: &Bound<'py, PyAny>, rewards: Option<&Bound<'py, PyAny>>,
    flashes: Option<&Bound<'py, PyAny>>, stim_ids: Option<Vec<i64>>,
) -> PyResult<RawSession> {
    Ok(RawSession {
        licks: extract_f64_vec(py, "licks", Some(licks))?,
        running_timestamps: extract_f64_vec(py, "running_timestamps", Some(running_timestamps))?,
        running_speed: extract_f64_vec(py, "running_speed", Some(running_speed))?,
        rewards: extract_f64_vec(py, "rewards", rewards)?,
        flashes: extract_f64_vec(py, "flashes", flashes)?,
        stim_ids: stim_ids.unwrap_or_default(),
    })
}

/// Stock-configured channels from their names (`"post_lick"`, `"reward"`, ...).
#[cfg(feature = "python-bindings")]
pub fn build_layout(channels: Option<Vec<String>>) -> PyResult<ChannelLayout> {
    let names = channels
        .unwrap_or_else(|| DEFAULT_CHANNELS.iter().map(|s| s.to_string()).collect());
    let channels = names
        .iter()
        .map(|name| {
            name.parse::<ChannelKind>()
                .map(Channel::default_for)
                .map_err(PyValueError::new_err)
        })
        .collect::<PyResult<Vec<_>>>()?;
    Ok(ChannelLayout::new(channels)?)
}

#[cfg(feature = "python-bindings")]
pub fn extract_glm_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, l2: f64,
) -> PyResult<GLMOptions> {
    use std::str::FromStr;

    let defaults = MLEOptions::default();
    let tols = Tolerances::new(
        tol_grad.or(defaults.tols.tol_grad),
        tol_cost,
        max_iter.or(defaults.tols.max_iter),
    )
    .map_err(GLMError::from)?;
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(GLMError::from)?,
        None => LineSearcher::MoreThuente,
    };
    let mle_opts = MLEOptions::new(tols, ls, lbfgs_mem).map_err(GLMError::from)?;

    Ok(GLMOptions::new(mle_opts, l2)?)
}
