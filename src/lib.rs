//! lick_glm — point-process GLMs of licking behavior with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and, with the `python-bindings`
//! feature, as the PyO3 bridge exposing the licking model to Python through
//! the `_lick_glm` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the three layers of the crate: `glm` (data, filters,
//!   likelihood, models), `optimization` (argmin-backed maximizer and
//!   numerical guards) and `inference` (standard errors).
//! - Define the `LickingModel` `#[pyclass]` and the `#[pymodule]`
//!   initializer.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file only converts
//!   arguments, holds state for Python, and maps errors.
//! - A `LickingModel` prepares its session once at construction; every fit
//!   reuses that `SessionData`.
//!
//! Conventions
//! -----------
//! - Python-facing names follow the channel names used in Rust
//!   (`"mean_rate"`, `"post_lick"`, `"running_speed"`, `"reward"`,
//!   `"flash"`, `"change_flash"`, `"running_acceleration"`).
//! - `GLMError` values are raised as `ValueError`.
//!
//! Downstream usage
//! ----------------
//! - Rust callers use `glm::models::LickModel` directly and can ignore the
//!   feature-gated items here.
//! - Python callers import `_lick_glm.models.LickingModel`.

pub mod glm;
pub mod inference;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    glm::{
        core::{channels::ChannelKind, data::SessionData},
        models::{FitResult, LickModel},
    },
    utils::{build_layout, extract_f64_vec, extract_glm_opts, extract_raw_session},
};

/// LickingModel — Python-facing licking GLM bound to one session.
///
/// Purpose
/// -------
/// Let Python callers build a session from raw timestamp arrays, fit a
/// chosen set of channels and read back the fitted quantities.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `LickingModel(licks, running_timestamps, running_speed, rewards=None,
/// flashes=None, stim_ids=None, dt=0.01, channels=None, l2=0.0, ...)`:
/// - `channels`: list of channel names; defaults to mean rate + post-lick.
/// - `tol_grad`, `tol_cost`, `max_iter`, `line_searcher`, `lbfgs_mem`:
///   optimizer settings, defaulting to `MLEOptions::default()`.
///
/// Fields
/// ------
/// - `model`: immutable [`LickModel`] on the session's grid.
/// - `data`: the prepared [`SessionData`].
/// - `result`: the last [`FitResult`], if any.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "lick_glm.models")]
pub struct LickingModel {
    model: LickModel,
    data: SessionData,
    result: Option<FitResult>,
}

#[cfg(feature = "python-bindings")]
impl LickingModel {
    fn fitted(&self) -> PyResult<&FitResult> {
        self.result
            .as_ref()
            .ok_or_else(|| PyValueError::new_err("model has not been fitted; call fit() first"))
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl LickingModel {
    #[new]
    #[pyo3(
        signature = (
            licks,
            running_timestamps,
            running_speed,
            rewards = None,
            flashes = None,
            stim_ids = None,
            dt = 0.01,
            channels = None,
            l2 = 0.0,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
        ),
        text_signature = "(licks, running_timestamps, running_speed, /, rewards=None, \
                          flashes=None, stim_ids=None, dt=0.01, channels=None, l2=0.0, \
                          tol_grad=None, tol_cost=None, max_iter=None, line_searcher=None, \
                          lbfgs_mem=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new<'py>(
        py: Python<'py>, licks: &Bound<'py, PyAny>, running_timestamps: &Bound<'py, PyAny>,
        running_speed: &Bound<'py, PyAny>, rewards: Option<&Bound<'py, PyAny>>,
        flashes: Option<&Bound<'py, PyAny>>, stim_ids: Option<Vec<i64>>, dt: f64,
        channels: Option<Vec<String>>, l2: f64, tol_grad: Option<f64>, tol_cost: Option<f64>,
        max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
    ) -> PyResult<Self> {
        let raw = extract_raw_session(
            py,
            licks,
            running_timestamps,
            running_speed,
            rewards,
            flashes,
            stim_ids,
        )?;
        let data = SessionData::from_raw(&raw, dt)?;
        let layout = build_layout(channels)?;
        let options = extract_glm_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem, l2)?;
        let model = LickModel::new(layout, data.grid, options)?;
        Ok(LickingModel { model, data, result: None })
    }

    /// Fit from `theta0`, or from the default start when omitted.
    #[pyo3(signature = (theta0 = None), text_signature = "(theta0=None)")]
    pub fn fit<'py>(&mut self, py: Python<'py>, theta0: Option<&Bound<'py, PyAny>>) -> PyResult<()> {
        let theta0 = match theta0 {
            Some(raw) => extract_f64_vec(py, "theta0", Some(raw))?.into(),
            None => self.model.initial_params(),
        };
        let (model, data) = (&self.model, &self.data);
        let fit = py.allow_threads(|| model.fit(theta0, data))?;
        self.result = Some(fit);
        Ok(())
    }

    #[getter]
    pub fn n_params(&self) -> usize {
        self.model.n_params()
    }

    #[getter]
    pub fn stop_time(&self) -> usize {
        self.data.stop_time()
    }

    #[getter]
    pub fn x(&self) -> PyResult<Vec<f64>> {
        Ok(self.fitted()?.x().to_vec())
    }

    #[getter]
    pub fn nll(&self) -> PyResult<f64> {
        Ok(self.fitted()?.nll())
    }

    #[getter]
    pub fn bic(&self) -> PyResult<f64> {
        Ok(self.fitted()?.bic())
    }

    #[getter]
    pub fn latent(&self) -> PyResult<Vec<f64>> {
        Ok(self.fitted()?.latent().to_vec())
    }

    #[getter]
    pub fn converged(&self) -> PyResult<bool> {
        Ok(self.fitted()?.converged())
    }

    #[getter]
    pub fn status(&self) -> PyResult<String> {
        Ok(self.fitted()?.status().to_string())
    }

    /// Fitted filter of one channel, or `None` if it is not in the model.
    pub fn linear_filter(&self, channel: &str) -> PyResult<Option<Vec<f64>>> {
        let kind = channel.parse::<ChannelKind>().map_err(PyValueError::new_err)?;
        let fit = self.fitted()?;
        Ok(self.model.linear_filter(kind, fit.x().view())?.map(|f| f.to_vec()))
    }

    /// Classical standard errors of `x`.
    pub fn standard_errors(&self) -> PyResult<Vec<f64>> {
        let fit = self.fitted()?;
        Ok(fit.standard_errors(&self.model, &self.data)?.to_vec())
    }
}

/// _lick_glm — PyO3 module initializer.
///
/// Registers the `models` submodule and makes it importable by dotted path.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _lick_glm<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let models_mod = PyModule::new(py, "models")?;
    models_mod.add_class::<LickingModel>()?;
    m.add_submodule(&models_mod)?;

    py.import("sys")?.getattr("modules")?.set_item("lick_glm.models", models_mod)?;
    Ok(())
}
