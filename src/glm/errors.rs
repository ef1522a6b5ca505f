//! Errors for the licking GLM (data preparation, filter configuration,
//! parameter accounting, likelihood indexing, model comparison).
//!
//! [`GLMError`] is the model-side counterpart of
//! [`OptError`](crate::optimization::errors::OptError). Conversions run both
//! ways: a GLM error raised inside a likelihood evaluation becomes an
//! `OptError` so it can travel through argmin, and optimizer errors coming
//! back out of a fit become `GLMError` for callers that work at the model
//! level.
//!
//! ## Conventions
//! - Bin indices and parameter positions are 0-based.
//! - Configuration errors are fatal and raised before any numerical work.
//! - Zero rates and predictor overflow are *not* errors; they are absorbed by
//!   the numerical guards in `optimization::numerical_stability`.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::optimization::errors::OptError;

/// Result alias for GLM operations.
pub type GLMResult<T> = Result<T, GLMError>;

#[derive(Debug, Clone, PartialEq)]
pub enum GLMError {
    // ---- Session data ----
    /// A required input series is empty.
    EmptySeries { name: &'static str },

    /// A timestamp or covariate value is NaN/±inf.
    NonFiniteData { name: &'static str, index: usize, value: f64 },

    /// Two series that must be parallel have different lengths.
    LengthMismatch { name: &'static str, expected: usize, actual: usize },

    /// Covariate timestamps must be non-decreasing for interpolation.
    UnsortedTimestamps { name: &'static str, index: usize },

    /// Bin width must be finite and > 0.
    InvalidDt { dt: f64 },

    /// The session must cover at least one bin.
    InvalidStopTime { stop_time: usize },

    // ---- Filter configuration ----
    /// A basis channel needs at least one parameter.
    InvalidParamCount { channel: &'static str },

    /// Filter duration must be finite and > 0.
    InvalidDuration { channel: &'static str, duration: f64 },

    /// Bump width must be finite and > 0.
    InvalidSigma { sigma: f64 },

    /// `build_filter` was called with no weights.
    EmptyBasis,

    /// The `[dt, duration)` window holds no grid points.
    EmptyFilter { duration: f64, dt: f64 },

    /// `build_filter` was called with no evaluation points.
    EmptyTimeVector,

    // ---- Channel layout ----
    /// The same channel kind appears twice in one layout.
    DuplicateChannel { channel: &'static str },

    /// A layout must contain at least one channel.
    EmptyLayout,

    // ---- Parameter accounting ----
    /// Parameters left over (or missing) after every channel consumed its block.
    ParamCountMismatch { expected: usize, actual: usize },

    /// A channel's parameter slice is shorter than its declared count.
    ParamMisalignment { channel: &'static str, expected: usize, found: usize },

    /// A parameter is NaN/±inf.
    NonFiniteParam { index: usize, value: f64 },

    // ---- Likelihood ----
    /// A lick bin indexes past the end of the latent rate.
    EventIndexOutOfRange { index: usize, len: usize },

    /// L2 coefficient must be finite and ≥ 0.
    InvalidL2 { l2: f64 },

    // ---- Model / data pairing ----
    /// Data prepared on a different grid than the model.
    GridMismatch { model: (f64, usize), data: (f64, usize) },

    /// A covariate channel is enabled but the session has no such series.
    MissingCovariate { channel: &'static str },

    // ---- Comparison ----
    /// The restricted model is not nested in the full one.
    NotNested { restricted: usize, full: usize },

    /// Chi-squared reference distribution could not be built.
    InvalidDegreesOfFreedom { df: f64, text: String },

    // ---- Estimation ----
    /// The optimizer failed with a non-model error.
    OptimizationFailed { status: String },

    UnknownError,
}

impl std::error::Error for GLMError {}

impl std::fmt::Display for GLMError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Session data ----
            GLMError::EmptySeries { name } => write!(f, "Input series '{name}' is empty."),
            GLMError::NonFiniteData { name, index, value } => {
                write!(f, "Series '{name}' has a non-finite value at index {index}: {value}")
            }
            GLMError::LengthMismatch { name, expected, actual } => {
                write!(f, "Series '{name}' has length {actual}; expected {expected}.")
            }
            GLMError::UnsortedTimestamps { name, index } => {
                write!(f, "Timestamps of '{name}' decrease at index {index}.")
            }
            GLMError::InvalidDt { dt } => write!(f, "dt must be finite and > 0; got: {dt}"),
            GLMError::InvalidStopTime { stop_time } => {
                write!(f, "stop_time must cover at least one bin; got: {stop_time}")
            }
            // ---- Filter configuration ----
            GLMError::InvalidParamCount { channel } => {
                write!(f, "Channel '{channel}' needs at least one basis parameter.")
            }
            GLMError::InvalidDuration { channel, duration } => {
                write!(f, "Filter duration of '{channel}' must be finite and > 0; got: {duration}")
            }
            GLMError::InvalidSigma { sigma } => {
                write!(f, "Basis sigma must be finite and > 0; got: {sigma}")
            }
            GLMError::EmptyBasis => write!(f, "Basis filter needs at least one weight."),
            GLMError::EmptyFilter { duration, dt } => {
                write!(f, "Filter window [dt, {duration}) contains no bins for dt = {dt}.")
            }
            GLMError::EmptyTimeVector => write!(f, "Basis filter time vector is empty."),
            // ---- Channel layout ----
            GLMError::DuplicateChannel { channel } => {
                write!(f, "Channel '{channel}' appears more than once.")
            }
            GLMError::EmptyLayout => write!(f, "Channel layout has no channels."),
            // ---- Parameter accounting ----
            GLMError::ParamCountMismatch { expected, actual } => write!(
                f,
                "Not all parameters were used: layout consumes {expected}, vector has {actual}."
            ),
            GLMError::ParamMisalignment { channel, expected, found } => write!(
                f,
                "Parameter mis-alignment in channel '{channel}': expected {expected}, found {found}."
            ),
            GLMError::NonFiniteParam { index, value } => {
                write!(f, "Parameter at index {index} is non-finite: {value}")
            }
            // ---- Likelihood ----
            GLMError::EventIndexOutOfRange { index, len } => {
                write!(f, "Lick bin {index} is outside the latent rate of length {len}.")
            }
            GLMError::InvalidL2 { l2 } => write!(f, "L2 penalty must be finite and >= 0; got: {l2}"),
            // ---- Model / data pairing ----
            GLMError::GridMismatch { model, data } => write!(
                f,
                "Model grid (dt = {}, stop_time = {}) differs from data grid (dt = {}, stop_time = {}).",
                model.0, model.1, data.0, data.1
            ),
            GLMError::MissingCovariate { channel } => {
                write!(f, "Channel '{channel}' is enabled but the session has no such covariate.")
            }
            // ---- Comparison ----
            GLMError::NotNested { restricted, full } => write!(
                f,
                "Restricted model ({restricted} params) must have fewer parameters than the full model ({full})."
            ),
            GLMError::InvalidDegreesOfFreedom { df, text } => {
                write!(f, "Chi-squared with {df} degrees of freedom is invalid: {text}")
            }
            // ---- Estimation ----
            GLMError::OptimizationFailed { status } => {
                write!(f, "Optimizer failed with status: {status}")
            }
            GLMError::UnknownError => write!(f, "An unknown error occurred in the GLM."),
        }
    }
}

impl From<OptError> for GLMError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::ParamCountMismatch { expected, actual } => {
                GLMError::ParamCountMismatch { expected, actual }
            }
            OptError::ParamMisalignment { channel, expected, found } => {
                GLMError::ParamMisalignment { channel, expected, found }
            }
            OptError::EventIndexOutOfRange { index, len } => {
                GLMError::EventIndexOutOfRange { index, len }
            }
            other => GLMError::OptimizationFailed { status: other.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<GLMError> for PyErr {
    fn from(err: GLMError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // The two fatal accounting errors keep the wording downstream tooling
    // greps for.
    fn accounting_messages_are_stable() {
        let count = GLMError::ParamCountMismatch { expected: 11, actual: 12 };
        let align = GLMError::ParamMisalignment { channel: "reward", expected: 20, found: 3 };

        assert!(count.to_string().starts_with("Not all parameters were used"));
        assert!(align.to_string().starts_with("Parameter mis-alignment"));
        assert!(align.to_string().contains("reward"));
    }

    #[test]
    // Purpose
    // -------
    // Errors that crossed the optimizer boundary come back as the model
    // variant they started as; anything else is an optimization failure.
    fn opt_errors_map_back_to_model_variants() {
        let back: GLMError = OptError::EventIndexOutOfRange { index: 7, len: 5 }.into();
        assert_eq!(back, GLMError::EventIndexOutOfRange { index: 7, len: 5 });

        let generic: GLMError = OptError::MissingThetaHat.into();
        assert!(matches!(generic, GLMError::OptimizationFailed { .. }));
    }
}
