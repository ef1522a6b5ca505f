//! Error surface for the optimizer layer.
//!
//! [`OptError`] collects configuration mistakes (tolerances, line search,
//! L-BFGS memory), numerical failures (non-finite costs, gradients,
//! Hessians), wrapped argmin errors and the model-side failures a
//! log-likelihood can raise while being evaluated. Model errors are carried
//! through argmin as boxed errors and recovered by downcasting in
//! `From<argmin::core::Error>`, so a parameter-count mismatch raised deep
//! inside a cost evaluation reaches the caller as the same variant.
use argmin::core::{ArgminError, Error};

use crate::glm::errors::GLMError;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- MLEOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad { tol: f64, reason: &'static str },

    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost { tol: f64, reason: &'static str },

    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// At least one stopping rule must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Cost function ----
    /// Objective returned a non-finite value.
    NonFiniteCost { value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Solver state held no best parameter vector.
    MissingThetaHat,

    // ---- Argmin ----
    InvalidParameter { text: String },
    NotImplemented { text: String },
    NotInitialized { text: String },
    ConditionViolated { text: String },
    CheckPointNotFound { text: String },
    PotentialBug { text: String },
    ImpossibleError { text: String },
    /// Any other error raised inside argmin.
    BackendError { text: String },

    // ---- Finite Diffs ----
    HessianDimMismatch { expected: usize, found: (usize, usize) },
    InvalidHessian { row: usize, col: usize, value: f64 },

    // ---- Model errors ----
    /// Parameter vector longer than the channel layout consumes.
    ParamCountMismatch { expected: usize, actual: usize },

    /// Parameter vector too short for a channel's declared block.
    ParamMisalignment { channel: &'static str, expected: usize, found: usize },

    /// Lick bin index outside the latent trace.
    EventIndexOutOfRange { index: usize, len: usize },

    /// Any other model-side failure, rendered as text.
    ModelError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Analytic gradient not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MLEOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite objective value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Solver returned no parameter estimate")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            OptError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            OptError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            OptError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            OptError::CheckPointNotFound { text } => write!(f, "Checkpoint not found: {text}"),
            OptError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            OptError::ImpossibleError { text } => write!(f, "Impossible error: {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Finite Diffs ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Model errors ----
            OptError::ParamCountMismatch { expected, actual } => {
                write!(
                    f,
                    "Not all parameters were used: layout consumes {expected}, vector has {actual}"
                )
            }
            OptError::ParamMisalignment { channel, expected, found } => {
                write!(
                    f,
                    "Parameter mis-alignment for channel '{channel}': expected {expected}, found {found}"
                )
            }
            OptError::EventIndexOutOfRange { index, len } => {
                write!(f, "Event index {index} out of range for latent trace of length {len}")
            }
            OptError::ModelError { text } => write!(f, "Model error: {text}"),

            // ---- Fallback ----
            OptError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<GLMError> for OptError {
    fn from(err: GLMError) -> Self {
        match err {
            GLMError::ParamCountMismatch { expected, actual } => {
                OptError::ParamCountMismatch { expected, actual }
            }
            GLMError::ParamMisalignment { channel, expected, found } => {
                OptError::ParamMisalignment { channel, expected, found }
            }
            GLMError::EventIndexOutOfRange { index, len } => {
                OptError::EventIndexOutOfRange { index, len }
            }
            other => OptError::ModelError { text: other.to_string() },
        }
    }
}
