//! numerical_stability — guarded exponentials, logs and shared tolerances.
//!
//! Purpose
//! -------
//! Keep the Poisson GLM's `exp`/`ln` pair inside `f64` range regardless of
//! where the optimizer wanders, and hold the small constants shared by the
//! likelihood and inference code.
//!
//! Key behaviors
//! -------------
//! - `clipped_exp` maps a linear predictor to a strictly positive rate.
//! - `within_clip` tells the gradient code where that map is not flat.
//! - `nudged_ln` turns exact zeros into `ln(eps)` instead of `-inf`.
//!
//! Conventions
//! -----------
//! - Pure scalar functions, no allocation, no logging; intended for tight
//!   per-bin loops.

pub mod transformations;

pub use self::transformations::{
    EIGEN_EPS, LATENT_CLIP, clipped_exp, nudged_ln, within_clip,
};

pub mod prelude {
    pub use super::transformations::{EIGEN_EPS, LATENT_CLIP, clipped_exp, nudged_ln};
}
