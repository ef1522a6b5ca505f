//! Numeric aliases shared by the optimizer and the models that plug into it.
//!
//! Everything is `ndarray` over `f64`; the L-BFGS aliases pin argmin's
//! `(Param, Gradient, Float)` generics to these shapes so the builders can
//! name concrete solver types.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Flat parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient with the same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense `n × n` second-derivative matrix, `n = θ.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// argmin's evaluation counters, e.g. `"cost_count"`, `"gradient_count"`.
pub type FnEvalMap = HashMap<String, u64>;

/// History length used when `MLEOptions::lbfgs_mem` is `None`.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
