//! Core numeric primitives (Vector, Matrix).
//!
//! All pipeline math runs on f64: the SOC target passes through
//! log1p/expm1 round trips and standardization of near-constant
//! terrain features, both of which want double precision.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;
