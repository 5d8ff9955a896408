//! pedon: soil organic carbon (SOC %) prediction.
//!
//! Two halves share one model roster:
//!
//! - **Training** ([`pipeline`]): load the covariate table, split,
//!   standardize, tune the gradient boosting model by cross-validated
//!   grid search, fit all four regressors in their own target spaces,
//!   evaluate on the held-out split, and persist the artifact set
//!   atomically.
//! - **Serving** ([`service`], [`server`]): load the artifact set once
//!   at startup and answer stateless prediction requests, returning
//!   one clamped, rounded SOC estimate per model.
//!
//! The tree ensembles are fit on `log1p` of the target and inverted
//! with `expm1` at prediction time; the linear model works on the raw
//! scale. Each [`regressor::Regressor`] carries its own transform so
//! the two sides can never disagree.

#![warn(missing_docs)]

pub mod artifact;
pub mod boosting;
pub mod dataset;
pub mod error;
pub mod linear_model;
pub mod metrics;
pub mod model_selection;
pub mod pipeline;
pub mod preprocessing;
pub mod primitives;
pub mod regressor;
pub mod server;
pub mod service;
pub mod transform;
pub mod tree;

pub mod prelude;

pub use error::{PedonError, Result};
