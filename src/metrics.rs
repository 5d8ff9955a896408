//! Evaluation metrics for the regression models.
//!
//! Regression metrics (MAE, MSE, RMSE, R²) plus the held-out evaluation
//! that produces one performance record per model, always computed on
//! the original SOC scale after inverse transform and clamping.

use crate::error::Result;
use crate::primitives::{Matrix, Vector};
use crate::regressor::Regressor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Computes the Mean Absolute Error (MAE).
///
/// MAE = (1/n) * Σ|y_true - y_pred|
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn mae(y_pred: &Vector, y_true: &Vector) -> f64 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let n = y_true.len() as f64;
    let sum_abs_error: f64 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(t, p)| (t - p).abs())
        .sum();

    sum_abs_error / n
}

/// Computes the Mean Squared Error (MSE).
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn mse(y_pred: &Vector, y_true: &Vector) -> f64 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let n = y_true.len() as f64;
    let sum_sq_error: f64 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    sum_sq_error / n
}

/// Computes the Root Mean Squared Error (RMSE = sqrt(MSE)).
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn rmse(y_pred: &Vector, y_true: &Vector) -> f64 {
    mse(y_pred, y_true).sqrt()
}

/// Computes the coefficient of determination (R²).
///
/// R² = 1 - (SS_res / SS_tot). Returns 0.0 when the target has zero
/// variance.
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[must_use]
pub fn r_squared(y_pred: &Vector, y_true: &Vector) -> f64 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");

    let y_mean = y_true.mean();

    let ss_res: f64 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    let ss_tot: f64 = y_true
        .as_slice()
        .iter()
        .map(|t| (t - y_mean).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return 0.0;
    }

    1.0 - (ss_res / ss_tot)
}

/// Rounds a value to the given number of decimal places.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Held-out metrics for one model, on the original SOC scale.
///
/// Serializes with the report's external key names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute error
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Root mean squared error
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Coefficient of determination
    #[serde(rename = "R² Score")]
    pub r2: f64,
}

/// Performance report: model name -> held-out metrics.
pub type PerformanceReport = BTreeMap<String, ModelMetrics>;

/// Evaluates a fitted model on the held-out split.
///
/// Predictions are made in the model's fit space, inverse-transformed
/// with its own policy, clamped to [0, 100], and compared against the
/// raw-scale target. Metric values are rounded to 3 decimals, as in
/// the persisted report.
///
/// # Errors
///
/// Returns an error if the model has not been fitted.
pub fn evaluate_on_original_scale(
    model: &Regressor,
    x_test: &Matrix,
    y_test: &Vector,
) -> Result<ModelMetrics> {
    let y_pred = model.predict_original_scale(x_test)?;

    Ok(ModelMetrics {
        mae: round_to(mae(&y_pred, y_test), 3),
        rmse: round_to(rmse(&y_pred, y_test), 3),
        r2: round_to(r_squared(&y_pred, y_test), 3),
    })
}
