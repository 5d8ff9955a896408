//! Stateless inference: request validation, scaling, and the
//! all-or-nothing multi-model prediction.
//!
//! The service context is built once from loaded artifacts and shared
//! read-only across requests. Nothing here mutates, retries, or
//! caches; every request is scaled and predicted from scratch.

use crate::error::{PedonError, Result};
use crate::metrics::round_to;
use crate::preprocessing::StandardScaler;
use crate::primitives::Matrix;
use crate::regressor::Regressor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One inference request: the eight covariates, all required.
///
/// Unknown fields are rejected, so a misspelled covariate fails
/// validation instead of silently defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(non_snake_case)]
pub struct PredictionRequest {
    /// Topographic position index
    pub TPI: f64,
    /// Terrain ruggedness index
    pub TRI: f64,
    /// Topographic wetness index
    pub TWI: f64,
    /// Valley depth
    pub VDepth: f64,
    /// Visible band reflectance
    pub VIS: f64,
    /// Seasonal NDVI maximum
    pub NDVI_max: f64,
    /// Seasonal NDVI median
    pub NDVI_median: f64,
    /// Seasonal NDVI standard deviation
    pub NDVI_sd: f64,
}

impl PredictionRequest {
    /// Returns the covariates as a row in the fixed feature order.
    #[must_use]
    pub fn to_row(&self) -> [f64; 8] {
        [
            self.TPI,
            self.TRI,
            self.TWI,
            self.VDepth,
            self.VIS,
            self.NDVI_max,
            self.NDVI_median,
            self.NDVI_sd,
        ]
    }

    /// Rejects non-finite values (NaN, infinities).
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let names = crate::dataset::FEATURE_NAMES;
        for (name, value) in names.iter().zip(self.to_row()) {
            if !value.is_finite() {
                return Err(PedonError::validation(format!(
                    "field '{name}' is not a finite number"
                )));
            }
        }
        Ok(())
    }
}

/// Response body: one prediction per model, plus a status message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Model name -> predicted SOC %, rounded to 2 decimals
    pub predictions: BTreeMap<String, f64>,
    /// Human-readable status
    pub message: String,
}

/// Immutable serving state: the fitted scaler and the model roster.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    scaler: StandardScaler,
    models: Vec<Regressor>,
}

impl ServiceContext {
    /// Builds the context from a loaded artifact set.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler or any model is unfitted.
    pub fn new(scaler: StandardScaler, models: Vec<Regressor>) -> Result<Self> {
        if !scaler.is_fitted() {
            return Err(PedonError::prediction("loaded scaler is unfitted"));
        }
        for model in &models {
            if !model.is_fitted() {
                return Err(PedonError::prediction(format!(
                    "loaded model '{}' is unfitted",
                    model.name()
                )));
            }
        }
        Ok(Self { scaler, models })
    }

    /// Builds the context from an artifact set.
    ///
    /// # Errors
    ///
    /// Returns an error if any artifact is unfitted.
    pub fn from_artifacts(artifacts: crate::artifact::ArtifactSet) -> Result<Self> {
        Self::new(artifacts.scaler, artifacts.models)
    }

    /// Number of models in the roster.
    #[must_use]
    pub fn n_models(&self) -> usize {
        self.models.len()
    }

    /// Runs the full inference flow for one request.
    ///
    /// Validates, scales once, predicts with every model on the
    /// original SOC scale, and rounds to 2 decimals. If any model
    /// fails, the whole request fails: no partial responses.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, or a prediction
    /// error if any model invocation fails.
    pub fn predict(&self, request: &PredictionRequest) -> Result<BTreeMap<String, f64>> {
        request.validate()?;

        let scaled = self.scaler.transform(&Matrix::from_row(&request.to_row()))?;

        let mut predictions = BTreeMap::new();
        for model in &self.models {
            let pred = model.predict_original_scale(&scaled)?;
            predictions.insert(model.name().to_string(), round_to(pred[0], 2));
        }
        Ok(predictions)
    }
}
