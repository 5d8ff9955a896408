//! The model roster: one tagged type covering all four regressors.
//!
//! Each variant owns its fitted model together with the target
//! transform it was trained under, so fit-space predictions and their
//! inversion can never use mismatched policies.

use crate::boosting::{GradientBoostingRegressor, XgbRegressor};
use crate::error::Result;
use crate::linear_model::LinearRegression;
use crate::primitives::{Matrix, Vector};
use crate::transform::{clamp_soc, TargetTransform};
use crate::tree::RandomForestRegressor;
use serde::{Deserialize, Serialize};

/// External names of the four models, in roster order. These double as
/// artifact file stems and response keys.
pub const MODEL_NAMES: [&str; 4] = [
    "LinearRegression",
    "RandomForest",
    "GradientBoosting",
    "XGBoost",
];

/// A fitted regression model paired with its target transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Regressor {
    /// OLS, fit directly on the raw target.
    Linear(LinearRegression),
    /// Bagged trees, fit on log1p(y).
    RandomForest(RandomForestRegressor),
    /// Boosted trees, fit on log1p(y).
    GradientBoosting(GradientBoostingRegressor),
    /// L2-regularized boosted trees, fit on log1p(y).
    Xgboost(XgbRegressor),
}

impl Regressor {
    /// Returns the model's external name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Regressor::Linear(_) => MODEL_NAMES[0],
            Regressor::RandomForest(_) => MODEL_NAMES[1],
            Regressor::GradientBoosting(_) => MODEL_NAMES[2],
            Regressor::Xgboost(_) => MODEL_NAMES[3],
        }
    }

    /// Returns the target transform this model was trained under.
    #[must_use]
    pub fn transform(&self) -> TargetTransform {
        match self {
            Regressor::Linear(_) => TargetTransform::Identity,
            Regressor::RandomForest(_)
            | Regressor::GradientBoosting(_)
            | Regressor::Xgboost(_) => TargetTransform::Log1p,
        }
    }

    /// Returns true if the underlying model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        match self {
            Regressor::Linear(m) => m.is_fitted(),
            Regressor::RandomForest(m) => m.is_fitted(),
            Regressor::GradientBoosting(m) => m.is_fitted(),
            Regressor::Xgboost(m) => m.is_fitted(),
        }
    }

    /// Predicts in the model's own fitting space (raw for the linear
    /// model, log space for the tree ensembles).
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or dimensions
    /// don't match.
    pub fn predict_fit_space(&self, x: &Matrix) -> Result<Vector> {
        match self {
            Regressor::Linear(m) => m.predict(x),
            Regressor::RandomForest(m) => m.predict(x),
            Regressor::GradientBoosting(m) => m.predict(x),
            Regressor::Xgboost(m) => m.predict(x),
        }
    }

    /// Predicts on the original SOC scale: fit-space prediction,
    /// inverse transform, then clamp to [0, 100].
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or dimensions
    /// don't match.
    pub fn predict_original_scale(&self, x: &Matrix) -> Result<Vector> {
        let fit_space = self.predict_fit_space(x)?;
        let raw = self.transform().from_fit_space(&fit_space);
        Ok(raw.map(clamp_soc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Matrix, Vector) {
        let x = Matrix::from_vec(
            8,
            1,
            vec![1.0, 2.0, 3.0, 4.0, 6.0, 7.0, 8.0, 9.0],
        )
        .unwrap();
        let y = Vector::from_slice(&[0.5, 0.6, 0.7, 0.8, 3.0, 3.2, 3.4, 3.6]);
        (x, y)
    }

    #[test]
    fn test_names_match_roster_order() {
        let models = [
            Regressor::Linear(LinearRegression::new()),
            Regressor::RandomForest(RandomForestRegressor::new(10, 3)),
            Regressor::GradientBoosting(GradientBoostingRegressor::new(10, 0.1, 2)),
            Regressor::Xgboost(XgbRegressor::new(10, 0.1, 2)),
        ];
        for (model, expected) in models.iter().zip(MODEL_NAMES) {
            assert_eq!(model.name(), expected);
        }
    }

    #[test]
    fn test_transform_policy_per_variant() {
        assert_eq!(
            Regressor::Linear(LinearRegression::new()).transform(),
            TargetTransform::Identity
        );
        assert_eq!(
            Regressor::RandomForest(RandomForestRegressor::new(1, 1)).transform(),
            TargetTransform::Log1p
        );
        assert_eq!(
            Regressor::GradientBoosting(GradientBoostingRegressor::new(1, 0.1, 1)).transform(),
            TargetTransform::Log1p
        );
        assert_eq!(
            Regressor::Xgboost(XgbRegressor::new(1, 0.1, 1)).transform(),
            TargetTransform::Log1p
        );
    }

    #[test]
    fn test_predict_original_scale_applies_inverse_and_clamp() {
        // A depth-0 forest on a constant log-space target is a known
        // quantity: every prediction is log1p(c), so the original-scale
        // output must be exactly expm1(log1p(c)) = c.
        let (x, y) = toy_data();
        let y_const = Vector::from_vec(vec![2.0; y.len()]);
        let y_log = TargetTransform::Log1p.to_fit_space(&y_const);

        let mut forest = RandomForestRegressor::new(5, 0).with_random_state(42);
        forest.fit(&x, &y_log).unwrap();
        let model = Regressor::RandomForest(forest);

        let preds = model.predict_original_scale(&x).unwrap();
        for i in 0..preds.len() {
            assert!((preds[i] - 2.0).abs() < 1e-9, "got {}", preds[i]);
        }
    }

    #[test]
    fn test_predict_original_scale_clamps_linear_extrapolation() {
        // A steep linear fit extrapolates far outside [0, 100].
        let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let y = Vector::from_slice(&[10.0, 50.0, 90.0]);
        let mut lr = LinearRegression::new();
        lr.fit(&x, &y).unwrap();
        let model = Regressor::Linear(lr);

        let high = model
            .predict_original_scale(&Matrix::from_row(&[100.0]))
            .unwrap();
        assert_eq!(high[0], 100.0);

        let low = model
            .predict_original_scale(&Matrix::from_row(&[-100.0]))
            .unwrap();
        assert_eq!(low[0], 0.0);
    }

    #[test]
    fn test_unfitted_model_propagates_error() {
        let model = Regressor::Linear(LinearRegression::new());
        assert!(model
            .predict_original_scale(&Matrix::from_row(&[1.0]))
            .is_err());
    }

    #[test]
    fn test_serde_round_trip_preserves_variant_and_fit() {
        let (x, y) = toy_data();
        let mut gb = GradientBoostingRegressor::new(10, 0.1, 2);
        gb.fit(&x, &TargetTransform::Log1p.to_fit_space(&y)).unwrap();
        let model = Regressor::GradientBoosting(gb);

        let json = serde_json::to_string(&model).unwrap();
        let loaded: Regressor = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.name(), "GradientBoosting");
        assert_eq!(
            model.predict_original_scale(&x).unwrap().as_slice(),
            loaded.predict_original_scale(&x).unwrap().as_slice()
        );
    }
}
