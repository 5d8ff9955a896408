//! Gradient boosting regressors.
//!
//! Both boosted models stack shallow regression trees on the residuals
//! of the running prediction, starting from the target mean. The
//! XGBoost-style variant additionally applies L2 shrinkage to every
//! leaf weight, which is the closed-form regularized leaf value for
//! squared loss.

use crate::error::{PedonError, Result};
use crate::primitives::{Matrix, Vector};
use crate::tree::DecisionTreeRegressor;
use serde::{Deserialize, Serialize};

/// Gradient boosting regressor with squared loss.
///
/// Each stage fits a regression tree to the current residuals and the
/// ensemble prediction advances by `learning_rate` times the tree's
/// output. Fitting is fully deterministic: no subsampling, no random
/// feature selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
    base_prediction: f64,
    trees: Vec<DecisionTreeRegressor>,
}

impl GradientBoostingRegressor {
    /// Creates a new unfitted booster.
    #[must_use]
    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
            base_prediction: 0.0,
            trees: Vec::new(),
        }
    }

    /// Returns true if the booster has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Returns (n_estimators, learning_rate, max_depth).
    #[must_use]
    pub fn hyperparameters(&self) -> (usize, f64, usize) {
        (self.n_estimators, self.learning_rate, self.max_depth)
    }

    fn validate_hyperparameters(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PedonError::InvalidHyperparameter {
                param: "n_estimators".to_string(),
                value: "0".to_string(),
                constraint: "> 0".to_string(),
            });
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(PedonError::InvalidHyperparameter {
                param: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                constraint: "finite and > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Fits the boosted ensemble.
    ///
    /// # Errors
    ///
    /// Returns an error if hyperparameters are invalid, dimensions
    /// don't match, or the data is empty.
    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        self.fit_with_leaf_shrinkage(x, y, None)
    }

    /// Fits the ensemble, optionally applying L2 leaf shrinkage with
    /// the given lambda after each stage.
    fn fit_with_leaf_shrinkage(
        &mut self,
        x: &Matrix,
        y: &Vector,
        reg_lambda: Option<f64>,
    ) -> Result<()> {
        self.validate_hyperparameters()?;

        let (n_samples, _) = x.shape();
        if n_samples != y.len() {
            return Err(PedonError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }
        if n_samples == 0 {
            return Err("cannot fit booster with zero samples".into());
        }

        self.base_prediction = y.mean();
        self.trees = Vec::with_capacity(self.n_estimators);

        let mut current: Vec<f64> = vec![self.base_prediction; n_samples];

        for _ in 0..self.n_estimators {
            let residuals = Vector::from_vec(
                y.as_slice()
                    .iter()
                    .zip(&current)
                    .map(|(t, c)| t - c)
                    .collect(),
            );

            let mut tree = DecisionTreeRegressor::new(self.max_depth);
            tree.fit(x, &residuals)?;
            if let Some(lambda) = reg_lambda {
                tree.regularize_leaves(lambda)?;
            }

            let stage = tree.predict(x)?;
            for (c, s) in current.iter_mut().zip(stage.as_slice()) {
                *c += self.learning_rate * s;
            }
            self.trees.push(tree);
        }

        Ok(())
    }

    /// Predicts target values in the fitting space.
    ///
    /// # Errors
    ///
    /// Returns an error if the booster is not fitted.
    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        if self.trees.is_empty() {
            return Err(PedonError::prediction(
                "GradientBoostingRegressor is not fitted",
            ));
        }

        let mut predictions = vec![self.base_prediction; x.n_rows()];
        for tree in &self.trees {
            let stage = tree.predict(x)?;
            for (p, s) in predictions.iter_mut().zip(stage.as_slice()) {
                *p += self.learning_rate * s;
            }
        }
        Ok(Vector::from_vec(predictions))
    }

    /// Split-count feature importances, normalized to sum to 1.
    ///
    /// Returns zeros when the ensemble made no splits at all.
    #[must_use]
    pub fn feature_importances(&self, n_features: usize) -> Vec<f64> {
        let mut counts = vec![0.0; n_features];
        for tree in &self.trees {
            tree.accumulate_split_counts(&mut counts);
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for c in &mut counts {
                *c /= total;
            }
        }
        counts
    }
}

/// XGBoost-style boosted regressor.
///
/// Same stagewise residual fitting as [`GradientBoostingRegressor`],
/// with every leaf weight shrunk by `n / (n + reg_lambda)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XgbRegressor {
    inner: GradientBoostingRegressor,
    reg_lambda: f64,
}

impl XgbRegressor {
    /// Creates a new unfitted regressor with the default lambda of 1.0.
    #[must_use]
    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            inner: GradientBoostingRegressor::new(n_estimators, learning_rate, max_depth),
            reg_lambda: 1.0,
        }
    }

    /// Sets the L2 regularization strength.
    #[must_use]
    pub fn with_reg_lambda(mut self, reg_lambda: f64) -> Self {
        self.reg_lambda = reg_lambda;
        self
    }

    /// Returns true if the regressor has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.inner.is_fitted()
    }

    /// Fits the regularized boosted ensemble.
    ///
    /// # Errors
    ///
    /// Returns an error if hyperparameters are invalid, dimensions
    /// don't match, or the data is empty.
    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        if self.reg_lambda < 0.0 {
            return Err(PedonError::InvalidHyperparameter {
                param: "reg_lambda".to_string(),
                value: self.reg_lambda.to_string(),
                constraint: ">= 0".to_string(),
            });
        }
        self.inner
            .fit_with_leaf_shrinkage(x, y, Some(self.reg_lambda))
    }

    /// Predicts target values in the fitting space.
    ///
    /// # Errors
    ///
    /// Returns an error if the regressor is not fitted.
    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        self.inner.predict(x)
    }
}
