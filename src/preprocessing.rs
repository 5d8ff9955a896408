//! Feature standardization.
//!
//! The scaler is fitted on the training split only and then applied
//! with identical semantics to the train batch, the test batch, and
//! single inference vectors. It is never refitted during serving.

use crate::error::{PedonError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};

/// Standardizes features by removing the mean and scaling to unit variance.
///
/// The standard score of a sample x is: z = (x - mean) / std, computed
/// per feature column in the fixed feature order.
///
/// # Example
///
/// ```
/// use pedon::preprocessing::StandardScaler;
/// use pedon::primitives::Matrix;
///
/// let data = Matrix::from_vec(3, 2, vec![
///     0.0, 0.0,
///     1.0, 10.0,
///     2.0, 20.0,
/// ]).unwrap();
///
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&data).unwrap();
///
/// // Each column now has mean ~0
/// for j in 0..2 {
///     let mean: f64 = (0..3).map(|i| scaled.get(i, j)).sum::<f64>() / 3.0;
///     assert!(mean.abs() < 1e-10);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f64>>,
    /// Standard deviation of each feature (computed during fit).
    std: Option<Vec<f64>>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Creates a new unfitted `StandardScaler`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    /// Creates a scaler from known parameters, in fixed feature order.
    ///
    /// # Errors
    ///
    /// Returns an error if the mean and std lengths differ.
    pub fn from_parameters(mean: Vec<f64>, std: Vec<f64>) -> Result<Self> {
        if mean.len() != std.len() {
            return Err(PedonError::dimension_mismatch(
                "mean len",
                mean.len(),
                std.len(),
            ));
        }
        Ok(Self {
            mean: Some(mean),
            std: Some(std),
        })
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Returns the per-feature mean, if fitted.
    #[must_use]
    pub fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    /// Returns the per-feature standard deviation, if fitted.
    #[must_use]
    pub fn std(&self) -> Option<&[f64]> {
        self.std.as_deref()
    }

    /// Computes the mean and standard deviation of each feature column.
    ///
    /// Uses the population standard deviation (divide by n), matching
    /// the convention the scaler parameters were originally produced
    /// with.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix has zero samples.
    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples == 0 {
            return Err("cannot fit scaler with zero samples".into());
        }

        let mut mean = vec![0.0; n_features];
        for (j, mean_j) in mean.iter_mut().enumerate() {
            let mut sum = 0.0;
            for i in 0..n_samples {
                sum += x.get(i, j);
            }
            *mean_j = sum / n_samples as f64;
        }

        let mut std = vec![0.0; n_features];
        for (j, std_j) in std.iter_mut().enumerate() {
            let mut sum_sq = 0.0;
            for i in 0..n_samples {
                let diff = x.get(i, j) - mean[j];
                sum_sq += diff * diff;
            }
            *std_j = (sum_sq / n_samples as f64).sqrt();
        }

        self.mean = Some(mean);
        self.std = Some(std);

        Ok(())
    }

    /// Standardizes data using the fitted parameters. No fitting side
    /// effect; works identically for a batch or a single-row matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted or the feature
    /// count doesn't match.
    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let mean = self
            .mean
            .as_ref()
            .ok_or_else(|| PedonError::from("scaler not fitted"))?;
        let std = self
            .std
            .as_ref()
            .ok_or_else(|| PedonError::from("scaler not fitted"))?;

        let (n_samples, n_features) = x.shape();
        if n_features != mean.len() {
            return Err(PedonError::dimension_mismatch(
                "features",
                mean.len(),
                n_features,
            ));
        }

        let mut result = vec![0.0; n_samples * n_features];

        for i in 0..n_samples {
            for j in 0..n_features {
                let mut val = x.get(i, j) - mean[j];
                // Constant features pass through centered but unscaled.
                if std[j] > 1e-12 {
                    val /= std[j];
                }
                result[i * n_features + j] = val;
            }
        }

        Matrix::from_vec(n_samples, n_features, result)
    }

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    pub fn fit_transform(&mut self, x: &Matrix) -> Result<Matrix> {
        self.fit(x)?;
        self.transform(x)
    }
}
