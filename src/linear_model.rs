//! Ordinary Least Squares linear regression.
//!
//! The one model in the ensemble fit directly on the raw SOC target.

use crate::error::{PedonError, Result};
use crate::primitives::{Matrix, Vector};
use serde::{Deserialize, Serialize};

/// Ordinary Least Squares (OLS) linear regression.
///
/// Fits a linear model by minimizing the residual sum of squares.
/// Solves the normal equations `β = (X^T X)^-1 X^T y` via Cholesky
/// decomposition.
///
/// # Examples
///
/// ```
/// use pedon::linear_model::LinearRegression;
/// use pedon::primitives::{Matrix, Vector};
///
/// // y = 2x + 1
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);
///
/// let mut model = LinearRegression::new();
/// model.fit(&x, &y).unwrap();
/// let predictions = model.predict(&x).unwrap();
/// assert!((predictions[0] - 3.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Coefficients for features (excluding intercept).
    coefficients: Option<Vector>,
    /// Intercept (bias) term.
    intercept: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Creates a new unfitted `LinearRegression`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Returns the coefficients (excluding intercept), if fitted.
    #[must_use]
    pub fn coefficients(&self) -> Option<&Vector> {
        self.coefficients.as_ref()
    }

    /// Returns the intercept term.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Adds an intercept column of ones to the design matrix.
    fn add_intercept_column(x: &Matrix) -> Result<Matrix> {
        let (n_rows, n_cols) = x.shape();
        let mut data = Vec::with_capacity(n_rows * (n_cols + 1));

        for i in 0..n_rows {
            data.push(1.0);
            for j in 0..n_cols {
                data.push(x.get(i, j));
            }
        }

        Matrix::from_vec(n_rows, n_cols + 1, data)
    }

    /// Fits the model using the normal equations.
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions don't match, the system is
    /// underdetermined, or the normal-equations matrix is singular.
    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples != y.len() {
            return Err(PedonError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }
        if n_samples == 0 {
            return Err("cannot fit with zero samples".into());
        }
        if n_samples < n_features + 1 {
            return Err(PedonError::config(format!(
                "insufficient samples: OLS with intercept needs at least {} samples for {} \
                 features, got {n_samples}",
                n_features + 1,
                n_features
            )));
        }

        let x_design = Self::add_intercept_column(x)?;

        let xt = x_design.transpose();
        let xtx = xt.matmul(&x_design)?;
        let xty = xt.matvec(y)?;

        let beta = xtx.cholesky_solve(&xty)?;

        self.intercept = beta[0];
        self.coefficients = Some(beta.slice(1, n_features + 1));

        Ok(())
    }

    /// Predicts target values for input data.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or dimensions
    /// don't match.
    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| PedonError::prediction("LinearRegression is not fitted"))?;

        let result = x.matvec(coefficients)?;
        Ok(result.add_scalar(self.intercept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unfitted() {
        let model = LinearRegression::new();
        assert!(!model.is_fitted());
        assert!(model.predict(&Matrix::from_row(&[1.0])).is_err());
    }

    #[test]
    fn test_simple_regression() {
        // y = 2x + 1
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-8);
        assert!((model.intercept() - 1.0).abs() < 1e-8);

        let predictions = model.predict(&x).unwrap();
        for i in 0..4 {
            assert!((predictions[i] - y[i]).abs() < 1e-8);
        }
    }

    #[test]
    fn test_multivariate_regression() {
        // y = 1 + 2*x1 + 3*x2
        let x = Matrix::from_vec(4, 2, vec![1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 2.0, 2.0]).unwrap();
        let y = Vector::from_slice(&[6.0, 8.0, 9.0, 11.0]);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-8);
        assert!((coef[1] - 3.0).abs() < 1e-8);
        assert!((model.intercept() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_predict_new_data() {
        let x_train = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let y_train = Vector::from_slice(&[2.0, 3.0, 4.0]);

        let mut model = LinearRegression::new();
        model.fit(&x_train, &y_train).unwrap();

        let x_test = Matrix::from_vec(2, 1, vec![4.0, 5.0]).unwrap();
        let predictions = model.predict(&x_test).unwrap();

        assert!((predictions[0] - 5.0).abs() < 1e-8);
        assert!((predictions[1] - 6.0).abs() < 1e-8);
    }

    #[test]
    fn test_dimension_mismatch_error() {
        let x = Matrix::from_vec(3, 2, vec![1.0; 6]).unwrap();
        let y = Vector::from_slice(&[1.0, 2.0]);

        let mut model = LinearRegression::new();
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_underdetermined_system_errors() {
        // 3 samples, 5 features: fewer samples than parameters
        let x = Matrix::from_vec(
            3,
            5,
            vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 2.0, 3.0, 4.0, 5.0, 6.0, 3.0, 4.0, 5.0, 6.0, 7.0,
            ],
        )
        .unwrap();
        let y = Vector::from_slice(&[10.0, 20.0, 30.0]);

        let mut model = LinearRegression::new();
        let result = model.fit(&x, &y);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("samples"));
    }

    #[test]
    fn test_constant_target() {
        let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let y = Vector::from_slice(&[5.0, 5.0, 5.0]);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert!(coef[0].abs() < 1e-8);
        assert!((model.intercept() - 5.0).abs() < 1e-8);
    }

    #[test]
    fn test_serde_round_trip_preserves_fit() {
        let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let y = Vector::from_slice(&[2.0, 4.0, 6.0]);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let loaded: LinearRegression = serde_json::from_str(&json).unwrap();

        let a = model.predict(&x).unwrap();
        let b = loaded.predict(&x).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
    }
}
