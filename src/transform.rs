//! Target transform policy mapping the SOC target between raw space and
//! each model's fitting space.
//!
//! SOC % is right-skewed and non-negative, so the tree and boosting
//! models are fit on log1p(y) and inverted with expm1 at prediction
//! time; the linear model is fit and evaluated directly in raw space.
//! The transform is carried as data by each [`crate::regressor::Regressor`],
//! so the same policy instance used at training time is applied at
//! inference time for that model.

use crate::primitives::Vector;
use serde::{Deserialize, Serialize};

/// Per-model rule mapping raw target values to and from fitting space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetTransform {
    /// Fit and predict directly on the raw target.
    Identity,
    /// Fit on log1p(y), invert predictions with expm1.
    Log1p,
}

impl TargetTransform {
    /// Maps a raw target value into fitting space.
    #[must_use]
    pub fn to_fit_space_scalar(&self, y: f64) -> f64 {
        match self {
            TargetTransform::Identity => y,
            TargetTransform::Log1p => y.ln_1p(),
        }
    }

    /// Maps a fit-space prediction back to the raw scale.
    #[must_use]
    pub fn from_fit_space_scalar(&self, y_hat: f64) -> f64 {
        match self {
            TargetTransform::Identity => y_hat,
            TargetTransform::Log1p => y_hat.exp_m1(),
        }
    }

    /// Maps a raw target vector into fitting space.
    #[must_use]
    pub fn to_fit_space(&self, y: &Vector) -> Vector {
        y.map(|v| self.to_fit_space_scalar(v))
    }

    /// Maps fit-space predictions back to the raw scale.
    #[must_use]
    pub fn from_fit_space(&self, y_hat: &Vector) -> Vector {
        y_hat.map(|v| self.from_fit_space_scalar(v))
    }
}

/// Clamps a prediction to the valid SOC percentage range.
#[must_use]
pub fn clamp_soc(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_noop() {
        let y = Vector::from_slice(&[0.0, 1.5, 42.0]);
        let fit = TargetTransform::Identity.to_fit_space(&y);
        assert_eq!(fit.as_slice(), y.as_slice());
        let back = TargetTransform::Identity.from_fit_space(&fit);
        assert_eq!(back.as_slice(), y.as_slice());
    }

    #[test]
    fn test_log1p_round_trip() {
        // expm1(log1p(y)) == y within floating tolerance for all y >= 0
        let policy = TargetTransform::Log1p;
        for &y in &[0.0, 1e-9, 0.1, 1.0, 3.7, 50.0, 100.0] {
            let round = policy.from_fit_space_scalar(policy.to_fit_space_scalar(y));
            assert!(
                (round - y).abs() < 1e-9,
                "round trip failed for {y}: got {round}"
            );
        }
    }

    #[test]
    fn test_log1p_vector() {
        let y = Vector::from_slice(&[0.0, std::f64::consts::E - 1.0]);
        let fit = TargetTransform::Log1p.to_fit_space(&y);
        assert!((fit[0] - 0.0).abs() < 1e-12);
        assert!((fit[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_log1p_stabilizes_skew() {
        // Large raw values are compressed, small ones nearly preserved.
        let policy = TargetTransform::Log1p;
        let small = policy.to_fit_space_scalar(0.1);
        let large = policy.to_fit_space_scalar(90.0);
        assert!(small > 0.09 && small < 0.1);
        assert!(large < 5.0);
    }

    #[test]
    fn test_clamp_soc_bounds() {
        assert_eq!(clamp_soc(-3.0), 0.0);
        assert_eq!(clamp_soc(250.0), 100.0);
        assert_eq!(clamp_soc(42.5), 42.5);
        assert_eq!(clamp_soc(0.0), 0.0);
        assert_eq!(clamp_soc(100.0), 100.0);
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&TargetTransform::Log1p).unwrap();
        let back: TargetTransform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TargetTransform::Log1p);
    }
}
