//! Convenience re-exports for the common training and serving flows.
//!
//! ```
//! use pedon::prelude::*;
//! ```

pub use crate::artifact::{ArtifactSet, ArtifactStore};
pub use crate::boosting::{GradientBoostingRegressor, XgbRegressor};
pub use crate::dataset::{load_csv, Dataset, FEATURE_NAMES, TARGET_COLUMN};
pub use crate::error::{PedonError, Result};
pub use crate::linear_model::LinearRegression;
pub use crate::metrics::{mae, mse, r_squared, rmse, ModelMetrics, PerformanceReport};
pub use crate::model_selection::{train_test_split, GbParams, KFold};
pub use crate::pipeline::{run_training, TrainingConfig, TrainingOutcome};
pub use crate::preprocessing::StandardScaler;
pub use crate::primitives::{Matrix, Vector};
pub use crate::regressor::{Regressor, MODEL_NAMES};
pub use crate::service::{PredictionRequest, PredictionResponse, ServiceContext};
pub use crate::transform::TargetTransform;
pub use crate::tree::{DecisionTreeRegressor, RandomForestRegressor};
