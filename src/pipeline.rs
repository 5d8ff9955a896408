//! The offline training pipeline.
//!
//! One entry point, [`run_training`], takes the dataset from CSV to a
//! persisted artifact set: split, scale, tune, fit all four models in
//! their own target spaces, evaluate on the held-out split, and write
//! everything atomically.

use crate::artifact::ArtifactStore;
use crate::boosting::{GradientBoostingRegressor, XgbRegressor};
use crate::dataset::{self, FEATURE_NAMES};
use crate::error::Result;
use crate::linear_model::LinearRegression;
use crate::metrics::{evaluate_on_original_scale, PerformanceReport};
use crate::model_selection::{grid_search_gb, train_test_split, GbParams};
use crate::preprocessing::StandardScaler;
use crate::regressor::Regressor;
use crate::transform::TargetTransform;
use crate::tree::RandomForestRegressor;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Fixed hyperparameters for the untuned ensembles.
const RF_N_ESTIMATORS: usize = 200;
const RF_MAX_DEPTH: usize = 12;
const XGB_N_ESTIMATORS: usize = 200;
const XGB_LEARNING_RATE: f64 = 0.05;
const XGB_MAX_DEPTH: usize = 6;

/// Training run configuration.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Path to the training CSV
    pub data_path: PathBuf,
    /// Directory receiving the artifact set
    pub artifact_dir: PathBuf,
    /// Held-out fraction
    pub test_size: f64,
    /// Seed for the split, the CV folds, and the forest bootstrap
    pub seed: u64,
}

impl TrainingConfig {
    /// Creates a config with the standard 80/20 split and seed 42.
    #[must_use]
    pub fn new(data_path: impl Into<PathBuf>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            artifact_dir: artifact_dir.into(),
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Held-out metrics per model, as persisted
    pub report: PerformanceReport,
    /// Winning gradient boosting configuration
    pub best_params: GbParams,
    /// Usable samples after cleaning
    pub n_samples: usize,
    /// Rows dropped during CSV cleaning
    pub n_dropped: usize,
}

/// Runs the full training pipeline and persists the artifact set.
///
/// # Errors
///
/// Returns an error on dataset, fitting, or persistence failure; no
/// partial artifact set is left behind.
pub fn run_training(config: &TrainingConfig) -> Result<TrainingOutcome> {
    tracing::info!(path = %config.data_path.display(), "loading dataset");
    let data = dataset::load_csv(&config.data_path)?;
    tracing::info!(
        n_samples = data.n_samples(),
        n_dropped = data.n_dropped,
        "dataset loaded"
    );

    let (x_train, x_test, y_train, y_test) = train_test_split(
        &data.features,
        &data.target,
        config.test_size,
        Some(config.seed),
    )?;

    let mut scaler = StandardScaler::new();
    let x_train_scaled = scaler.fit_transform(&x_train)?;
    let x_test_scaled = scaler.transform(&x_test)?;

    let y_train_log = TargetTransform::Log1p.to_fit_space(&y_train);

    tracing::info!("tuning gradient boosting (5-fold grid search)");
    let search = grid_search_gb(&x_train_scaled, &y_train_log, config.seed)?;
    tracing::info!(
        n_estimators = search.params.n_estimators,
        learning_rate = search.params.learning_rate,
        max_depth = search.params.max_depth,
        mean_r2 = search.mean_r2,
        "grid search complete"
    );

    tracing::info!("fitting LinearRegression");
    let mut lr = LinearRegression::new();
    lr.fit(&x_train_scaled, &y_train)?;

    tracing::info!("fitting RandomForest");
    let mut rf =
        RandomForestRegressor::new(RF_N_ESTIMATORS, RF_MAX_DEPTH).with_random_state(config.seed);
    rf.fit(&x_train_scaled, &y_train_log)?;

    tracing::info!("fitting GradientBoosting with tuned parameters");
    let mut gb = GradientBoostingRegressor::new(
        search.params.n_estimators,
        search.params.learning_rate,
        search.params.max_depth,
    );
    gb.fit(&x_train_scaled, &y_train_log)?;

    tracing::info!("fitting XGBoost");
    let mut xgb = XgbRegressor::new(XGB_N_ESTIMATORS, XGB_LEARNING_RATE, XGB_MAX_DEPTH);
    xgb.fit(&x_train_scaled, &y_train_log)?;

    let importances: BTreeMap<String, f64> = FEATURE_NAMES
        .iter()
        .map(|name| (*name).to_string())
        .zip(gb.feature_importances(FEATURE_NAMES.len()))
        .collect();

    let models = vec![
        Regressor::Linear(lr),
        Regressor::RandomForest(rf),
        Regressor::GradientBoosting(gb),
        Regressor::Xgboost(xgb),
    ];

    let mut report = PerformanceReport::new();
    for model in &models {
        let metrics = evaluate_on_original_scale(model, &x_test_scaled, &y_test)?;
        tracing::info!(
            model = model.name(),
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "held-out evaluation"
        );
        report.insert(model.name().to_string(), metrics);
    }

    let store = ArtifactStore::new(&config.artifact_dir);
    store.save(&scaler, &models, &report, &importances)?;
    tracing::info!(dir = %config.artifact_dir.display(), "artifacts saved");

    Ok(TrainingOutcome {
        report,
        best_params: search.params,
        n_samples: data.n_samples(),
        n_dropped: data.n_dropped,
    })
}
