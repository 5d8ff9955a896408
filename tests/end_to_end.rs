//! End-to-end flow: train on a synthetic covariate table, persist the
//! artifact set, reload it, and serve predictions.

use pedon::prelude::*;
use std::collections::BTreeMap;
use std::io::Write;

/// Synthetic covariate table: shared trend plus independent jitter per
/// column, so the design matrix is full rank.
fn write_dataset(n: usize) -> tempfile::NamedTempFile {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(23);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "TPI,TRI,TWI,VDepth,VIS,NDVI_max,NDVI_median,NDVI_sd,SOC (%)"
    )
    .unwrap();
    for i in 0..n {
        let t = i as f64 / n as f64;
        let soc = 0.4 + 3.5 * t + (i % 4) as f64 * 0.08;
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{soc}",
            t - 0.5 + rng.gen_range(-0.1..0.1),
            0.1 + 0.3 * t + rng.gen_range(-0.05..0.05),
            3.0 + 9.0 * t + rng.gen_range(-0.5..0.5),
            4.0 + 25.0 * t + rng.gen_range(-1.0..1.0),
            0.45 - 0.25 * t + rng.gen_range(-0.05..0.05),
            0.25 + 0.65 * t + rng.gen_range(-0.05..0.05),
            0.15 + 0.55 * t + rng.gen_range(-0.05..0.05),
            0.01 + 0.06 * t + rng.gen_range(-0.005..0.005),
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

fn sample_request() -> PredictionRequest {
    PredictionRequest {
        TPI: 0.0,
        TRI: 0.25,
        TWI: 7.5,
        VDepth: 16.0,
        VIS: 0.33,
        NDVI_max: 0.58,
        NDVI_median: 0.43,
        NDVI_sd: 0.04,
    }
}

#[test]
fn train_save_load_predict() {
    let data = write_dataset(50);
    let tmp = tempfile::tempdir().unwrap();
    let artifact_dir = tmp.path().join("models");

    let config = TrainingConfig::new(data.path(), &artifact_dir);
    let outcome = run_training(&config).unwrap();

    // One metrics record per model, every value already rounded to 3dp
    assert_eq!(outcome.report.len(), 4);
    for (name, metrics) in &outcome.report {
        assert!(MODEL_NAMES.contains(&name.as_str()));
        for value in [metrics.mae, metrics.rmse, metrics.r2] {
            assert!(
                (value * 1000.0 - (value * 1000.0).round()).abs() < 1e-9,
                "{name} metric {value} not rounded to 3 decimals"
            );
        }
        assert!(metrics.mae >= 0.0);
        assert!(metrics.rmse >= metrics.mae);
    }

    // Fresh process: load artifacts from disk and serve
    let artifacts = ArtifactStore::new(&artifact_dir).load().unwrap();
    let context = ServiceContext::from_artifacts(artifacts).unwrap();
    let predictions = context.predict(&sample_request()).unwrap();

    assert_eq!(predictions.len(), 4);
    for name in MODEL_NAMES {
        let value = predictions[name];
        assert!((0.0..=100.0).contains(&value), "{name}: {value}");
    }
}

#[test]
fn missing_artifact_refuses_to_serve() {
    let data = write_dataset(40);
    let tmp = tempfile::tempdir().unwrap();
    let artifact_dir = tmp.path().join("models");

    run_training(&TrainingConfig::new(data.path(), &artifact_dir)).unwrap();
    std::fs::remove_file(artifact_dir.join("scaler.json")).unwrap();

    let err = ArtifactStore::new(&artifact_dir).load().unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("scaler.json"), "error should name the file: {msg}");
}

#[test]
fn log_space_model_known_output() {
    // A forest of depth-0 trees on a constant log-space target predicts
    // exactly log1p(c) for any input, so the served value must be
    // round(clamp(expm1(log1p(c)), 0, 100), 2) = c.
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let c = 2.37;
    let n = 12;
    let mut rng = StdRng::seed_from_u64(9);
    let x = Matrix::from_vec(
        n,
        8,
        (0..n * 8).map(|_| rng.gen_range(-1.0..1.0)).collect(),
    )
    .unwrap();
    let y_log = Vector::from_vec(vec![f64::ln_1p(c); n]);

    let mut scaler = StandardScaler::new();
    scaler.fit(&x).unwrap();

    let mut rf = RandomForestRegressor::new(5, 0).with_random_state(42);
    rf.fit(&scaler.transform(&x).unwrap(), &y_log).unwrap();

    let mut lr = LinearRegression::new();
    lr.fit(
        &scaler.transform(&x).unwrap(),
        &Vector::from_vec(vec![c; n]),
    )
    .unwrap();
    let mut gb = GradientBoostingRegressor::new(2, 0.1, 1);
    gb.fit(&scaler.transform(&x).unwrap(), &y_log).unwrap();
    let mut xgb = XgbRegressor::new(2, 0.1, 1);
    xgb.fit(&scaler.transform(&x).unwrap(), &y_log).unwrap();

    let context = ServiceContext::new(
        scaler,
        vec![
            Regressor::Linear(lr),
            Regressor::RandomForest(rf),
            Regressor::GradientBoosting(gb),
            Regressor::Xgboost(xgb),
        ],
    )
    .unwrap();

    let req = PredictionRequest {
        TPI: 1.0,
        TRI: 2.0,
        TWI: 3.0,
        VDepth: 4.0,
        VIS: 5.0,
        NDVI_max: 6.0,
        NDVI_median: 7.0,
        NDVI_sd: 8.0,
    };
    let predictions = context.predict(&req).unwrap();
    assert_eq!(predictions["RandomForest"], 2.37);
}

#[test]
fn repeat_training_is_reproducible() {
    let data = write_dataset(45);
    let tmp = tempfile::tempdir().unwrap();

    let a = run_training(&TrainingConfig::new(data.path(), tmp.path().join("a"))).unwrap();
    let b = run_training(&TrainingConfig::new(data.path(), tmp.path().join("b"))).unwrap();

    assert_eq!(a.best_params, b.best_params);
    assert_eq!(a.report, b.report);

    // The persisted artifact sets serve identical predictions
    let ctx_a = ServiceContext::from_artifacts(
        ArtifactStore::new(tmp.path().join("a")).load().unwrap(),
    )
    .unwrap();
    let ctx_b = ServiceContext::from_artifacts(
        ArtifactStore::new(tmp.path().join("b")).load().unwrap(),
    )
    .unwrap();
    assert_eq!(
        ctx_a.predict(&sample_request()).unwrap(),
        ctx_b.predict(&sample_request()).unwrap()
    );
}

#[test]
fn feature_importances_persisted_and_normalized() {
    let data = write_dataset(40);
    let tmp = tempfile::tempdir().unwrap();
    let artifact_dir = tmp.path().join("models");

    run_training(&TrainingConfig::new(data.path(), &artifact_dir)).unwrap();

    let raw = std::fs::read_to_string(artifact_dir.join("feature_importance.json")).unwrap();
    let importances: BTreeMap<String, f64> = serde_json::from_str(&raw).unwrap();

    assert_eq!(importances.len(), 8);
    for name in FEATURE_NAMES {
        assert!(importances.contains_key(name), "missing {name}");
    }
    let total: f64 = importances.values().sum();
    assert!((total - 1.0).abs() < 1e-9, "importances sum to {total}");
}
