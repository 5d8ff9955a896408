//! Training CLI: fit the SOC model roster and persist artifacts.

use clap::Parser;
use pedon::pipeline::{run_training, TrainingConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "pedon-train", about = "Train the SOC prediction models", version)]
struct Args {
    /// Training CSV with the eight covariates and the SOC (%) column
    #[arg(long, default_value = "data/soildata.csv")]
    data: PathBuf,

    /// Directory receiving the artifact set
    #[arg(long, default_value = "models")]
    out: PathBuf,

    /// Held-out fraction of the dataset
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Seed for the split, CV folds, and forest bootstrap
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = TrainingConfig {
        data_path: args.data,
        artifact_dir: args.out,
        test_size: args.test_size,
        seed: args.seed,
    };

    match run_training(&config) {
        Ok(outcome) => {
            println!("Training complete: {} samples ({} dropped)", outcome.n_samples, outcome.n_dropped);
            println!(
                "Best GradientBoosting params: n_estimators={}, learning_rate={}, max_depth={}",
                outcome.best_params.n_estimators,
                outcome.best_params.learning_rate,
                outcome.best_params.max_depth
            );
            println!("\nHeld-out performance:");
            for (model, metrics) in &outcome.report {
                println!(
                    "  {model:<18} MAE={:.3}  RMSE={:.3}  R²={:.3}",
                    metrics.mae, metrics.rmse, metrics.r2
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "training failed");
            ExitCode::FAILURE
        }
    }
}
