//! Train/test splitting, K-fold cross-validation, and the gradient
//! boosting grid search.
//!
//! All randomness is seeded, so the same dataset and seed always
//! produce the same split, the same folds, and the same winning
//! hyperparameters.

use crate::boosting::GradientBoostingRegressor;
use crate::error::{PedonError, Result};
use crate::metrics::r_squared;
use crate::primitives::{Matrix, Vector};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Splits data into random train and test subsets.
///
/// `test_size` is the fraction of samples to place in the test split.
/// Rows are shuffled before the split; with `random_state` set the
/// shuffle is reproducible.
///
/// Returns `(x_train, x_test, y_train, y_test)`.
///
/// # Errors
///
/// Returns an error if dimensions don't match, `test_size` is outside
/// (0, 1), or either resulting split would be empty.
pub fn train_test_split(
    x: &Matrix,
    y: &Vector,
    test_size: f64,
    random_state: Option<u64>,
) -> Result<(Matrix, Matrix, Vector, Vector)> {
    let (n_samples, _) = x.shape();

    if n_samples != y.len() {
        return Err(PedonError::dimension_mismatch(
            "samples",
            n_samples,
            y.len(),
        ));
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PedonError::InvalidHyperparameter {
            param: "test_size".to_string(),
            value: test_size.to_string(),
            constraint: "in (0, 1)".to_string(),
        });
    }

    let n_test = ((n_samples as f64) * test_size).round() as usize;
    if n_test == 0 || n_test == n_samples {
        return Err(PedonError::config(format!(
            "cannot split {n_samples} samples with test_size {test_size}: \
             both splits must be non-empty"
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = match random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    let x_train = x.take_rows(train_idx);
    let x_test = x.take_rows(test_idx);
    let y_train = Vector::from_vec(train_idx.iter().map(|&i| y[i]).collect());
    let y_test = Vector::from_vec(test_idx.iter().map(|&i| y[i]).collect());

    Ok((x_train, x_test, y_train, y_test))
}

/// K-fold cross-validation index generator.
///
/// Yields `(train_indices, validation_indices)` pairs where each fold
/// serves once as validation. The first `n_samples % k` folds absorb
/// the remainder samples.
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl KFold {
    /// Creates a new K-fold generator without shuffling.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    /// Enables shuffling before folding.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Sets the shuffle seed.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generates the fold index pairs for `n_samples` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer samples than folds or
    /// fewer than 2 folds.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 {
            return Err(PedonError::InvalidHyperparameter {
                param: "n_splits".to_string(),
                value: self.n_splits.to_string(),
                constraint: ">= 2".to_string(),
            });
        }
        if n_samples < self.n_splits {
            return Err(PedonError::config(format!(
                "cannot make {} folds from {n_samples} samples",
                self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = match self.random_state {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            indices.shuffle(&mut rng);
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < remainder);
            let val: Vec<usize> = indices[start..start + size].to_vec();
            let train: Vec<usize> = indices[..start]
                .iter()
                .chain(&indices[start + size..])
                .copied()
                .collect();
            folds.push((train, val));
            start += size;
        }

        Ok(folds)
    }
}

/// One gradient boosting hyperparameter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbParams {
    /// Number of boosting stages
    pub n_estimators: usize,
    /// Stage shrinkage
    pub learning_rate: f64,
    /// Depth of each stage tree
    pub max_depth: usize,
}

/// Result of the grid search: the winning configuration and its mean
/// cross-validated R².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSearchOutcome {
    /// Winning hyperparameters
    pub params: GbParams,
    /// Mean validation R² across folds, in fitting space
    pub mean_r2: f64,
}

/// The fixed search grid: 3 x 3 x 3 = 27 configurations.
#[must_use]
pub fn gb_param_grid() -> Vec<GbParams> {
    let mut grid = Vec::with_capacity(27);
    for &n_estimators in &[100, 200, 300] {
        for &learning_rate in &[0.01, 0.05, 0.1] {
            for &max_depth in &[3, 5, 7] {
                grid.push(GbParams {
                    n_estimators,
                    learning_rate,
                    max_depth,
                });
            }
        }
    }
    grid
}

/// Mean validation R² for one configuration across the given folds.
fn cross_validate_gb(
    params: GbParams,
    x: &Matrix,
    y: &Vector,
    folds: &[(Vec<usize>, Vec<usize>)],
) -> Result<f64> {
    let mut total = 0.0;
    for (train_idx, val_idx) in folds {
        let x_train = x.take_rows(train_idx);
        let y_train = Vector::from_vec(train_idx.iter().map(|&i| y[i]).collect());
        let x_val = x.take_rows(val_idx);
        let y_val = Vector::from_vec(val_idx.iter().map(|&i| y[i]).collect());

        let mut model = GradientBoostingRegressor::new(
            params.n_estimators,
            params.learning_rate,
            params.max_depth,
        );
        model.fit(&x_train, &y_train)?;
        let preds = model.predict(&x_val)?;
        total += r_squared(&preds, &y_val);
    }
    Ok(total / folds.len() as f64)
}

/// Exhaustive 5-fold grid search for the gradient boosting model.
///
/// `x` and `y` are the training split with `y` already in fitting
/// space; scoring happens in that same space. Configurations are
/// evaluated in parallel, and the winner is the highest mean R² with
/// ties broken by grid order, so the outcome is deterministic.
///
/// The caller refits the winner on the full training split.
///
/// # Errors
///
/// Returns an error if folding fails or any candidate fails to fit.
pub fn grid_search_gb(x: &Matrix, y: &Vector, seed: u64) -> Result<GridSearchOutcome> {
    let folds = KFold::new(5)
        .with_shuffle(true)
        .with_random_state(seed)
        .split(x.n_rows())?;

    let grid = gb_param_grid();
    let scores: Vec<Result<f64>> = grid
        .par_iter()
        .map(|&params| cross_validate_gb(params, x, y, &folds))
        .collect();

    let mut best: Option<GridSearchOutcome> = None;
    for (params, score) in grid.into_iter().zip(scores) {
        let mean_r2 = score?;
        let better = match &best {
            Some(b) => mean_r2 > b.mean_r2,
            None => true,
        };
        if better {
            best = Some(GridSearchOutcome { params, mean_r2 });
        }
    }

    best.ok_or_else(|| PedonError::from("empty hyperparameter grid"))
}
