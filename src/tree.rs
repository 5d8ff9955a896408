//! Regression trees and the random forest ensemble.
//!
//! The decision tree here is the shared building block: the random
//! forest bags seeded bootstrap replicas of it, and the boosting models
//! in [`crate::boosting`] stack shallow instances of it on residuals.

use crate::error::{PedonError, Result};
use crate::primitives::{Matrix, Vector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A node in a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node carrying the predicted value and the number of
    /// training samples that reached it.
    Leaf {
        /// Predicted value for samples reaching this leaf
        value: f64,
        /// Training samples that landed here
        n_samples: usize,
    },
    /// Internal split node.
    Split {
        /// Feature column index to test
        feature: usize,
        /// Threshold: samples with value <= threshold go left
        threshold: f64,
        /// Left subtree
        left: Box<TreeNode>,
        /// Right subtree
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict_one(&self, sample: &Vector) -> f64 {
        match self {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.predict_one(sample)
                } else {
                    right.predict_one(sample)
                }
            }
        }
    }

    /// Scales every leaf value by `n / (n + lambda)`, where n is the
    /// leaf's sample count. With squared loss and unit hessians this is
    /// exactly the L2-regularized leaf weight.
    fn shrink_leaves(&mut self, lambda: f64) {
        match self {
            TreeNode::Leaf { value, n_samples } => {
                let n = *n_samples as f64;
                *value *= n / (n + lambda);
            }
            TreeNode::Split { left, right, .. } => {
                left.shrink_leaves(lambda);
                right.shrink_leaves(lambda);
            }
        }
    }

    /// Accumulates per-feature split counts into `counts`.
    fn accumulate_split_counts(&self, counts: &mut [f64]) {
        if let TreeNode::Split {
            feature,
            left,
            right,
            ..
        } = self
        {
            if *feature < counts.len() {
                counts[*feature] += 1.0;
            }
            left.accumulate_split_counts(counts);
            right.accumulate_split_counts(counts);
        }
    }
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sse_around_mean(values: &[f64]) -> f64 {
    let m = mean_of(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

/// Finds the variance-minimizing split over all features, or `None` if
/// no split satisfies `min_samples_leaf` on both sides.
fn find_best_split(
    x: &Matrix,
    y: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<BestSplit> {
    let n_features = x.n_cols();
    let mut best: Option<BestSplit> = None;

    for feature in 0..n_features {
        // Sort candidate rows by this feature so thresholds are visited
        // in order and midpoints are well-defined.
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            x.get(a, feature)
                .partial_cmp(&x.get(b, feature))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for i in 0..sorted.len().saturating_sub(1) {
            let v_lo = x.get(sorted[i], feature);
            let v_hi = x.get(sorted[i + 1], feature);
            if v_lo == v_hi {
                continue;
            }
            let threshold = (v_lo + v_hi) / 2.0;

            let n_left = i + 1;
            let n_right = sorted.len() - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let left: Vec<f64> = sorted[..n_left].iter().map(|&idx| y[idx]).collect();
            let right: Vec<f64> = sorted[n_left..].iter().map(|&idx| y[idx]).collect();
            let sse = sse_around_mean(&left) + sse_around_mean(&right);

            let better = match &best {
                Some(b) => sse < b.sse,
                None => true,
            };
            if better {
                best = Some(BestSplit {
                    feature,
                    threshold,
                    sse,
                });
            }
        }
    }

    best
}

fn build_tree(
    x: &Matrix,
    y: &[f64],
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
) -> TreeNode {
    let values: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
    let leaf = TreeNode::Leaf {
        value: mean_of(&values),
        n_samples: indices.len(),
    };

    if depth >= max_depth || indices.len() < min_samples_split {
        return leaf;
    }
    // Pure node: splitting cannot reduce variance.
    if sse_around_mean(&values) < 1e-12 {
        return leaf;
    }

    let Some(split) = find_best_split(x, y, indices, min_samples_leaf) else {
        return leaf;
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x.get(i, split.feature) <= split.threshold);

    if left_idx.is_empty() || right_idx.is_empty() {
        return leaf;
    }

    TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(build_tree(
            x,
            y,
            &left_idx,
            depth + 1,
            max_depth,
            min_samples_split,
            min_samples_leaf,
        )),
        right: Box::new(build_tree(
            x,
            y,
            &right_idx,
            depth + 1,
            max_depth,
            min_samples_split,
            min_samples_leaf,
        )),
    }
}

/// A single CART-style regression tree (variance-reduction splits,
/// mean-value leaves).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    tree: Option<TreeNode>,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl DecisionTreeRegressor {
    /// Creates a new unfitted tree with the given maximum depth.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            tree: None,
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    /// Sets the minimum number of samples required to split a node.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Sets the minimum number of samples required at a leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Returns true if the tree has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.tree.is_some()
    }

    /// Fits the tree on the given data.
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions don't match or the data is empty.
    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        let (n_samples, _) = x.shape();
        if n_samples != y.len() {
            return Err(PedonError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }
        if n_samples == 0 {
            return Err("cannot fit tree with zero samples".into());
        }

        let indices: Vec<usize> = (0..n_samples).collect();
        self.tree = Some(build_tree(
            x,
            y.as_slice(),
            &indices,
            0,
            self.max_depth,
            self.min_samples_split,
            self.min_samples_leaf,
        ));
        Ok(())
    }

    /// Predicts target values for each row of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree is not fitted.
    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| PedonError::prediction("DecisionTreeRegressor is not fitted"))?;

        let predictions: Vec<f64> = (0..x.n_rows())
            .map(|i| tree.predict_one(&x.row(i)))
            .collect();
        Ok(Vector::from_vec(predictions))
    }

    /// Applies L2 leaf shrinkage to the fitted tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree is not fitted or lambda is negative.
    pub fn regularize_leaves(&mut self, lambda: f64) -> Result<()> {
        if lambda < 0.0 {
            return Err(PedonError::InvalidHyperparameter {
                param: "reg_lambda".to_string(),
                value: lambda.to_string(),
                constraint: ">= 0".to_string(),
            });
        }
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| PedonError::prediction("DecisionTreeRegressor is not fitted"))?;
        tree.shrink_leaves(lambda);
        Ok(())
    }

    /// Adds this tree's per-feature split counts into `counts`.
    pub(crate) fn accumulate_split_counts(&self, counts: &mut [f64]) {
        if let Some(tree) = &self.tree {
            tree.accumulate_split_counts(counts);
        }
    }
}

/// Draws a bootstrap sample of row indices (with replacement).
#[must_use]
pub fn bootstrap_sample(n_samples: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Random forest regressor: bagged regression trees, predictions
/// averaged across the ensemble.
///
/// With a fixed `random_state` every tree sees the bootstrap sample
/// seeded `random_state + tree_index`, so refitting on the same data
/// reproduces the forest exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    max_depth: usize,
    random_state: Option<u64>,
}

impl RandomForestRegressor {
    /// Creates a new unfitted forest.
    #[must_use]
    pub fn new(n_estimators: usize, max_depth: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth,
            random_state: None,
        }
    }

    /// Sets the random seed for bootstrap sampling.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Returns true if the forest has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Returns the number of trees configured for this forest.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Fits the forest on the given data.
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions don't match or the data is empty.
    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        let (n_samples, _) = x.shape();
        if n_samples != y.len() {
            return Err(PedonError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }
        if n_samples == 0 {
            return Err("cannot fit forest with zero samples".into());
        }
        if self.n_estimators == 0 {
            return Err(PedonError::InvalidHyperparameter {
                param: "n_estimators".to_string(),
                value: "0".to_string(),
                constraint: "> 0".to_string(),
            });
        }

        self.trees = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let seed = self.random_state.map(|s| s.wrapping_add(i as u64));
            let indices = bootstrap_sample(n_samples, seed);

            let x_boot = x.take_rows(&indices);
            let y_boot =
                Vector::from_vec(indices.iter().map(|&idx| y[idx]).collect::<Vec<f64>>());

            let mut tree = DecisionTreeRegressor::new(self.max_depth);
            tree.fit(&x_boot, &y_boot)?;
            self.trees.push(tree);
        }
        Ok(())
    }

    /// Predicts by averaging over all trees.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is not fitted.
    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        if self.trees.is_empty() {
            return Err(PedonError::prediction(
                "RandomForestRegressor is not fitted",
            ));
        }

        let mut sums = vec![0.0; x.n_rows()];
        for tree in &self.trees {
            let preds = tree.predict(x)?;
            for (sum, p) in sums.iter_mut().zip(preds.as_slice()) {
                *sum += p;
            }
        }

        let n = self.trees.len() as f64;
        Ok(Vector::from_vec(sums.into_iter().map(|s| s / n).collect()))
    }
}
