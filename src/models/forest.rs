//! Bagged ensemble of regression trees.
//!
//! Each tree is grown on a bootstrap resample (n draws with replacement) of the
//! training rows and the ensemble predicts the mean of its trees.
//!
//! Trees are grown in parallel. Every tree owns an RNG seeded from
//! `(config.seed, tree index)`, and rayon's indexed `collect` keeps tree order,
//! so results do not depend on thread scheduling.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ForestConfig;
use crate::error::ScoreError;
use crate::models::tree::RegressionTree;

/// Upper bound on `max_depth`; tree growth recurses once per level.
pub const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    config: ForestConfig,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit the ensemble on scaled features `x` (rows = samples) and target `y`.
    pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, config: &ForestConfig) -> Result<Self, ScoreError> {
        validate_config(config)?;
        if x.nrows() == 0 {
            return Err(ScoreError::TrainingDataInvalid("No rows to fit.".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(ScoreError::TrainingDataInvalid(format!(
                "Feature rows ({}) and targets ({}) differ.",
                x.nrows(),
                y.len()
            )));
        }

        let n = x.nrows();
        let targets = y.as_slice();
        let trees: Vec<RegressionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(config.seed, t as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let tree = RegressionTree::fit(x, targets, &sample, config);
                debug!(tree = t, nodes = tree.node_count(), depth = tree.depth(), "grew tree");
                tree
            })
            .collect();

        Ok(Self {
            n_features: x.ncols(),
            config: *config,
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Predict one (scaled) sample.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ScoreError> {
        if row.len() != self.n_features {
            return Err(ScoreError::ModelStateMismatch(format!(
                "Forest expects {} feature(s) but received {}.",
                self.n_features,
                row.len()
            )));
        }
        if self.trees.is_empty() {
            return Err(ScoreError::ModelStateMismatch("Forest has no trees.".to_string()));
        }
        let total: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        Ok(total / self.trees.len() as f64)
    }

    /// Predict every row of a (scaled) matrix.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ScoreError> {
        x.row_iter()
            .map(|row| {
                let row: Vec<f64> = row.iter().copied().collect();
                self.predict_row(&row)
            })
            .collect()
    }

    /// Structural checks for a forest read back from disk.
    pub fn check_structure(&self) -> Result<(), ScoreError> {
        if self.trees.is_empty() {
            return Err(ScoreError::ModelStateMismatch("Forest has no trees.".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check_structure(self.n_features)
                .map_err(|e| ScoreError::ModelStateMismatch(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }
}

fn validate_config(config: &ForestConfig) -> Result<(), ScoreError> {
    if config.n_trees == 0 {
        return Err(ScoreError::InvalidInput("n_trees must be >= 1.".to_string()));
    }
    if config.max_depth == 0 || config.max_depth > MAX_TREE_DEPTH {
        return Err(ScoreError::InvalidInput(format!(
            "max_depth must be between 1 and {MAX_TREE_DEPTH} (got {}).",
            config.max_depth
        )));
    }
    if config.min_samples_split < 2 {
        return Err(ScoreError::InvalidInput("min_samples_split must be >= 2.".to_string()));
    }
    if config.min_samples_leaf == 0 {
        return Err(ScoreError::InvalidInput("min_samples_leaf must be >= 1.".to_string()));
    }
    Ok(())
}

/// SplitMix64 over `(seed, index)` so neighbouring trees get unrelated streams.
fn tree_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
