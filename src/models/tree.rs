//! CART-style regression tree.
//!
//! Splits minimize the summed squared error of the two children. Candidate
//! thresholds are midpoints between consecutive distinct feature values; a
//! sample goes left when `x[feature] <= threshold`. Leaves predict the mean
//! target of their samples.
//!
//! Nodes live in a flat arena (`Vec<Node>`), root at index 0, so the tree
//! serializes as plain data.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::ForestConfig;

/// Minimum SSE reduction for a split to be kept.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` listed in `samples` (duplicates allowed,
    /// which is how bootstrap resamples are expressed).
    ///
    /// # Panics
    /// Panics if `samples` is empty or indexes past `x`/`y`. Callers validate
    /// dataset shape first.
    pub fn fit(x: &DMatrix<f64>, y: &[f64], samples: &[usize], params: &ForestConfig) -> Self {
        let mut nodes = Vec::new();
        let mut idx = samples.to_vec();
        grow(&mut nodes, x, y, &mut idx, 0, params);
        Self { nodes }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes[at] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((at, level)) = stack.pop() {
            match self.nodes.get(at) {
                Some(Node::Split { left, right, .. }) => {
                    stack.push((*left, level + 1));
                    stack.push((*right, level + 1));
                }
                _ => deepest = deepest.max(level),
            }
        }
        deepest
    }

    /// Check that every reference stays inside the arena and the tree.
    ///
    /// Children must have a larger index than their parent (true for trees
    /// grown by `fit`), which also rules out cycles.
    pub fn check_structure(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(format!("node {i}: non-finite leaf value"));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!("node {i}: feature {feature} >= {n_features}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i}: non-finite threshold"));
                    }
                    if left <= i || right <= i || left >= self.nodes.len() || right >= self.nodes.len() {
                        return Err(format!("node {i}: child index out of bounds"));
                    }
                }
            }
        }
        Ok(())
    }
}

fn grow(
    nodes: &mut Vec<Node>,
    x: &DMatrix<f64>,
    y: &[f64],
    idx: &mut [usize],
    depth: usize,
    params: &ForestConfig,
) -> usize {
    let at = nodes.len();
    let n = idx.len();
    let sum: f64 = idx.iter().map(|&i| y[i]).sum();
    let mean = sum / n as f64;
    nodes.push(Node::Leaf { value: mean });

    let min_leaf = params.min_samples_leaf.max(1);
    if depth >= params.max_depth || n < params.min_samples_split || n < 2 * min_leaf {
        return at;
    }

    let Some(best) = best_split(x, y, idx, min_leaf) else {
        return at;
    };
    // Parent proxy is sum² / n; the split must beat it.
    if best.score <= sum * sum / n as f64 + MIN_GAIN {
        return at;
    }

    let mid = partition(idx, |i| x[(i, best.feature)] <= best.threshold);
    if mid == 0 || mid == n {
        return at;
    }

    let (left_idx, right_idx) = idx.split_at_mut(mid);
    let left = grow(nodes, x, y, left_idx, depth + 1, params);
    let right = grow(nodes, x, y, right_idx, depth + 1, params);
    nodes[at] = Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left,
        right,
    };
    at
}

/// Find the split maximizing `sum_l² / n_l + sum_r² / n_r`, which is the same
/// as minimizing the children's summed squared error.
fn best_split(x: &DMatrix<f64>, y: &[f64], idx: &[usize], min_leaf: usize) -> Option<BestSplit> {
    let n = idx.len();
    let total: f64 = idx.iter().map(|&i| y[i]).sum();
    let mut best: Option<BestSplit> = None;
    let mut order = idx.to_vec();

    for feature in 0..x.ncols() {
        order.sort_by(|&a, &b| {
            x[(a, feature)]
                .partial_cmp(&x[(b, feature)])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        for pos in 1..n {
            left_sum += y[order[pos - 1]];
            let n_left = pos;
            let n_right = n - pos;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let lo = x[(order[pos - 1], feature)];
            let hi = x[(order[pos], feature)];
            if lo >= hi {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
            if best.is_none_or(|b| score > b.score) {
                let mut threshold = lo + (hi - lo) / 2.0;
                // Adjacent floats can round the midpoint up to `hi`.
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}

/// Stable-enough in-place partition; returns the count of elements matching `pred`.
fn partition(idx: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for k in 0..idx.len() {
        if pred(idx[k]) {
            idx.swap(mid, k);
            mid += 1;
        }
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_depth: usize) -> ForestConfig {
        ForestConfig {
            n_trees: 1,
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 0,
        }
    }

    #[test]
    fn step_function_is_learned_exactly() {
        let x = DMatrix::from_row_slice(6, 1, &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        let y = [1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        let all: Vec<usize> = (0..6).collect();
        let tree = RegressionTree::fit(&x, &y, &all, &params(3));

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&[1.5]), 1.0);
        assert_eq!(tree.predict(&[11.0]), 5.0);
        // Midpoint threshold between 2 and 10.
        assert_eq!(tree.predict(&[5.9]), 1.0);
        assert_eq!(tree.predict(&[6.1]), 5.0);
        assert!(tree.check_structure(1).is_ok());
    }

    #[test]
    fn picks_the_informative_feature() {
        // Feature 0 is noise, feature 1 determines y.
        let x = DMatrix::from_row_slice(4, 2, &[3.0, 0.0, 1.0, 0.0, 4.0, 1.0, 2.0, 1.0]);
        let y = [0.0, 0.0, 10.0, 10.0];
        let tree = RegressionTree::fit(&x, &y, &[0, 1, 2, 3], &params(4));
        assert_eq!(tree.predict(&[100.0, 0.0]), 0.0);
        assert_eq!(tree.predict(&[-100.0, 1.0]), 10.0);
    }

    #[test]
    fn depth_and_leaf_limits_are_respected() {
        let x = DMatrix::from_fn(32, 1, |i, _| i as f64);
        let y: Vec<f64> = (0..32).map(|i| (i * i) as f64).collect();
        let all: Vec<usize> = (0..32).collect();

        let stump = RegressionTree::fit(&x, &y, &all, &params(1));
        assert_eq!(stump.depth(), 1);
        assert_eq!(stump.node_count(), 3);

        let mut p = params(10);
        p.min_samples_leaf = 8;
        let coarse = RegressionTree::fit(&x, &y, &all, &p);
        // 32 samples, >= 8 per leaf → at most 4 leaves, 7 nodes.
        assert!(coarse.node_count() <= 7);
    }

    #[test]
    fn constant_target_yields_single_leaf() {
        let x = DMatrix::from_fn(10, 2, |i, j| (i + j) as f64);
        let y = [3.0; 10];
        let tree = RegressionTree::fit(&x, &y, &(0..10).collect::<Vec<_>>(), &params(5));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&[0.0, 0.0]), 3.0);
    }

    #[test]
    fn structure_check_catches_bad_feature_index() {
        let tree = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: 3,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: 0.0 },
                Node::Leaf { value: 1.0 },
            ],
        };
        assert!(tree.check_structure(3).is_err());
        assert!(tree.check_structure(4).is_ok());
    }
}
