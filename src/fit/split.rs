//! Reproducible train/evaluation split.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::ScoreError;

/// Row indices for the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded RNG and hold out `ceil(n * test_fraction)` rows.
///
/// Both partitions must end up non-empty.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<Split, ScoreError> {
    if !(test_fraction.is_finite() && test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ScoreError::InvalidInput(format!(
            "test_fraction must be in (0, 1), got {test_fraction}."
        )));
    }

    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ScoreError::TrainingDataInvalid(format!(
            "{n} valid row(s) cannot be split into non-empty train and test partitions."
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    Ok(Split { train, test: order })
}
