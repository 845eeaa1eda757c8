//! Estimator training.
//!
//! Given validated training records:
//! 1. split rows into train / test (seeded)
//! 2. fit input and output min-max scalers on the train partition only
//! 3. fit the forest on scaled features → scaled target
//! 4. score R² on both partitions (scaled space)
//!
//! and return the state ready to persist. The fit metrics are diagnostics:
//! training succeeds whatever their value.

use nalgebra::{DMatrix, DVector};
use tracing::{info, warn};

use crate::domain::{FEATURE_COUNT, TrainDiagnostics, TrainOptions, TrainingRecord};
use crate::error::ScoreError;
use crate::fit::split::train_test_split;
use crate::math::{MinMaxScaler, r2_score};
use crate::models::{RandomForest, TrainedEstimatorState};

/// Train–test R² gap above which we flag possible overfitting.
pub const OVERFIT_R2_GAP: f64 = 0.1;

/// Train an estimator on `records`. `rows_read` is carried into the diagnostics.
pub fn train_estimator(
    records: &[TrainingRecord],
    rows_read: usize,
    options: &TrainOptions,
) -> Result<TrainedEstimatorState, ScoreError> {
    if records.is_empty() {
        return Err(ScoreError::TrainingDataInvalid("No valid rows to train on.".to_string()));
    }

    let split = train_test_split(records.len(), options.test_fraction, options.split_seed)?;
    info!(train = split.train.len(), test = split.test.len(), "split dataset");

    let (x_train, y_train) = design(records, &split.train);
    let (x_test, y_test) = design(records, &split.test);

    let input_scaler = MinMaxScaler::fit(&x_train)?;
    let output_scaler = MinMaxScaler::fit_vector(&y_train)?;

    let xs_train = input_scaler.transform(&x_train)?;
    let xs_test = input_scaler.transform(&x_test)?;
    let ys_train = output_scaler.transform_vector(&y_train)?;
    let ys_test = output_scaler.transform_vector(&y_test)?;

    info!(
        trees = options.forest.n_trees,
        max_depth = options.forest.max_depth,
        seed = options.forest.seed,
        "fitting forest"
    );
    let forest = RandomForest::fit(&xs_train, &ys_train, &options.forest)?;

    let train_r2 = r2_on(&forest, &xs_train, &ys_train)?;
    let test_r2 = r2_on(&forest, &xs_test, &ys_test)?;
    let overfit_suspected = train_r2 - test_r2 > OVERFIT_R2_GAP;
    if overfit_suspected {
        warn!(train_r2, test_r2, "test R² is materially worse than train R²; possible overfit");
    }
    info!(train_r2, test_r2, "fit complete");

    let diagnostics = TrainDiagnostics {
        rows_read,
        rows_used: records.len(),
        n_train: split.train.len(),
        n_test: split.test.len(),
        train_r2,
        test_r2,
        overfit_suspected,
    };

    Ok(TrainedEstimatorState::new(input_scaler, output_scaler, forest, diagnostics))
}

/// Raw feature matrix (FEATURE_ORDER columns) and target for the selected rows.
fn design(records: &[TrainingRecord], rows: &[usize]) -> (DMatrix<f64>, DVector<f64>) {
    let x = DMatrix::from_fn(rows.len(), FEATURE_COUNT, |i, j| records[rows[i]].features.to_array()[j]);
    let y = DVector::from_fn(rows.len(), |i, _| records[rows[i]].unified);
    (x, y)
}

fn r2_on(forest: &RandomForest, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<f64, ScoreError> {
    let pred = forest.predict(x)?;
    r2_score(y.as_slice(), &pred)
        .ok_or_else(|| ScoreError::TrainingDataInvalid("Cannot score an empty partition.".to_string()))
}
