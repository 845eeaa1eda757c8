//! Trained estimator state and inference.
//!
//! The state bundles the forest with the input and output scalers it was
//! trained with. The three are only ever created, stored and loaded together;
//! `check_consistency` is run on every load so a mismatched set is rejected
//! instead of producing a wrong number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{FEATURE_COUNT, FEATURE_ORDER, FeatureVector, TrainDiagnostics};
use crate::error::ScoreError;
use crate::math::MinMaxScaler;
use crate::models::forest::RandomForest;

/// Bumped whenever the persisted layout changes.
pub const STATE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedEstimatorState {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    /// Column names in the order the input scaler and forest expect.
    pub feature_order: Vec<String>,
    pub input_scaler: MinMaxScaler,
    pub output_scaler: MinMaxScaler,
    pub forest: RandomForest,
    pub diagnostics: TrainDiagnostics,
}

impl TrainedEstimatorState {
    pub fn new(
        input_scaler: MinMaxScaler,
        output_scaler: MinMaxScaler,
        forest: RandomForest,
        diagnostics: TrainDiagnostics,
    ) -> Self {
        Self {
            format_version: STATE_FORMAT_VERSION,
            trained_at: Utc::now(),
            feature_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            input_scaler,
            output_scaler,
            forest,
            diagnostics,
        }
    }

    /// Verify that model and scalers belong together.
    pub fn check_consistency(&self) -> Result<(), ScoreError> {
        if self.format_version != STATE_FORMAT_VERSION {
            return Err(ScoreError::ModelStateMismatch(format!(
                "Unsupported state format version {} (expected {STATE_FORMAT_VERSION}).",
                self.format_version
            )));
        }
        if self.feature_order.iter().map(String::as_str).ne(FEATURE_ORDER) {
            return Err(ScoreError::ModelStateMismatch(format!(
                "Feature order {:?} does not match expected {:?}.",
                self.feature_order, FEATURE_ORDER
            )));
        }
        if !self.input_scaler.is_well_formed() || !self.output_scaler.is_well_formed() {
            return Err(ScoreError::ModelStateMismatch(
                "Scaler parameters are malformed.".to_string(),
            ));
        }
        if self.input_scaler.n_features() != FEATURE_COUNT {
            return Err(ScoreError::ModelStateMismatch(format!(
                "Input scaler has {} feature(s), expected {FEATURE_COUNT}.",
                self.input_scaler.n_features()
            )));
        }
        if self.output_scaler.n_features() != 1 {
            return Err(ScoreError::ModelStateMismatch(format!(
                "Output scaler has {} column(s), expected 1.",
                self.output_scaler.n_features()
            )));
        }
        if self.forest.n_features() != self.input_scaler.n_features() {
            return Err(ScoreError::ModelStateMismatch(format!(
                "Forest expects {} feature(s) but the input scaler produces {}.",
                self.forest.n_features(),
                self.input_scaler.n_features()
            )));
        }
        self.forest.check_structure()
    }
}

/// Read-only predictor over a consistent state. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct Estimator {
    state: TrainedEstimatorState,
}

impl Estimator {
    pub fn new(state: TrainedEstimatorState) -> Result<Self, ScoreError> {
        state.check_consistency()?;
        Ok(Self { state })
    }

    pub fn state(&self) -> &TrainedEstimatorState {
        &self.state
    }

    /// Predict the unified score in original units.
    ///
    /// No clamping: inputs outside the training bounds are extrapolated by the
    /// forest (flat beyond the data) and may not match the deterministic path.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let raw = features.to_array();
        if let Some(v) = raw.iter().find(|v| !v.is_finite()) {
            return Err(ScoreError::InvalidInput(format!("Non-finite score: {v}")));
        }

        for ((name, value), (lo, hi)) in FEATURE_ORDER.iter().zip(raw).zip(self.state.input_scaler.bounds()) {
            if value < lo || value > hi {
                warn!(feature = %name, value, lo, hi, "input outside training range; prediction is extrapolated");
            }
        }

        let scaled = self.state.input_scaler.transform_row(&raw)?;
        let y_scaled = self.state.forest.predict_row(&scaled)?;
        self.state.output_scaler.inverse_scalar(y_scaled)
    }

    /// Predict from positional values in `FEATURE_ORDER` (equifax, transunion, experian).
    pub fn predict_values(&self, values: &[f64]) -> Result<f64, ScoreError> {
        self.predict(&FeatureVector::from_slice(values)?)
    }
}
