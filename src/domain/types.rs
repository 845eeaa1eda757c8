//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the deterministic scoring path
//! - exported to JSON/CSV
//! - persisted as part of the trained estimator state

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Credit bureau supplying one raw score per customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bureau {
    Experian,
    Equifax,
    TransUnion,
}

impl Bureau {
    /// Reporting order. Not the estimator feature order (see `FEATURE_ORDER`).
    pub const ALL: [Bureau; 3] = [Bureau::Experian, Bureau::Equifax, Bureau::TransUnion];

    pub fn display_name(self) -> &'static str {
        match self {
            Bureau::Experian => "Experian",
            Bureau::Equifax => "Equifax",
            Bureau::TransUnion => "TransUnion",
        }
    }

    /// Native score range published by the bureau.
    pub fn native_range(self) -> ScoreRange {
        match self {
            Bureau::Experian | Bureau::TransUnion => CANONICAL_RANGE,
            Bureau::Equifax => ScoreRange { min: 300.0, max: 900.0 },
        }
    }
}

impl std::fmt::Display for Bureau {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Common scale every normalized score lives on.
pub const CANONICAL_RANGE: ScoreRange = ScoreRange { min: 300.0, max: 850.0 };

/// Raw bureau readings for one customer. Any reading may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomerCreditProfile {
    pub customer_id: String,
    pub experian: Option<f64>,
    pub equifax: Option<f64>,
    pub transunion: Option<f64>,
}

impl CustomerCreditProfile {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            ..Self::default()
        }
    }

    pub fn with_reading(mut self, bureau: Bureau, value: Option<f64>) -> Self {
        match bureau {
            Bureau::Experian => self.experian = value,
            Bureau::Equifax => self.equifax = value,
            Bureau::TransUnion => self.transunion = value,
        }
        self
    }

    pub fn reading(&self, bureau: Bureau) -> Option<f64> {
        match bureau {
            Bureau::Experian => self.experian,
            Bureau::Equifax => self.equifax,
            Bureau::TransUnion => self.transunion,
        }
    }
}

/// A bureau score on the canonical range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScore {
    pub value: f64,
    /// `true` when the bureau was missing and the value is the mean of the others.
    pub imputed: bool,
}

/// Output of the normalizer: one canonical score per bureau, gaps filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedScores {
    pub experian: NormalizedScore,
    pub equifax: NormalizedScore,
    pub transunion: NormalizedScore,
}

impl NormalizedScores {
    pub fn get(&self, bureau: Bureau) -> NormalizedScore {
        match bureau {
            Bureau::Experian => self.experian,
            Bureau::Equifax => self.equifax,
            Bureau::TransUnion => self.transunion,
        }
    }
}

/// How normalized scores are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Unweighted arithmetic mean of the three normalized scores.
    #[default]
    Equal,
    /// Per-bureau weights, normalized by their sum.
    Weighted,
}

impl AggregationMode {
    pub fn label(self) -> &'static str {
        match self {
            AggregationMode::Equal => "equal",
            AggregationMode::Weighted => "weighted",
        }
    }
}

/// Per-bureau weights for `AggregationMode::Weighted`.
///
/// Weights need not sum to 1; they are divided by their sum before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BureauWeights {
    pub experian: f64,
    pub equifax: f64,
    pub transunion: f64,
}

impl Default for BureauWeights {
    fn default() -> Self {
        Self {
            experian: 0.4,
            equifax: 0.3,
            transunion: 0.3,
        }
    }
}

impl BureauWeights {
    pub fn get(&self, bureau: Bureau) -> f64 {
        match bureau {
            Bureau::Experian => self.experian,
            Bureau::Equifax => self.equifax,
            Bureau::TransUnion => self.transunion,
        }
    }

    /// Weights divided by their sum, in `Bureau::ALL` order.
    pub fn normalized(&self) -> Result<[f64; 3], ScoreError> {
        let raw = Bureau::ALL.map(|b| self.get(b));
        if let Some(bad) = raw.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ScoreError::InvalidInput(format!(
                "Bureau weights must be finite and non-negative (got {bad})."
            )));
        }
        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            return Err(ScoreError::InvalidInput(
                "Bureau weights must not all be zero.".to_string(),
            ));
        }
        Ok(raw.map(|w| w / sum))
    }
}

/// One bureau's part in a unified score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BureauContribution {
    pub bureau: Bureau,
    /// Raw reading as supplied (absent when imputed).
    pub raw: Option<f64>,
    pub normalized: f64,
    pub imputed: bool,
    /// Effective weight after normalization (sums to 1 across bureaus).
    pub weight: f64,
}

/// Aggregation output, unrounded. Rounding happens per output channel.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedScore {
    pub value: f64,
    pub mode: AggregationMode,
    pub contributions: Vec<BureauContribution>,
}

impl UnifiedScore {
    /// Detailed channel: two decimals, half away from zero.
    pub fn detailed(&self) -> f64 {
        round_to(self.value, 2)
    }

    /// Display channel: nearest whole number, half away from zero.
    pub fn whole(&self) -> i64 {
        self.value.round() as i64
    }

    /// Bureaus that supplied a real reading (not imputed).
    pub fn reported_bureaus(&self) -> Vec<Bureau> {
        self.contributions
            .iter()
            .filter(|c| !c.imputed)
            .map(|c| c.bureau)
            .collect()
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Discrete risk band derived from the unified score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Cutpoints for risk classification.
///
/// - `score >= low_risk_min` → Low
/// - `score >= medium_risk_min` → Medium
/// - otherwise → High
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low_risk_min: f64,
    pub medium_risk_min: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_risk_min: 700.0,
            medium_risk_min: 600.0,
        }
    }
}

/// Everything the deterministic path needs besides the profile itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoringConfig {
    pub mode: AggregationMode,
    /// Used only when `mode` is `Weighted`.
    pub weights: BureauWeights,
    pub risk: RiskThresholds,
}

/// Structured deterministic-path result handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub customer_id: String,
    /// Detailed channel (two decimals).
    pub unified_score: f64,
    /// Display channel (whole number).
    pub score: i64,
    pub aggregation: AggregationMode,
    pub bureau_scores: Vec<BureauContribution>,
    pub risk_level: RiskLevel,
}

/// Terminal output format for `uscore score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

/// Number of estimator input features.
pub const FEATURE_COUNT: usize = 3;

/// Estimator feature order. Persisted with the state and checked at load;
/// swapping columns silently produces wrong predictions.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = ["equifax", "transunion", "experian"];

/// Raw estimator inputs in the fixed training order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub equifax: f64,
    pub transunion: f64,
    pub experian: f64,
}

impl FeatureVector {
    pub fn new(equifax: f64, transunion: f64, experian: f64) -> Self {
        Self {
            equifax,
            transunion,
            experian,
        }
    }

    /// Build from positional values in `FEATURE_ORDER`.
    pub fn from_slice(values: &[f64]) -> Result<Self, ScoreError> {
        let [equifax, transunion, experian] = values else {
            return Err(ScoreError::InvalidArity {
                expected: FEATURE_COUNT,
                got: values.len(),
            });
        };
        let fv = Self::new(*equifax, *transunion, *experian);
        if let Some(v) = fv.to_array().iter().find(|v| !v.is_finite()) {
            return Err(ScoreError::InvalidInput(format!("Non-finite score: {v}")));
        }
        Ok(fv)
    }

    pub fn to_array(self) -> [f64; FEATURE_COUNT] {
        [self.equifax, self.transunion, self.experian]
    }
}

/// Historical (features → unified score) pair used for training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingRecord {
    pub features: FeatureVector,
    pub unified: f64,
}

/// Hyper-parameters for the bagged regression-tree ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// In-memory training knobs (independent of where data comes from).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    pub forest: ForestConfig,
    /// Fraction of valid rows held out for evaluation.
    pub test_fraction: f64,
    pub split_seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            test_fraction: 0.2,
            split_seed: 42,
        }
    }
}

/// Full configuration for a `uscore train` run.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub model_dir: PathBuf,
    pub options: TrainOptions,
}

/// Fit diagnostics recorded by training and persisted with the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainDiagnostics {
    pub rows_read: usize,
    pub rows_used: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub train_r2: f64,
    pub test_r2: f64,
    pub overfit_suspected: bool,
}

/// Settings for synthetic dataset generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    pub count: usize,
    pub seed: u64,
    /// Canonical-scale range the per-customer base score is drawn from.
    pub base_min: f64,
    pub base_max: f64,
    /// Std-dev of per-bureau disagreement around the base (canonical points).
    pub noise_sd: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            seed: 42,
            base_min: 450.0,
            base_max: 820.0,
            noise_sd: 20.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_normalized_by_their_sum() {
        let w = BureauWeights {
            experian: 4.0,
            equifax: 3.0,
            transunion: 3.0,
        };
        let n = w.normalized().unwrap();
        assert!((n[0] - 0.4).abs() < 1e-12);
        assert!((n[1] - 0.3).abs() < 1e-12);
        assert!((n[2] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn zero_or_negative_weights_are_rejected() {
        let zero = BureauWeights {
            experian: 0.0,
            equifax: 0.0,
            transunion: 0.0,
        };
        assert!(matches!(zero.normalized(), Err(ScoreError::InvalidInput(_))));

        let negative = BureauWeights {
            experian: -1.0,
            ..BureauWeights::default()
        };
        assert!(matches!(negative.normalized(), Err(ScoreError::InvalidInput(_))));
    }

    #[test]
    fn feature_vector_enforces_arity_and_order() {
        let fv = FeatureVector::from_slice(&[690.0, 710.0, 680.0]).unwrap();
        assert_eq!(fv.equifax, 690.0);
        assert_eq!(fv.transunion, 710.0);
        assert_eq!(fv.experian, 680.0);
        assert_eq!(fv.to_array(), [690.0, 710.0, 680.0]);

        let err = FeatureVector::from_slice(&[690.0, 710.0]).unwrap_err();
        assert_eq!(err, ScoreError::InvalidArity { expected: 3, got: 2 });

        let err = FeatureVector::from_slice(&[690.0, f64::NAN, 680.0]).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput(_)));
    }

    #[test]
    fn rounding_channels_differ() {
        let s = UnifiedScore {
            value: 717.666_666,
            mode: AggregationMode::Equal,
            contributions: Vec::new(),
        };
        assert_eq!(s.detailed(), 717.67);
        assert_eq!(s.whole(), 718);
    }
}
