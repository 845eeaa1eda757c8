//! Command-line parsing for the unified credit score engine.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! scoring and training code. Conversions into domain configuration live next
//! to the argument structs so `app` only dispatches.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    AggregationMode, Bureau, BureauWeights, CustomerCreditProfile, FeatureVector, ForestConfig, OutputFormat,
    RiskThresholds, SampleConfig, ScoringConfig, TrainConfig, TrainOptions,
};
use crate::error::ScoreError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "uscore", version, about = "Unified credit score engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict a unified score with the trained estimator.
    Predict(PredictArgs),
    /// Train the estimator from a CSV and persist it.
    Train(TrainArgs),
    /// Score one customer with the deterministic formula.
    Score(ScoreArgs),
    /// Score every customer in a CSV with the deterministic formula.
    ScoreBatch(ScoreBatchArgs),
    /// Generate a synthetic training dataset labelled by the deterministic formula.
    Sample(SampleArgs),
}

/// Location of the persisted estimator.
#[derive(Debug, Args, Clone)]
pub struct ModelDirArgs {
    /// Directory holding `estimator.json`.
    #[arg(long, env = "USCORE_MODEL_DIR", value_name = "DIR")]
    pub model_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Raw scores in order: EQUIFAX TRANSUNION EXPERIAN.
    #[arg(value_name = "SCORE", num_args = 0.., allow_negative_numbers = true)]
    pub values: Vec<String>,

    #[command(flatten)]
    pub model: ModelDirArgs,
}

impl PredictArgs {
    /// Parse the positional values. Arity is checked before numbers so a short
    /// call always reports the count.
    pub fn features(&self) -> Result<FeatureVector, ScoreError> {
        if self.values.len() != 3 {
            return Err(ScoreError::InvalidArity {
                expected: 3,
                got: self.values.len(),
            });
        }
        let parsed = self
            .values
            .iter()
            .map(|s| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| ScoreError::InvalidInput(format!("'{s}' is not a number.")))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        FeatureVector::from_slice(&parsed)
    }
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Training CSV (equifax, transunion, experian, unified columns).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    #[command(flatten)]
    pub model: ModelDirArgs,

    /// Number of trees in the ensemble.
    #[arg(long, default_value_t = 100)]
    pub n_trees: usize,

    /// Maximum tree depth.
    #[arg(long, default_value_t = 10)]
    pub max_depth: usize,

    /// Minimum samples required to split a node.
    #[arg(long, default_value_t = 5)]
    pub min_samples_split: usize,

    /// Minimum samples per leaf.
    #[arg(long, default_value_t = 2)]
    pub min_samples_leaf: usize,

    /// Seed for bootstrapping and the train/test split.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows held out for evaluation.
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,
}

impl TrainArgs {
    pub fn to_config(&self) -> TrainConfig {
        TrainConfig {
            data_path: self.data.clone(),
            model_dir: self.model.model_dir.clone(),
            options: TrainOptions {
                forest: ForestConfig {
                    n_trees: self.n_trees,
                    max_depth: self.max_depth,
                    min_samples_split: self.min_samples_split,
                    min_samples_leaf: self.min_samples_leaf,
                    seed: self.seed,
                },
                test_fraction: self.test_fraction,
                split_seed: self.seed,
            },
        }
    }
}

/// Options shared by `score` and `score-batch`.
#[derive(Debug, Args, Clone)]
pub struct ScoringArgs {
    /// Aggregation mode.
    #[arg(long, value_enum, default_value_t = AggregationMode::Equal)]
    pub mode: AggregationMode,

    /// Weights for weighted mode as EXPERIAN,EQUIFAX,TRANSUNION.
    #[arg(long, value_name = "E,Q,T", value_parser = parse_weights)]
    pub weights: Option<BureauWeights>,

    /// Minimum score for the Low risk band.
    #[arg(long, default_value_t = 700.0)]
    pub low_risk_min: f64,

    /// Minimum score for the Medium risk band.
    #[arg(long, default_value_t = 600.0)]
    pub medium_risk_min: f64,
}

impl ScoringArgs {
    pub fn to_config(&self) -> ScoringConfig {
        ScoringConfig {
            mode: self.mode,
            weights: self.weights.unwrap_or_default(),
            risk: RiskThresholds {
                low_risk_min: self.low_risk_min,
                medium_risk_min: self.medium_risk_min,
            },
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    #[arg(long)]
    pub customer_id: String,

    /// Experian score (300-850).
    #[arg(long, allow_negative_numbers = true)]
    pub experian: Option<f64>,

    /// Equifax score (300-900).
    #[arg(long, allow_negative_numbers = true)]
    pub equifax: Option<f64>,

    /// TransUnion score (300-850).
    #[arg(long, allow_negative_numbers = true)]
    pub transunion: Option<f64>,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

impl ScoreArgs {
    pub fn profile(&self) -> CustomerCreditProfile {
        CustomerCreditProfile::new(self.customer_id.clone())
            .with_reading(Bureau::Experian, self.experian)
            .with_reading(Bureau::Equifax, self.equifax)
            .with_reading(Bureau::TransUnion, self.transunion)
    }
}

#[derive(Debug, Args, Clone)]
pub struct ScoreBatchArgs {
    /// Profile CSV (customer_id plus experian/equifax/transunion columns).
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Results CSV to write.
    #[arg(long, value_name = "CSV")]
    pub output: PathBuf,

    #[command(flatten)]
    pub scoring: ScoringArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Dataset CSV to write.
    #[arg(long, value_name = "CSV")]
    pub output: PathBuf,

    /// Number of synthetic customers.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub count: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Std-dev of per-bureau disagreement (canonical points).
    #[arg(long, default_value_t = 20.0)]
    pub noise: f64,
}

impl SampleArgs {
    pub fn to_config(&self) -> SampleConfig {
        SampleConfig {
            count: self.count,
            seed: self.seed,
            noise_sd: self.noise,
            ..SampleConfig::default()
        }
    }
}

/// Parse `E,Q,T` (Experian, Equifax, TransUnion) weights.
fn parse_weights(s: &str) -> Result<BureauWeights, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [experian, equifax, transunion] = parts.as_slice() else {
        return Err(format!("expected 3 comma-separated weights, got {}", parts.len()));
    };
    let num = |v: &str| v.parse::<f64>().map_err(|_| format!("'{v}' is not a number"));
    Ok(BureauWeights {
        experian: num(experian)?,
        equifax: num(equifax)?,
        transunion: num(transunion)?,
    })
}
