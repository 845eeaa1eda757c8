//! Shared workflows behind the CLI subcommands.
//!
//! Each function runs one command end to end and returns plain data; `app`
//! decides what to print.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::generate_records;
use crate::domain::{
    AggregationMode, Bureau, CustomerCreditProfile, FeatureVector, SampleConfig, ScoringConfig, TrainConfig,
};
use crate::error::AppError;
use crate::fit::train_estimator;
use crate::io::{self, BatchOutcome, IngestedData};
use crate::models::{Estimator, TrainedEstimatorState};
use crate::report::ProbeResult;
use crate::score::{score_profile, score_profiles};

/// Fixed smoke-check input predicted after every training run.
pub const PROBE: FeatureVector = FeatureVector {
    equifax: 690.0,
    transunion: 710.0,
    experian: 680.0,
};

/// All outputs of a single `uscore train` run.
#[derive(Debug, Clone)]
pub struct TrainRun {
    pub ingest: IngestedData,
    pub state: TrainedEstimatorState,
    pub saved_to: PathBuf,
    pub probe: ProbeResult,
}

/// Ingest → train → persist → probe.
pub fn run_train(config: &TrainConfig) -> Result<TrainRun, AppError> {
    let ingest = io::load_training_records(&config.data_path)?;
    let state = train_estimator(&ingest.records, ingest.rows_read, &config.options)?;
    let saved_to = io::save_state(&config.model_dir, &state)?;

    let estimator = Estimator::new(state.clone())?;
    let probe = probe(&estimator)?;

    Ok(TrainRun {
        ingest,
        state,
        saved_to,
        probe,
    })
}

/// Load the persisted estimator and predict one feature vector.
pub fn run_predict(model_dir: &Path, features: &FeatureVector) -> Result<f64, AppError> {
    let estimator = io::load_estimator(model_dir)?;
    Ok(estimator.predict(features)?)
}

/// Score a profile CSV and write the results CSV. Rows are reported in input order.
pub fn run_score_batch(input: &Path, output: &Path, config: &ScoringConfig) -> Result<Vec<BatchOutcome>, AppError> {
    // Configuration problems fail the whole run instead of every row.
    config.risk.validate()?;
    if config.mode == AggregationMode::Weighted {
        config.weights.normalized()?;
    }

    let rows = io::load_profiles(input)?;
    let profiles: Vec<CustomerCreditProfile> = rows.iter().filter_map(|r| r.profile.clone().ok()).collect();
    let mut scored = score_profiles(&profiles, config).into_iter();

    let mut outcomes = Vec::with_capacity(rows.len());
    for row in rows {
        let result = match row.profile {
            Ok(_) => match scored.next() {
                Some(r) => r.map_err(|e| e.to_string()),
                None => return Err(AppError::new(4, "Batch scoring returned fewer results than rows.")),
            },
            Err(message) => Err(format!("line {}: {message}", row.line)),
        };
        outcomes.push(BatchOutcome {
            customer_id: row.customer_id,
            result,
        });
    }

    io::write_batch_csv(output, &outcomes)?;
    info!(rows = outcomes.len(), path = %output.display(), "wrote batch scores");
    Ok(outcomes)
}

/// Generate a synthetic dataset and write it as a training CSV.
pub fn run_sample(output: &Path, config: &SampleConfig) -> Result<usize, AppError> {
    let records = generate_records(config)?;
    io::write_dataset_csv(output, &records)?;
    info!(rows = records.len(), seed = config.seed, path = %output.display(), "wrote synthetic dataset");
    Ok(records.len())
}

fn probe(estimator: &Estimator) -> Result<ProbeResult, AppError> {
    let learned = estimator.predict(&PROBE)?;
    let profile = CustomerCreditProfile::new("probe")
        .with_reading(Bureau::Equifax, Some(PROBE.equifax))
        .with_reading(Bureau::TransUnion, Some(PROBE.transunion))
        .with_reading(Bureau::Experian, Some(PROBE.experian));
    let deterministic = score_profile(&profile, &ScoringConfig::default())?.unified_score;
    Ok(ProbeResult {
        features: PROBE,
        learned,
        deterministic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForestConfig, TrainOptions};
    use tempfile::tempdir;

    #[test]
    fn sample_train_predict_flow() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("train.csv");
        let model_dir = dir.path().join("model");

        let n = run_sample(
            &data,
            &SampleConfig {
                count: 600,
                noise_sd: 15.0,
                ..SampleConfig::default()
            },
        )
        .unwrap();
        assert_eq!(n, 600);

        let config = TrainConfig {
            data_path: data,
            model_dir: model_dir.clone(),
            options: TrainOptions {
                forest: ForestConfig {
                    n_trees: 30,
                    ..ForestConfig::default()
                },
                ..TrainOptions::default()
            },
        };
        let run = run_train(&config).unwrap();
        assert_eq!(run.ingest.rows_used, 600);
        assert_eq!(run.state.diagnostics.n_test, 120);
        assert!((run.probe.learned - run.probe.deterministic).abs() < 20.0);

        let p = run_predict(&model_dir, &PROBE).unwrap();
        assert_eq!(p.to_bits(), run.probe.learned.to_bits());
    }

    #[test]
    fn batch_keeps_order_and_reports_row_failures() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("profiles.csv");
        let output = dir.path().join("scores.csv");
        std::fs::write(
            &input,
            "customer_id,experian,equifax,transunion\n\
             C1,701,780,712\n\
             C2,,950,700\n\
             C3,,,\n\
             C4,abc,700,700\n\
             C5,750,,730\n",
        )
        .unwrap();

        let outcomes = run_score_batch(&input, &output, &ScoringConfig::default()).unwrap();
        let ids: Vec<&str> = outcomes.iter().map(|o| o.customer_id.as_str()).collect();
        assert_eq!(ids, ["C1", "C2", "C3", "C4", "C5"]);

        assert_eq!(outcomes[0].result.as_ref().unwrap().unified_score, 717.67);
        assert!(outcomes[1].result.as_ref().unwrap_err().contains("outside its native range"));
        assert!(outcomes[2].result.as_ref().unwrap_err().contains("Insufficient data"));
        assert!(outcomes[3].result.as_ref().unwrap_err().starts_with("line 5:"));
        assert_eq!(outcomes[4].result.as_ref().unwrap().score, 740);
        assert!(output.exists());
    }

    #[test]
    fn batch_rejects_bad_thresholds_up_front() {
        let dir = tempdir().unwrap();
        let mut cfg = ScoringConfig::default();
        cfg.risk.medium_risk_min = 750.0;
        let err = run_score_batch(&dir.path().join("missing.csv"), &dir.path().join("out.csv"), &cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
