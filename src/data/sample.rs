//! Synthetic training data labelled by the deterministic scoring path.
//!
//! Each synthetic customer gets a latent base score on the canonical scale.
//! Every bureau reports that base plus independent Gaussian disagreement,
//! rounded to a whole score and expressed in the bureau's native range
//! (Equifax on 300–900). The label is the equal-weight unified score, so an
//! estimator trained on this data learns the deterministic formula.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    Bureau, CANONICAL_RANGE, CustomerCreditProfile, FeatureVector, SampleConfig, ScoringConfig, TrainingRecord,
};
use crate::error::ScoreError;
use crate::score::score_profile;

pub fn generate_records(config: &SampleConfig) -> Result<Vec<TrainingRecord>, ScoreError> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sd)
        .map_err(|e| ScoreError::InvalidInput(format!("Noise distribution error: {e}")))?;
    let scoring = ScoringConfig::default();

    let mut records = Vec::with_capacity(config.count);
    for i in 0..config.count {
        let base = rng.gen_range(config.base_min..=config.base_max);

        let mut reading = |bureau: Bureau| {
            let canonical = (base + noise.sample(&mut rng)).clamp(CANONICAL_RANGE.min, CANONICAL_RANGE.max);
            to_native(bureau, canonical).round()
        };
        let experian = reading(Bureau::Experian);
        let equifax = reading(Bureau::Equifax);
        let transunion = reading(Bureau::TransUnion);

        let profile = CustomerCreditProfile {
            customer_id: format!("SYN-{:05}", i + 1),
            experian: Some(experian),
            equifax: Some(equifax),
            transunion: Some(transunion),
        };
        let report = score_profile(&profile, &scoring)?;

        records.push(TrainingRecord {
            features: FeatureVector::new(equifax, transunion, experian),
            unified: report.unified_score,
        });
    }

    Ok(records)
}

/// Inverse of the normalizer: canonical value → bureau's native scale.
fn to_native(bureau: Bureau, canonical: f64) -> f64 {
    let native = bureau.native_range();
    native.min + (canonical - CANONICAL_RANGE.min) * native.width() / CANONICAL_RANGE.width()
}

fn validate(config: &SampleConfig) -> Result<(), ScoreError> {
    if config.count == 0 {
        return Err(ScoreError::InvalidInput("Sample count must be > 0.".to_string()));
    }
    if !(CANONICAL_RANGE.contains(config.base_min)
        && CANONICAL_RANGE.contains(config.base_max)
        && config.base_min < config.base_max)
    {
        return Err(ScoreError::InvalidInput(format!(
            "Base range [{}, {}] must be increasing and inside [300, 850].",
            config.base_min, config.base_max
        )));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(ScoreError::InvalidInput("Noise std-dev must be finite and >= 0.".to_string()));
    }
    Ok(())
}
