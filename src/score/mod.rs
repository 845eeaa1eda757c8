//! Deterministic scoring path: normalize → aggregate → classify.
//!
//! `score_profile` is the entry point consumed by presentation layers; it
//! returns plain data (`ScoreReport`) and never produces prose.

use rayon::prelude::*;

use crate::domain::{CustomerCreditProfile, ScoreReport, ScoringConfig};
use crate::error::ScoreError;

pub mod aggregate;
pub mod normalize;
pub mod risk;

pub use aggregate::ScoreAggregator;
pub use normalize::{normalize_profile, normalize_raw};

/// Score one profile with the given configuration.
pub fn score_profile(profile: &CustomerCreditProfile, config: &ScoringConfig) -> Result<ScoreReport, ScoreError> {
    config.risk.validate()?;
    let aggregator = ScoreAggregator::from_mode(config.mode, config.weights)?;

    let normalized = normalize_profile(profile)?;
    let unified = aggregator.aggregate(&normalized, profile);
    let unified_score = unified.detailed();

    Ok(ScoreReport {
        customer_id: profile.customer_id.clone(),
        unified_score,
        score: unified.whole(),
        aggregation: unified.mode,
        risk_level: config.risk.classify(unified_score),
        bureau_scores: unified.contributions,
    })
}

/// Score many profiles in parallel. Output order matches input order.
pub fn score_profiles(
    profiles: &[CustomerCreditProfile],
    config: &ScoringConfig,
) -> Vec<Result<ScoreReport, ScoreError>> {
    profiles.par_iter().map(|p| score_profile(p, config)).collect()
}
