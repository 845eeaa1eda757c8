//! Combine normalized bureau scores into one unified score.

use crate::domain::{
    AggregationMode, Bureau, BureauContribution, BureauWeights, CustomerCreditProfile, NormalizedScores,
    UnifiedScore,
};
use crate::error::ScoreError;

/// Aggregates the three normalized scores into a single unified score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreAggregator {
    mode: AggregationMode,
    /// Effective weights in `Bureau::ALL` order, already summing to 1.
    weights: [f64; 3],
}

impl ScoreAggregator {
    /// Equal-weight aggregator (the default).
    pub fn equal_weights() -> Self {
        Self {
            mode: AggregationMode::Equal,
            weights: [1.0 / 3.0; 3],
        }
    }

    /// Weighted aggregator. Weights are normalized by their sum.
    pub fn weighted(weights: BureauWeights) -> Result<Self, ScoreError> {
        Ok(Self {
            mode: AggregationMode::Weighted,
            weights: weights.normalized()?,
        })
    }

    /// Build from a mode; `weights` is ignored in equal mode.
    pub fn from_mode(mode: AggregationMode, weights: BureauWeights) -> Result<Self, ScoreError> {
        match mode {
            AggregationMode::Equal => Ok(Self::equal_weights()),
            AggregationMode::Weighted => Self::weighted(weights),
        }
    }

    /// Aggregate normalized scores. `profile` supplies the raw readings for traceability.
    pub fn aggregate(&self, normalized: &NormalizedScores, profile: &CustomerCreditProfile) -> UnifiedScore {
        let value = match self.mode {
            // Plain mean keeps the textbook `(a + b + c) / 3` rounding behaviour.
            AggregationMode::Equal => {
                Bureau::ALL.iter().map(|&b| normalized.get(b).value).sum::<f64>() / 3.0
            }
            AggregationMode::Weighted => Bureau::ALL
                .iter()
                .zip(self.weights)
                .map(|(&b, w)| normalized.get(b).value * w)
                .sum(),
        };

        let contributions = Bureau::ALL
            .iter()
            .zip(self.weights)
            .map(|(&bureau, weight)| {
                let n = normalized.get(bureau);
                BureauContribution {
                    bureau,
                    raw: profile.reading(bureau),
                    normalized: n.value,
                    imputed: n.imputed,
                    weight,
                }
            })
            .collect();

        UnifiedScore {
            value,
            mode: self.mode,
            contributions,
        }
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::equal_weights()
    }
}
