//! Risk band classification.

use crate::domain::{RiskLevel, RiskThresholds};
use crate::error::ScoreError;

impl RiskThresholds {
    /// Reject cutpoints that would make the Medium band inverted.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if !(self.low_risk_min.is_finite() && self.medium_risk_min.is_finite()) {
            return Err(ScoreError::InvalidInput("Risk thresholds must be finite.".to_string()));
        }
        if self.medium_risk_min > self.low_risk_min {
            return Err(ScoreError::InvalidInput(format!(
                "medium_risk_min ({}) must not exceed low_risk_min ({}).",
                self.medium_risk_min, self.low_risk_min
            )));
        }
        Ok(())
    }

    pub fn classify(&self, score: f64) -> RiskLevel {
        if score >= self.low_risk_min {
            RiskLevel::Low
        } else if score >= self.medium_risk_min {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}
