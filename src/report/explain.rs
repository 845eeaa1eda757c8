//! Plain-text explanation of a deterministic score.
//!
//! Presentation only: implementations receive the finished `ScoreReport` and
//! never feed anything back into scoring. A richer generator (for example a
//! hosted language model) can sit behind the same trait.

use crate::domain::{AggregationMode, Bureau, RiskLevel, ScoreReport};

pub trait Explain {
    fn explain(&self, report: &ScoreReport) -> String;
}

/// Deterministic fixed-template explainer used by `uscore score --format text`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl Explain for TemplateExplainer {
    fn explain(&self, report: &ScoreReport) -> String {
        let mut out = String::new();

        out.push_str(&format!("Customer: {}\n", report.customer_id));
        out.push_str(&format!(
            "Unified score: {:.2} (display {}) | risk: {}\n",
            report.unified_score,
            report.score,
            report.risk_level.label()
        ));
        out.push_str(&format!("Aggregation: {}\n", report.aggregation.label()));

        out.push_str("\nBureau scores (300-850 scale):\n");
        for c in &report.bureau_scores {
            let source = match (c.imputed, c.raw) {
                (true, _) => "imputed".to_string(),
                (false, Some(raw)) if c.bureau == Bureau::Equifax => format!("raw {raw} on 300-900"),
                (false, _) => "reported".to_string(),
            };
            out.push_str(&format!(
                "  {:<11} {:>7.2}  weight {:.3}  ({source})\n",
                c.bureau.display_name(),
                c.normalized,
                c.weight
            ));
        }

        let imputed: Vec<&str> = report
            .bureau_scores
            .iter()
            .filter(|c| c.imputed)
            .map(|c| c.bureau.display_name())
            .collect();
        out.push('\n');
        if !imputed.is_empty() {
            out.push_str(&format!(
                "{} not reported; filled with the mean of the reported bureaus.\n",
                imputed.join(" and ")
            ));
        }
        if report.aggregation == AggregationMode::Weighted {
            out.push_str("Weights were normalized to sum to 1 before combining.\n");
        }
        out.push_str(risk_sentence(report.risk_level));
        out.push('\n');

        out
    }
}

fn risk_sentence(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "The score is in the low-risk band.",
        RiskLevel::Medium => "The score is in the medium-risk band.",
        RiskLevel::High => "The score is in the high-risk band.",
    }
}
