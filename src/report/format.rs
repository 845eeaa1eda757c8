//! Formatted terminal output.
//!
//! We keep formatting code in one place so the scoring and training code
//! returns plain data and output changes stay localized.

use std::path::Path;

use crate::domain::{FeatureVector, ForestConfig, RiskLevel, TrainDiagnostics};
use crate::io::{BatchOutcome, IngestedData};

/// Smoke-check prediction made right after training.
#[derive(Debug, Clone, Copy)]
pub struct ProbeResult {
    pub features: FeatureVector,
    pub learned: f64,
    pub deterministic: f64,
}

/// Format the training summary printed by `uscore train`.
pub fn format_training_summary(
    ingest: &IngestedData,
    diagnostics: &TrainDiagnostics,
    forest: &ForestConfig,
    probe: &ProbeResult,
    saved_to: &Path,
) -> String {
    let mut out = String::new();

    out.push_str("=== uscore - estimator training ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} dropped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.rows_dropped()
    ));
    for e in ingest.row_errors.iter().take(3) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if ingest.row_errors.len() > 3 {
        out.push_str(&format!("  ... and {} more\n", ingest.row_errors.len() - 3));
    }

    out.push_str(&format!(
        "Split: train={} test={}\n",
        diagnostics.n_train, diagnostics.n_test
    ));
    out.push_str(&format!(
        "Forest: trees={} max_depth={} min_split={} min_leaf={} seed={}\n",
        forest.n_trees, forest.max_depth, forest.min_samples_split, forest.min_samples_leaf, forest.seed
    ));
    out.push_str(&format!(
        "R² (scaled): train={:.4} test={:.4}{}\n",
        diagnostics.train_r2,
        diagnostics.test_r2,
        if diagnostics.overfit_suspected {
            "  [overfit suspected]"
        } else {
            ""
        }
    ));

    let f = &probe.features;
    out.push_str(&format!(
        "Probe (equifax={}, transunion={}, experian={}): learned={:.2} deterministic={:.2}\n",
        f.equifax, f.transunion, f.experian, probe.learned, probe.deterministic
    ));
    out.push_str(&format!("Saved: {}\n", saved_to.display()));

    out
}

/// One-line summary printed after `uscore score-batch`.
pub fn format_batch_summary(outcomes: &[BatchOutcome], output: &Path) -> String {
    let mut counts = [0usize; 3];
    let mut failed = 0usize;
    for o in outcomes {
        match &o.result {
            Ok(r) => {
                let idx = match r.risk_level {
                    RiskLevel::Low => 0,
                    RiskLevel::Medium => 1,
                    RiskLevel::High => 2,
                };
                counts[idx] += 1;
            }
            Err(_) => failed += 1,
        }
    }
    format!(
        "Scored {} of {} rows (low={} medium={} high={}, failed={}) -> {}",
        outcomes.len() - failed,
        outcomes.len(),
        counts[0],
        counts[1],
        counts[2],
        failed,
        output.display()
    )
}
