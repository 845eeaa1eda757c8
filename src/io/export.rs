//! CSV exports.
//!
//! - synthetic training datasets (`uscore sample`), readable by `uscore train`
//! - batch scoring results (`uscore score-batch`), one row per input row

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Bureau, ScoreReport, TrainingRecord};
use crate::error::AppError;

/// Outcome of scoring one input row, in input order.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub customer_id: String,
    pub result: Result<ScoreReport, String>,
}

/// Write a training dataset using the long-form column names.
pub fn write_dataset_csv(path: &Path, records: &[TrainingRecord]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create dataset CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "equifax_credit_score,transunion_credit_score,experian_credit_score,unified_credit_score"
    )
    .map_err(|e| AppError::new(4, format!("Failed to write dataset CSV header: {e}")))?;

    for r in records {
        let f = &r.features;
        writeln!(file, "{},{},{},{:.2}", f.equifax, f.transunion, f.experian, r.unified)
            .map_err(|e| AppError::new(4, format!("Failed to write dataset CSV row: {e}")))?;
    }

    Ok(())
}

/// Write batch scoring results. Failed rows carry an empty score and the
/// error message; messages may contain commas, so the `csv` writer quotes.
pub fn write_batch_csv(path: &Path, outcomes: &[BatchOutcome]) -> Result<(), AppError> {
    let write_err = |e: csv::Error| AppError::new(4, format!("Failed to write results CSV: {e}"));

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create results CSV '{}': {e}", path.display())))?;

    writer
        .write_record([
            "customer_id",
            "unified_score",
            "score",
            "mode",
            "risk_level",
            "experian",
            "equifax",
            "transunion",
            "imputed",
            "error",
        ])
        .map_err(write_err)?;

    for o in outcomes {
        let row = match &o.result {
            Ok(report) => {
                let normalized = |b: Bureau| {
                    report
                        .bureau_scores
                        .iter()
                        .find(|c| c.bureau == b)
                        .map(|c| format!("{:.2}", c.normalized))
                        .unwrap_or_default()
                };
                let imputed: Vec<String> = report
                    .bureau_scores
                    .iter()
                    .filter(|c| c.imputed)
                    .map(|c| c.bureau.to_string().to_lowercase())
                    .collect();
                vec![
                    o.customer_id.clone(),
                    format!("{:.2}", report.unified_score),
                    report.score.to_string(),
                    report.aggregation.label().to_string(),
                    report.risk_level.label().to_string(),
                    normalized(Bureau::Experian),
                    normalized(Bureau::Equifax),
                    normalized(Bureau::TransUnion),
                    imputed.join(";"),
                    String::new(),
                ]
            }
            Err(message) => {
                let mut row = vec![o.customer_id.clone()];
                row.extend(std::iter::repeat_n(String::new(), 8));
                row.push(message.clone());
                row
            }
        };
        writer.write_record(&row).map_err(write_err)?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush results CSV: {e}")))?;
    Ok(())
}
