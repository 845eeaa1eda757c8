//! CSV ingest and validation.
//!
//! Two inputs are read here:
//! - training datasets (three bureau readings + the unified label)
//! - customer profile lists for batch scoring
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No scoring logic here**

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{Bureau, CustomerCreditProfile, FeatureVector, TrainingRecord};
use crate::error::{AppError, ScoreError};

/// Accepted header names per column (compared after lowercasing).
const EQUIFAX_COLUMNS: &[&str] = &["equifax_credit_score", "equifax"];
const TRANSUNION_COLUMNS: &[&str] = &["transunion_credit_score", "transunion"];
const EXPERIAN_COLUMNS: &[&str] = &["experian_credit_score", "experian"];
const UNIFIED_COLUMNS: &[&str] = &["unified_credit_score", "unified_score", "unified"];
const CUSTOMER_ID_COLUMNS: &[&str] = &["customer_id", "id"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Training ingest output: validated records + what was dropped.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<TrainingRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedData {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_used
    }
}

/// One customer row for batch scoring. A row that fails to parse keeps its
/// position so the output can report it in place.
#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub line: usize,
    pub customer_id: String,
    pub profile: Result<CustomerCreditProfile, String>,
}

#[derive(Debug, Clone, Copy)]
struct TrainingColumns {
    equifax: usize,
    transunion: usize,
    experian: usize,
    unified: usize,
}

/// Load and validate a training CSV.
pub fn load_training_records(path: &Path) -> Result<IngestedData, AppError> {
    let (headers, mut reader) = open_csv(path)?;
    let header_map = build_header_map(&headers);
    let columns = resolve_training_columns(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts at line 2 (after headers)
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_training_row(&record, columns));
        match parsed {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in row_errors.iter().take(5) {
        warn!(line = e.line, "dropped row: {}", e.message);
    }
    if row_errors.len() > 5 {
        warn!(count = row_errors.len() - 5, "further rows dropped");
    }

    let rows_used = records.len();
    if rows_used == 0 {
        return Err(ScoreError::TrainingDataInvalid(format!(
            "No valid rows in '{}' ({rows_read} read).",
            path.display()
        ))
        .into());
    }
    info!(rows_read, rows_used, path = %path.display(), "loaded training data");

    Ok(IngestedData {
        records,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Load a customer profile CSV for batch scoring.
///
/// Requires `customer_id` (or `id`). Bureau columns are optional; a blank cell
/// is a missing reading. Non-numeric cells mark the row as failed.
pub fn load_profiles(path: &Path) -> Result<Vec<ProfileRow>, AppError> {
    let (headers, mut reader) = open_csv(path)?;
    let header_map = build_header_map(&headers);

    let id_col = resolve_column(&header_map, CUSTOMER_ID_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `customer_id`"))?;
    let bureau_cols: Vec<(Bureau, Option<usize>)> = Bureau::ALL
        .iter()
        .map(|&b| (b, resolve_column(&header_map, bureau_columns(b))))
        .collect();
    if bureau_cols.iter().all(|(_, c)| c.is_none()) {
        return Err(AppError::new(
            2,
            "Profile CSV needs at least one of `experian`, `equifax`, `transunion` columns.",
        ));
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows.push(ProfileRow {
                    line,
                    customer_id: String::new(),
                    profile: Err(format!("CSV parse error: {e}")),
                });
                continue;
            }
        };

        let customer_id = get_cell(&record, Some(id_col)).unwrap_or_default().to_string();
        let profile = if customer_id.is_empty() {
            Err("Missing required value: `customer_id`".to_string())
        } else {
            parse_profile(&record, &customer_id, &bureau_cols)
        };
        rows.push(ProfileRow {
            line,
            customer_id,
            profile,
        });
    }

    info!(rows = rows.len(), path = %path.display(), "loaded profiles");
    Ok(rows)
}

fn open_csv(path: &Path) -> Result<(StringRecord, csv::Reader<File>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    Ok((headers, reader))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

fn bureau_columns(bureau: Bureau) -> &'static [&'static str] {
    match bureau {
        Bureau::Experian => EXPERIAN_COLUMNS,
        Bureau::Equifax => EQUIFAX_COLUMNS,
        Bureau::TransUnion => TRANSUNION_COLUMNS,
    }
}

fn resolve_training_columns(header_map: &HashMap<String, usize>) -> Result<TrainingColumns, ScoreError> {
    let require = |aliases: &[&str]| {
        resolve_column(header_map, aliases)
            .ok_or_else(|| ScoreError::TrainingDataInvalid(format!("Missing required column: `{}`", aliases[0])))
    };
    Ok(TrainingColumns {
        equifax: require(EQUIFAX_COLUMNS)?,
        transunion: require(TRANSUNION_COLUMNS)?,
        experian: require(EXPERIAN_COLUMNS)?,
        unified: require(UNIFIED_COLUMNS)?,
    })
}

fn parse_training_row(record: &StringRecord, columns: TrainingColumns) -> Result<TrainingRecord, String> {
    let equifax = parse_reading(record, columns.equifax, Bureau::Equifax)?;
    let transunion = parse_reading(record, columns.transunion, Bureau::TransUnion)?;
    let experian = parse_reading(record, columns.experian, Bureau::Experian)?;
    let unified = parse_required_f64(record, columns.unified, "unified")?;

    Ok(TrainingRecord {
        features: FeatureVector::new(equifax, transunion, experian),
        unified,
    })
}

fn parse_reading(record: &StringRecord, idx: usize, bureau: Bureau) -> Result<f64, String> {
    let name = bureau.to_string();
    let value = parse_required_f64(record, idx, &name)?;
    let range = bureau.native_range();
    if !range.contains(value) {
        return Err(format!(
            "`{name}` value {value} outside native range [{}, {}].",
            range.min, range.max
        ));
    }
    Ok(value)
}

fn parse_profile(
    record: &StringRecord,
    customer_id: &str,
    bureau_cols: &[(Bureau, Option<usize>)],
) -> Result<CustomerCreditProfile, String> {
    let mut profile = CustomerCreditProfile::new(customer_id);
    for &(bureau, idx) in bureau_cols {
        let value = match get_cell(record, idx) {
            None => None,
            Some(s) => Some(
                s.parse::<f64>()
                    .map_err(|_| format!("Invalid `{bureau}` value '{s}'."))?,
            ),
        };
        profile = profile.with_reading(bureau, value);
    }
    Ok(profile)
}

fn parse_required_f64(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let s = get_cell(record, Some(idx)).ok_or_else(|| format!("Missing required value: `{name}`"))?;
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value."))
    }
}

fn get_cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    record.get(idx?).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn accepts_original_column_names_case_insensitively() {
        let f = csv_file(
            "\u{feff}Equifax_Credit_Score,transUnion_credit_score,experian_credit_score,unified_credit_score\n\
             690,710,680,685.0\n\
             900,850,850,850\n",
        );
        let data = load_training_records(f.path()).unwrap();
        assert_eq!(data.rows_read, 2);
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.records[0].features, FeatureVector::new(690.0, 710.0, 680.0));
        assert_eq!(data.records[1].unified, 850.0);
    }

    #[test]
    fn invalid_rows_are_dropped_and_counted() {
        let f = csv_file(
            "equifax,transunion,experian,unified\n\
             690,710,680,685\n\
             950,710,680,700\n\
             ,710,680,700\n\
             abc,710,680,700\n\
             700,720,690,NaN\n\
             700,720,690,703\n",
        );
        let data = load_training_records(f.path()).unwrap();
        assert_eq!(data.rows_read, 6);
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.rows_dropped(), 4);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert!(data.row_errors[0].message.contains("outside native range"));
    }

    #[test]
    fn missing_column_is_training_data_invalid() {
        let f = csv_file("equifax,transunion,unified\n690,710,700\n");
        let err = load_training_records(f.path()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("experian"));
    }

    #[test]
    fn all_rows_invalid_is_training_data_invalid() {
        let f = csv_file("equifax,transunion,experian,unified\n100,710,680,685\n,,,\n");
        let err = load_training_records(f.path()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = load_training_records(Path::new("/nonexistent/uscore/train.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn profiles_keep_order_and_blank_cells_are_missing() {
        let f = csv_file(
            "customer_id,experian,equifax,transunion\n\
             C1,750,,730\n\
             C2,abc,700,700\n\
             ,700,700,700\n\
             C4,,,\n",
        );
        let rows = load_profiles(f.path()).unwrap();
        assert_eq!(rows.len(), 4);

        let p = rows[0].profile.as_ref().unwrap();
        assert_eq!(p.experian, Some(750.0));
        assert_eq!(p.equifax, None);
        assert_eq!(p.transunion, Some(730.0));

        assert!(rows[1].profile.as_ref().unwrap_err().contains("Experian"));
        assert!(rows[2].profile.is_err());
        assert_eq!(rows[3].customer_id, "C4");
        assert!(rows[3].profile.is_ok());
    }

    #[test]
    fn profiles_without_any_bureau_column_are_rejected() {
        let f = csv_file("customer_id,name\nC1,Alice\n");
        assert_eq!(load_profiles(f.path()).unwrap_err().exit_code(), 2);
    }
}
