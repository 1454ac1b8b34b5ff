//! Batch Tables - CSV upload and augmented CSV export
//!
//! The upload header must be exactly the 15 layout columns, in layout
//! order, the same contract the scaler was fit with.

use serde::Serialize;
use thiserror::Error;

use crate::constants::{OUTAGE_TYPE_COLUMN, RISK_SCORE_COLUMN, SEVERITY_COLUMN};
use crate::logic::features::layout::{default_values, feature_names};
use crate::logic::features::{FEATURES, FEATURE_COUNT};
use crate::logic::model::{ModelError, Pipeline, PredictionResult};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("upload has no header row")]
    Empty,

    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("unexpected columns: {}", .0.join(", "))]
    UnexpectedColumns(Vec<String>),

    #[error("columns must appear in this order: {}", .0.join(", "))]
    ColumnOrder(Vec<String>),

    #[error("row {row}: expected {expected} values, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column {column}: '{value}' is not a number")]
    BadCell {
        row: usize,
        column: &'static str,
        value: String,
    },
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Parsed upload, rows in layout order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchTable {
    pub rows: Vec<[f64; FEATURE_COUNT]>,
}

/// One input row plus its prediction
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    pub values: [f64; FEATURE_COUNT],
    pub prediction: PredictionResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub columns: Vec<&'static str>,
    pub row_count: usize,
    pub rows: Vec<BatchRecord>,
}

// ============================================================================
// PARSING
// ============================================================================

fn check_header(header: &csv::StringRecord) -> Result<(), BatchError> {
    let found: Vec<&str> = header.iter().collect();
    let expected: Vec<&str> = feature_names().collect();

    if found == expected {
        return Ok(());
    }

    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !found.contains(name))
        .map(|s| s.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BatchError::MissingColumns(missing));
    }

    let unexpected: Vec<String> = found
        .iter()
        .filter(|name| !expected.contains(name))
        .map(|s| s.to_string())
        .collect();
    if !unexpected.is_empty() || found.len() != expected.len() {
        return Err(BatchError::UnexpectedColumns(unexpected));
    }

    Err(BatchError::ColumnOrder(
        expected.iter().map(|s| s.to_string()).collect(),
    ))
}

/// Parse an uploaded CSV into fixed-width rows
pub fn parse_csv(data: &[u8]) -> Result<BatchTable, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Err(BatchError::Empty);
    }
    check_header(&header)?;

    let mut table = BatchTable::default();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row_number = i + 1;

        if record.len() != FEATURE_COUNT {
            return Err(BatchError::RaggedRow {
                row: row_number,
                expected: FEATURE_COUNT,
                found: record.len(),
            });
        }

        let mut row = [0.0; FEATURE_COUNT];
        for (j, cell) in record.iter().enumerate() {
            row[j] = cell
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| BatchError::BadCell {
                    row: row_number,
                    column: FEATURES[j].name,
                    value: cell.to_string(),
                })?;
        }
        table.rows.push(row);
    }

    Ok(table)
}

// ============================================================================
// INFERENCE + EXPORT
// ============================================================================

/// Run the pipeline over every row; any failure fails the whole batch
pub fn run_batch(pipeline: &Pipeline, table: &BatchTable) -> Result<Vec<BatchRecord>, ModelError> {
    let predictions = pipeline.infer_rows(&table.rows)?;

    Ok(table
        .rows
        .iter()
        .zip(predictions)
        .map(|(values, prediction)| BatchRecord {
            values: *values,
            prediction,
        })
        .collect())
}

/// Header of the augmented table
pub fn output_columns() -> Vec<&'static str> {
    feature_names()
        .chain([RISK_SCORE_COLUMN, SEVERITY_COLUMN, OUTAGE_TYPE_COLUMN])
        .collect()
}

pub fn to_response(records: Vec<BatchRecord>) -> BatchResponse {
    BatchResponse {
        columns: output_columns(),
        row_count: records.len(),
        rows: records,
    }
}

/// Augmented table as CSV: the 15 inputs plus the three result columns
pub fn to_csv(records: &[BatchRecord]) -> Result<Vec<u8>, BatchError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(output_columns())?;

    for record in records {
        let mut fields: Vec<String> = record.values.iter().map(|v| v.to_string()).collect();
        fields.push(format!("{:.2}", record.prediction.risk_score));
        fields.push(record.prediction.severity_label.clone());
        fields.push(record.prediction.outage_type.clone());
        writer.write_record(&fields)?;
    }

    writer
        .into_inner()
        .map_err(|e| BatchError::Csv(csv::Error::from(e.into_error())))
}

/// Header plus one row of defaults, for operators building an upload
pub fn template_csv() -> Result<Vec<u8>, BatchError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(feature_names())?;
    writer.write_record(default_values().iter().map(|v| v.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| BatchError::Csv(csv::Error::from(e.into_error())))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::FeatureWeighting;
    use crate::logic::model::store::fixtures;
    use std::sync::Arc;

    fn header() -> String {
        feature_names().collect::<Vec<_>>().join(",")
    }

    fn default_row() -> String {
        default_values()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn csv_with_rows(k: usize) -> String {
        let mut out = header();
        for _ in 0..k {
            out.push('\n');
            out.push_str(&default_row());
        }
        out.push('\n');
        out
    }

    #[test]
    fn test_k_rows_in_k_rows_out() {
        let table = parse_csv(csv_with_rows(13).as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 13);

        let pipeline = Pipeline::new(Arc::new(fixtures::store()), FeatureWeighting::None);
        let records = run_batch(&pipeline, &table).unwrap();
        assert_eq!(records.len(), 13);
        for record in &records {
            assert!(!record.prediction.severity_label.is_empty());
            assert!(!record.prediction.outage_type.is_empty());
            assert!(record.prediction.risk_score.is_finite());
        }
    }

    #[test]
    fn test_missing_column_rejected() {
        let names: Vec<&str> = feature_names().filter(|n| *n != "Corrosion").collect();
        let data = format!("{}\n", names.join(","));
        match parse_csv(data.as_bytes()) {
            Err(BatchError::MissingColumns(missing)) => assert_eq!(missing, vec!["Corrosion"]),
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_misnamed_column_rejected() {
        let data = header().replace("GasLeak", "Gas Leak (ppm)");
        assert!(matches!(
            parse_csv(data.as_bytes()),
            Err(BatchError::MissingColumns(_))
        ));
    }

    #[test]
    fn test_misordered_columns_rejected() {
        let mut names: Vec<&str> = feature_names().collect();
        names.swap(0, 1);
        let data = names.join(",");
        assert!(matches!(
            parse_csv(data.as_bytes()),
            Err(BatchError::ColumnOrder(_))
        ));
    }

    #[test]
    fn test_extra_column_rejected() {
        let data = format!("{},Site\n", header());
        match parse_csv(data.as_bytes()) {
            Err(BatchError::UnexpectedColumns(extra)) => assert_eq!(extra, vec!["Site"]),
            other => panic!("expected UnexpectedColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_cell_names_position() {
        let row = default_row().replacen("80", "n/a", 1);
        let data = format!("{}\n{}\n", header(), row);
        match parse_csv(data.as_bytes()) {
            Err(BatchError::BadCell { row, column, value }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "Pressure");
                assert_eq!(value, "n/a");
            }
            other => panic!("expected BadCell, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_row_rejected() {
        let data = format!("{}\n1,2,3\n", header());
        assert!(matches!(
            parse_csv(data.as_bytes()),
            Err(BatchError::RaggedRow { row: 1, found: 3, .. })
        ));
    }

    #[test]
    fn test_empty_upload() {
        assert!(parse_csv(b"").is_err());
        assert!(parse_csv(csv_with_rows(0).as_bytes()).unwrap().rows.is_empty());
    }

    #[test]
    fn test_csv_export_appends_columns() {
        let pipeline = Pipeline::new(Arc::new(fixtures::store()), FeatureWeighting::None);
        let table = parse_csv(csv_with_rows(2).as_bytes()).unwrap();
        let records = run_batch(&pipeline, &table).unwrap();

        let out = String::from_utf8(to_csv(&records).unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Risk_Score,Severity,Outage_Type"));
        assert!(lines[1].ends_with("35.00,Normal,Compressor Failure"));
    }

    #[test]
    fn test_template_round_trips_through_parser() {
        let template = template_csv().unwrap();
        let table = parse_csv(&template).unwrap();
        assert_eq!(table.rows, vec![default_values()]);
    }
}
