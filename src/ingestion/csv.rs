//! CSV loading.
//!
//! Two entry points:
//!
//! - [`ingest_csv_from_path`] / [`ingest_csv_from_reader`] parse against a caller-provided
//!   [`Schema`]
//! - [`ingest_csv_inferred`] infers the schema from the data first

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all schema fields (order can differ; extra columns are ignored).
/// - Each value is parsed according to the schema field type. Empty cells become
///   [`Value::Null`].
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> IngestionResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Load CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> IngestionResult<DataSet> {
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    parse_records(&headers, &records, schema)
}

/// Load a CSV file, inferring the schema from its contents.
///
/// Every header becomes a field. See [`infer_schema`] for the type rules.
pub fn ingest_csv_inferred(path: impl AsRef<Path>) -> IngestionResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    let schema = infer_schema(&headers, &records);
    parse_records(&headers, &records, &schema)
}

/// Infer a column type from every non-empty cell.
///
/// The first of `Int64`, `Float64`, `Bool`, `Timestamp` that every cell parses as wins; anything
/// else, including a column with no non-empty cells, is `Utf8`.
pub fn infer_schema(headers: &[String], records: &[csv::StringRecord]) -> Schema {
    let fields = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells = || {
                records
                    .iter()
                    .map(move |r| r.get(idx).unwrap_or("").trim())
                    .filter(|s| !s.is_empty())
            };
            let data_type = if cells().next().is_none() {
                DataType::Utf8
            } else if cells().all(|s| s.parse::<i64>().is_ok()) {
                DataType::Int64
            } else if cells().all(|s| s.parse::<f64>().is_ok()) {
                DataType::Float64
            } else if cells().all(|s| matches!(s.to_ascii_lowercase().as_str(), "true" | "false")) {
                DataType::Bool
            } else if cells().all(|s| parse_timestamp(s).is_some()) {
                DataType::Timestamp
            } else {
                DataType::Utf8
            };
            Field::new(name.clone(), data_type)
        })
        .collect();
    Schema::new(fields)
}

fn parse_records(
    headers: &[String],
    records: &[csv::StringRecord],
    schema: &Schema,
) -> IngestionResult<DataSet> {
    // Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
    let col_idxs = schema
        .fields
        .iter()
        .map(|field| {
            headers
                .iter()
                .position(|h| *h == field.name)
                .ok_or_else(|| IngestionError::SchemaMismatch {
                    message: format!(
                        "missing required column '{}'. headers={headers:?}",
                        field.name
                    ),
                })
        })
        .collect::<IngestionResult<Vec<_>>>()?;

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(records.len());
    for (row_idx0, record) in records.iter().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let row = schema
            .fields
            .iter()
            .zip(&col_idxs)
            .map(|(field, &csv_idx)| {
                let raw = record.get(csv_idx).unwrap_or("");
                parse_typed_value(user_row, &field.name, field.data_type, raw)
            })
            .collect::<IngestionResult<Vec<_>>>()?;
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

fn parse_typed_value(
    row: usize,
    column: &str,
    data_type: DataType,
    raw: &str,
) -> IngestionResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let parsed = match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| e.to_string()),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| e.to_string()),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool),
        DataType::Timestamp => parse_timestamp(trimmed)
            .map(Value::Timestamp)
            .ok_or_else(|| "expected a date (YYYY-MM-DD) or date-time".to_string()),
    };

    parsed.map_err(|message| IngestionError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message,
    })
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}

/// Date-times in the formats above, or a bare date at midnight.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
