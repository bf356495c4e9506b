use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{
    CELL_AGE, CELL_ID, COND, Dataset, FieldValue, Observation, REQUIRED_COLUMNS, Record,
};

const KEY_COLUMNS: [&str; 3] = [CELL_ID, CELL_AGE, COND];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the observation table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one column per field (recommended)
/// * `.json`    – `[{ "cell_ID": "A1", "cell_age": 1, ... }, ...]`
/// * `.csv`     – header row with the field names; empty cells are missing
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        "csv" => read_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let observations = records
        .iter()
        .enumerate()
        .filter(|(row, rec)| {
            let blank = is_blank_row(rec);
            if blank {
                log::warn!("Row {row}: no cell ID, age or condition, skipped");
            }
            !blank
        })
        .map(|(row, rec)| Observation::from_record(rec).with_context(|| format!("Row {row}")))
        .collect::<Result<Vec<_>>>()?;

    log::debug!("{} rows parsed from {}", observations.len(), path.display());
    Ok(Dataset::new(observations, path.to_path_buf()))
}

/// Trailing spreadsheet rows (`,,,,,,`) carry none of the key columns.
fn is_blank_row(record: &Record) -> bool {
    KEY_COLUMNS.iter().all(|col| match record.get(*col) {
        None | Some(FieldValue::Null) => true,
        Some(FieldValue::String(s)) => s.trim().is_empty(),
        Some(value) => value.is_null(),
    })
}

fn check_columns<'a>(available: impl IntoIterator<Item = &'a str>, what: &str) -> Result<()> {
    let available: Vec<&str> = available.into_iter().collect();
    for col in REQUIRED_COLUMNS {
        if !available.contains(&col) {
            bail!("{what} missing '{col}' column");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "cell_ID": "A1", "cell_age": 1, "cond": 0.0, "aberrant": 0,
///     "no_sheaths": 12, "avg_sheath_len": 21.4, "total_output": 256.8 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| -> Result<Record> {
            let obj = row
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            check_columns(obj.keys().map(String::as_str), &format!("Row {i}"))?;
            Ok(obj
                .iter()
                .map(|(key, val)| (key.clone(), json_to_field(val)))
                .collect())
        })
        .collect()
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    check_columns(headers.iter().map(String::as_str), "CSV")?;

    let mut records: Vec<Record> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(name, value)| (name.clone(), guess_field_type(value)))
                .collect(),
        );
    }
    Ok(records)
}

fn guess_field_type(s: &str) -> FieldValue {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if s == "true" || s == "false" {
        return FieldValue::Bool(s == "true");
    }
    FieldValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Read a Parquet file with one column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records: Vec<Record> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        check_columns(
            schema.fields().iter().map(|f| f.name().as_str()),
            "Parquet file",
        )?;

        for row in 0..batch.num_rows() {
            let record: Record = schema
                .fields()
                .iter()
                .enumerate()
                .map(|(i, field)| (field.name().clone(), extract_field_value(batch.column(i), row)))
                .collect();
            records.push(record);
        }
    }

    Ok(records)
}

/// Extract a single value from an Arrow column at a given row.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| FieldValue::String(s.value(row).to_string()))
            .unwrap_or(FieldValue::Null),
        DataType::LargeUtf8 => FieldValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| FieldValue::Integer(a.value(row) as i64))
            .unwrap_or(FieldValue::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| FieldValue::Integer(a.value(row)))
            .unwrap_or(FieldValue::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| FieldValue::Float(a.value(row) as f64))
            .unwrap_or(FieldValue::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| FieldValue::Float(a.value(row)))
            .unwrap_or(FieldValue::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| FieldValue::Bool(a.value(row)))
            .unwrap_or(FieldValue::Null),
        other => {
            log::warn!("unsupported parquet column type {other:?}, treating as missing");
            FieldValue::Null
        }
    }
}
