use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;

// ---------------------------------------------------------------------------
// FieldValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell, as read from CSV / JSON / Parquet before
/// it is interpreted as part of an [`Observation`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            // Spreadsheet exports often store integer IDs as floats ("12.0").
            FieldValue::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{}", *v as i64),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Numeric view of the value. NaN and empty cells are `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) if v.is_nan() => None,
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null) || matches!(self, FieldValue::Float(v) if v.is_nan())
    }
}

/// One raw table row: column name → value.
pub type Record = BTreeMap<String, FieldValue>;

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Experimental treatment group, encoded in the table as 0.0 / 0.5 / 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Condition {
    /// cond = 0.0 (DMSO vehicle).
    Control,
    /// cond = 0.5 (0.5 µM WIN), dropped from every cohort analysis.
    ExcludedDose,
    /// cond = 1.0 (1.0 µM WIN).
    Treatment,
}

impl Condition {
    pub fn from_code(code: f64) -> Option<Self> {
        const EPS: f64 = 1e-9;
        if (code - 0.0).abs() < EPS {
            Some(Condition::Control)
        } else if (code - 0.5).abs() < EPS {
            Some(Condition::ExcludedDose)
        } else if (code - 1.0).abs() < EPS {
            Some(Condition::Treatment)
        } else {
            None
        }
    }

    pub fn code(self) -> f64 {
        match self {
            Condition::Control => 0.0,
            Condition::ExcludedDose => 0.5,
            Condition::Treatment => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Condition::Control => "DMSO",
            Condition::ExcludedDose => "WIN 0.5",
            Condition::Treatment => "WIN 1.0",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Observation – one row of the table
// ---------------------------------------------------------------------------

/// Column names expected in every input file.
pub const CELL_ID: &str = "cell_ID";
pub const CELL_AGE: &str = "cell_age";
pub const COND: &str = "cond";
pub const ABERRANT: &str = "aberrant";
pub const NO_SHEATHS: &str = "no_sheaths";
pub const AVG_SHEATH_LEN: &str = "avg_sheath_len";
pub const TOTAL_OUTPUT: &str = "total_output";

pub const REQUIRED_COLUMNS: [&str; 7] = [
    CELL_ID,
    CELL_AGE,
    COND,
    ABERRANT,
    NO_SHEATHS,
    AVG_SHEATH_LEN,
    TOTAL_OUTPUT,
];

/// Measurements for one cell at one age under one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub cell_id: String,
    pub cell_age: u8,
    pub cond: Condition,
    pub aberrant: Option<f64>,
    pub no_sheaths: Option<f64>,
    pub avg_sheath_len: Option<f64>,
    pub total_output: Option<f64>,
}

impl Observation {
    /// Interpret a raw record. Missing metric cells become `None`; a missing
    /// key column or an unknown condition code is an error.
    pub fn from_record(record: &Record) -> Result<Self> {
        let field = |name: &str| {
            record
                .get(name)
                .with_context(|| format!("missing '{name}' column"))
        };

        let id_value = field(CELL_ID)?;
        if id_value.is_null() {
            bail!("empty '{CELL_ID}'");
        }
        let cell_id = id_value.to_string();

        let age = field(CELL_AGE)?
            .as_f64()
            .with_context(|| format!("'{CELL_AGE}' is not a number"))?;
        if age.fract() != 0.0 || !(1.0..=u8::MAX as f64).contains(&age) {
            bail!("'{CELL_AGE}' must be a positive whole number, got {age}");
        }

        let code = field(COND)?
            .as_f64()
            .with_context(|| format!("'{COND}' is not a number"))?;
        let cond = Condition::from_code(code)
            .with_context(|| format!("unknown condition code {code}"))?;

        Ok(Observation {
            cell_id,
            cell_age: age as u8,
            cond,
            aberrant: field(ABERRANT)?.as_f64(),
            no_sheaths: field(NO_SHEATHS)?.as_f64(),
            avg_sheath_len: field(AVG_SHEATH_LEN)?.as_f64(),
            total_output: field(TOTAL_OUTPUT)?.as_f64(),
        })
    }
}

/// Case- and whitespace-insensitive form of a cell ID, used for click lookups.
pub fn normalize_cell_id(id: &str) -> String {
    id.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Dataset – the loaded table
// ---------------------------------------------------------------------------

/// The full observation table. Loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub observations: Vec<Observation>,
    /// File the table was read from (empty for in-memory tables).
    pub source: PathBuf,
}

/// Shared immutable handle passed to every handler.
pub type DatasetHandle = Arc<Dataset>;

impl Dataset {
    pub fn new(observations: Vec<Observation>, source: PathBuf) -> Self {
        Dataset {
            observations,
            source,
        }
    }

    pub fn into_handle(self) -> DatasetHandle {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, FieldValue)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn full_record(cond: f64) -> Record {
        record(&[
            (CELL_ID, FieldValue::String("A1".into())),
            (CELL_AGE, FieldValue::Float(2.0)),
            (COND, FieldValue::Float(cond)),
            (ABERRANT, FieldValue::Null),
            (NO_SHEATHS, FieldValue::Integer(7)),
            (AVG_SHEATH_LEN, FieldValue::Float(f64::NAN)),
            (TOTAL_OUTPUT, FieldValue::String("123.5".into())),
        ])
    }

    #[test]
    fn record_becomes_observation_with_missing_metrics() {
        let obs = Observation::from_record(&full_record(1.0)).unwrap();
        assert_eq!(obs.cell_id, "A1");
        assert_eq!(obs.cell_age, 2);
        assert_eq!(obs.cond, Condition::Treatment);
        assert_eq!(obs.aberrant, None);
        assert_eq!(obs.no_sheaths, Some(7.0));
        assert_eq!(obs.avg_sheath_len, None);
        assert_eq!(obs.total_output, Some(123.5));
    }

    #[test]
    fn unknown_condition_is_rejected() {
        let err = Observation::from_record(&full_record(0.25)).unwrap_err();
        assert!(err.to_string().contains("unknown condition"));
    }

    #[test]
    fn missing_column_is_rejected() {
        let mut rec = full_record(0.0);
        rec.remove(NO_SHEATHS);
        let err = Observation::from_record(&rec).unwrap_err();
        assert!(err.to_string().contains("no_sheaths"));
    }

    #[test]
    fn float_ids_render_without_fraction() {
        assert_eq!(FieldValue::Float(12.0).to_string(), "12");
        assert_eq!(normalize_cell_id("  Cell_B2 "), "cell_b2");
    }
}
