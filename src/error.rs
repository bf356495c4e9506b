use thiserror::Error;

/// Outcomes of the filter/aggregate engine that are not a chart.
///
/// Both variants are expected during normal use and end up as placeholder
/// charts rather than failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Filtering left nothing to plot.
    #[error("No data for {0}")]
    NoData(String),

    /// A clicked cell is not part of the cohort table.
    #[error("Cell {cell_id} not found in data")]
    CellNotFound { cell_id: String },
}
