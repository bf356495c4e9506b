/// Data layer: core types, loading, and the filter/aggregate engine.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (loaded once, shared read-only)
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  cohort   │          │ metrics   │  per-condition line series
///   └──────────┘          └──────────┘
///   exclusion, completeness,
///   aberrant flag, pivot
/// ```

pub mod cohort;
pub mod loader;
pub mod metrics;
pub mod model;
