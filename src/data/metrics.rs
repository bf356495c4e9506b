use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::Serialize;

use super::cohort::Cohort;
use super::model::{Condition, Dataset, Observation};
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// The three per-cell sheath measurements plotted against age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    NoSheaths,
    AvgSheathLen,
    TotalOutput,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::NoSheaths, Metric::AvgSheathLen, Metric::TotalOutput];

    /// Source column name.
    pub fn column(self) -> &'static str {
        match self {
            Metric::NoSheaths => super::model::NO_SHEATHS,
            Metric::AvgSheathLen => super::model::AVG_SHEATH_LEN,
            Metric::TotalOutput => super::model::TOTAL_OUTPUT,
        }
    }

    pub fn value(self, obs: &Observation) -> Option<f64> {
        match self {
            Metric::NoSheaths => obs.no_sheaths,
            Metric::AvgSheathLen => obs.avg_sheath_len,
            Metric::TotalOutput => obs.total_output,
        }
    }
}

// ---------------------------------------------------------------------------
// Condition dropdown
// ---------------------------------------------------------------------------

/// Dropdown choice on the sheath analysis dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ConditionSelection {
    Dmso,
    Win,
    #[default]
    Both,
}

impl ConditionSelection {
    pub const ALL: [ConditionSelection; 3] = [
        ConditionSelection::Dmso,
        ConditionSelection::Win,
        ConditionSelection::Both,
    ];

    /// The single condition selected, or `None` for both.
    pub fn condition(self) -> Option<Condition> {
        match self {
            ConditionSelection::Dmso => Some(Condition::Control),
            ConditionSelection::Win => Some(Condition::Treatment),
            ConditionSelection::Both => None,
        }
    }

    /// Dropdown label.
    pub fn label(self) -> &'static str {
        match self {
            ConditionSelection::Dmso => "DMSO",
            ConditionSelection::Win => "WIN 1.0",
            ConditionSelection::Both => "BOTH",
        }
    }
}

impl fmt::Display for ConditionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.condition() {
            Some(cond) => write!(f, "{cond}"),
            None => write!(f, "both"),
        }
    }
}

impl FromStr for ConditionSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("both") {
            return Ok(ConditionSelection::Both);
        }
        match s.parse::<f64>().ok().and_then(Condition::from_code) {
            Some(Condition::Control) => Ok(ConditionSelection::Dmso),
            Some(Condition::Treatment) => Ok(ConditionSelection::Win),
            _ => bail!("unknown condition selection '{s}' (expected 0.0, 1.0 or both)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// What a line series is coloured by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SeriesKey {
    Cell(String),
    Condition(Condition),
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Cell(id) => write!(f, "{id}"),
            SeriesKey::Condition(cond) => write!(f, "{cond}"),
        }
    }
}

/// One trajectory: (cell_age, value) points sorted by age.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: SeriesKey,
    pub points: Vec<(u8, f64)>,
}

/// Build the line series for one metric under a dropdown selection.
///
/// A single condition yields one raw trajectory per cell, skipping rows
/// where the metric is missing. `Both` yields the per-age mean of each
/// condition, always Control then Treatment.
pub fn condition_series(
    dataset: &Dataset,
    metric: Metric,
    selection: ConditionSelection,
) -> Result<Vec<Series>, EngineError> {
    let rows = dataset
        .observations
        .iter()
        .filter(|o| o.cond != Condition::ExcludedDose);

    let series = match selection.condition() {
        Some(cond) => {
            let mut per_cell: Vec<Series> = Vec::new();
            for obs in rows.filter(|o| o.cond == cond) {
                let Some(value) = metric.value(obs) else {
                    continue;
                };
                let key = SeriesKey::Cell(obs.cell_id.clone());
                match per_cell.iter_mut().find(|s| s.key == key) {
                    Some(series) => series.points.push((obs.cell_age, value)),
                    None => per_cell.push(Series {
                        key,
                        points: vec![(obs.cell_age, value)],
                    }),
                }
            }
            for series in &mut per_cell {
                series.points.sort_by_key(|(age, _)| *age);
            }
            per_cell
        }
        None => {
            let mut sums: BTreeMap<(Condition, u8), (f64, usize)> = BTreeMap::new();
            for obs in rows {
                if let Some(value) = metric.value(obs) {
                    let entry = sums.entry((obs.cond, obs.cell_age)).or_default();
                    entry.0 += value;
                    entry.1 += 1;
                }
            }
            [Condition::Control, Condition::Treatment]
                .into_iter()
                .map(|cond| Series {
                    key: SeriesKey::Condition(cond),
                    points: sums
                        .iter()
                        .filter(|((c, _), _)| *c == cond)
                        .map(|((_, age), (sum, n))| (*age, sum / *n as f64))
                        .collect(),
                })
                .collect()
        }
    };

    if series.iter().all(|s| s.points.is_empty()) {
        return Err(EngineError::NoData(format!(
            "{} ({selection})",
            metric.column()
        )));
    }
    Ok(series)
}

// ---------------------------------------------------------------------------
// Drill-down
// ---------------------------------------------------------------------------

/// Cohort rows of a single clicked cell with all three metrics present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellTrajectory {
    pub cell_id: String,
    pub cond: Condition,
    /// Sorted by age.
    pub rows: Vec<Observation>,
}

impl CellTrajectory {
    pub fn series(&self, metric: Metric) -> Series {
        Series {
            key: SeriesKey::Cell(self.cell_id.clone()),
            points: self
                .rows
                .iter()
                .filter_map(|o| metric.value(o).map(|v| (o.cell_age, v)))
                .collect(),
        }
    }
}

/// Resolve a heatmap click to the clicked cell's metric rows.
pub fn cell_trajectory(
    cohort: &Cohort,
    cell_id: &str,
    cond: Condition,
) -> Result<CellTrajectory, EngineError> {
    let rows = cohort.cell_rows(cell_id, cond);
    if rows.is_empty() {
        return Err(EngineError::CellNotFound {
            cell_id: cell_id.to_string(),
        });
    }

    let mut complete: Vec<Observation> = rows
        .into_iter()
        .map(|r| &r.observation)
        .filter(|o| Metric::ALL.iter().all(|m| m.value(o).is_some()))
        .cloned()
        .collect();
    if complete.is_empty() {
        return Err(EngineError::NoData(cell_id.to_string()));
    }
    complete.sort_by_key(|o| o.cell_age);

    Ok(CellTrajectory {
        cell_id: complete[0].cell_id.clone(),
        cond,
        rows: complete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn obs(cell: &str, age: u8, cond: Condition, sheaths: Option<f64>) -> Observation {
        Observation {
            cell_id: cell.to_string(),
            cell_age: age,
            cond,
            aberrant: Some(0.0),
            no_sheaths: sheaths,
            avg_sheath_len: Some(25.0),
            total_output: sheaths.map(|s| s * 25.0),
        }
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec![
                obs("A1", 2, Condition::Control, Some(12.0)),
                obs("A1", 1, Condition::Control, Some(10.0)),
                obs("A2", 1, Condition::Control, Some(20.0)),
                obs("A2", 2, Condition::Control, None),
                obs("W1", 1, Condition::Treatment, Some(4.0)),
                obs("W2", 1, Condition::Treatment, Some(8.0)),
                obs("W1", 4, Condition::Treatment, Some(9.0)),
                obs("X1", 1, Condition::ExcludedDose, Some(100.0)),
            ],
            PathBuf::new(),
        )
    }

    #[test]
    fn single_condition_gives_raw_per_cell_series() {
        let series = condition_series(&sample(), Metric::NoSheaths, ConditionSelection::Dmso).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, SeriesKey::Cell("A1".into()));
        assert_eq!(series[0].points, vec![(1, 10.0), (2, 12.0)]);
        // missing value dropped, not zeroed
        assert_eq!(series[1].points, vec![(1, 20.0)]);
    }

    #[test]
    fn both_gives_two_mean_series() {
        let series = condition_series(&sample(), Metric::NoSheaths, ConditionSelection::Both).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, SeriesKey::Condition(Condition::Control));
        assert_eq!(series[0].points, vec![(1, 15.0), (2, 12.0)]);
        assert_eq!(series[1].key, SeriesKey::Condition(Condition::Treatment));
        assert_eq!(series[1].points, vec![(1, 6.0), (4, 9.0)]);
    }

    #[test]
    fn excluded_dose_never_plotted() {
        for selection in ConditionSelection::ALL {
            let series = condition_series(&sample(), Metric::NoSheaths, selection).unwrap();
            assert!(series
                .iter()
                .all(|s| s.points.iter().all(|(_, v)| *v != 100.0)));
        }
    }

    #[test]
    fn empty_selection_signals_no_data() {
        let ds = Dataset::new(
            vec![obs("A1", 1, Condition::Control, None)],
            PathBuf::new(),
        );
        let err = condition_series(&ds, Metric::NoSheaths, ConditionSelection::Win).unwrap_err();
        assert!(matches!(err, EngineError::NoData(_)));
    }

    #[test]
    fn selection_parsing() {
        assert_eq!("0.0".parse::<ConditionSelection>().unwrap(), ConditionSelection::Dmso);
        assert_eq!("1".parse::<ConditionSelection>().unwrap(), ConditionSelection::Win);
        assert_eq!("BOTH".parse::<ConditionSelection>().unwrap(), ConditionSelection::Both);
        assert!("0.5".parse::<ConditionSelection>().is_err());
        assert_eq!(ConditionSelection::Win.to_string(), "1.0");
    }

    #[test]
    fn drill_down_for_unknown_and_incomplete_cells() {
        let ds = Dataset::new(
            vec![
                obs("C1", 1, Condition::Control, None),
                obs("C1", 2, Condition::Control, None),
                obs("C1", 3, Condition::Control, None),
                obs("C2", 3, Condition::Control, Some(3.0)),
                obs("C2", 1, Condition::Control, Some(1.0)),
                obs("C2", 2, Condition::Control, None),
            ],
            PathBuf::new(),
        );
        let cohort = Cohort::from_dataset(&ds);

        assert!(matches!(
            cell_trajectory(&cohort, "Z9", Condition::Control),
            Err(EngineError::CellNotFound { .. })
        ));
        assert_eq!(
            cell_trajectory(&cohort, "C1", Condition::Control),
            Err(EngineError::NoData("C1".into()))
        );

        let traj = cell_trajectory(&cohort, "c2", Condition::Control).unwrap();
        assert_eq!(traj.cell_id, "C2");
        assert_eq!(traj.series(Metric::NoSheaths).points, vec![(1, 1.0), (3, 3.0)]);
    }
}
