use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::model::{Condition, Dataset, Observation, normalize_cell_id};
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Cohort selection
// ---------------------------------------------------------------------------

/// Cells imaged at this age are left out of the ensheathment cohort.
pub const EXCLUDED_AGE: u8 = 4;

/// A cell qualifies for the heatmaps only with exactly this many rows.
pub const REQUIRED_TIMEPOINTS: usize = 3;

/// Aberrant flag: 1 when at least one non-axonal ensheathment was scored.
pub fn aberrant_flag(aberrant: f64) -> u8 {
    u8::from(aberrant >= 1.0)
}

/// A cohort member row with its aberrant score resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    pub observation: Observation,
    pub aberrant: f64,
    pub aberrant_flag: u8,
    pub cell_id_norm: String,
}

/// Cells with complete ensheathment scoring, the source of both heatmaps.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    pub rows: Vec<CohortRow>,
}

impl Cohort {
    /// Build the cohort from the raw table.
    ///
    /// Drops the excluded dose, age [`EXCLUDED_AGE`] and rows without an
    /// aberrant score, then keeps cells with exactly [`REQUIRED_TIMEPOINTS`]
    /// remaining rows.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let scored: Vec<(&Observation, f64)> = dataset
            .observations
            .iter()
            .filter(|o| o.cond != Condition::ExcludedDose)
            .filter(|o| o.cell_age != EXCLUDED_AGE)
            .filter_map(|o| o.aberrant.map(|a| (o, a)))
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (obs, _) in &scored {
            *counts.entry(obs.cell_id.as_str()).or_default() += 1;
        }

        let rows: Vec<CohortRow> = scored
            .into_iter()
            .filter(|(obs, _)| counts[obs.cell_id.as_str()] == REQUIRED_TIMEPOINTS)
            .map(|(obs, aberrant)| CohortRow {
                observation: obs.clone(),
                aberrant,
                aberrant_flag: aberrant_flag(aberrant),
                cell_id_norm: normalize_cell_id(&obs.cell_id),
            })
            .collect();

        log::debug!("cohort: {} rows", rows.len());
        Cohort { rows }
    }

    /// Rows of one condition.
    pub fn condition_rows(&self, cond: Condition) -> impl Iterator<Item = &CohortRow> {
        self.rows
            .iter()
            .filter(move |r| r.observation.cond == cond)
    }

    /// Rows of a clicked cell under a condition.
    ///
    /// The raw ID wins. The normalised ID is only a fallback, and only when
    /// it points at a single raw ID.
    pub fn cell_rows(&self, cell_id: &str, cond: Condition) -> Vec<&CohortRow> {
        let exact: Vec<&CohortRow> = self
            .condition_rows(cond)
            .filter(|r| r.observation.cell_id == cell_id)
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        let wanted = normalize_cell_id(cell_id);
        let loose: Vec<&CohortRow> = self
            .condition_rows(cond)
            .filter(|r| r.cell_id_norm == wanted)
            .collect();
        let raw_ids: BTreeSet<&str> = loose
            .iter()
            .map(|r| r.observation.cell_id.as_str())
            .collect();
        if raw_ids.len() > 1 {
            log::warn!("cell ID '{cell_id}' is ambiguous: {raw_ids:?}");
            return Vec::new();
        }
        loose
    }

    /// Reshape one condition into a cell × age table of aberrant counts.
    pub fn pivot(&self, cond: Condition) -> Result<Pivot, EngineError> {
        let mut sums: BTreeMap<(&str, u8), (f64, usize)> = BTreeMap::new();
        let mut cells: BTreeSet<&str> = BTreeSet::new();
        let mut ages: BTreeSet<u8> = BTreeSet::new();

        for row in self.condition_rows(cond) {
            let obs = &row.observation;
            cells.insert(obs.cell_id.as_str());
            ages.insert(obs.cell_age);
            let entry = sums.entry((obs.cell_id.as_str(), obs.cell_age)).or_default();
            entry.0 += row.aberrant;
            entry.1 += 1;
        }

        if cells.is_empty() {
            return Err(EngineError::NoData(format!("{} heatmap", cond.label())));
        }

        let ages: Vec<u8> = ages.into_iter().collect();
        let values: Vec<Vec<Option<f64>>> = cells
            .iter()
            .map(|cell| {
                ages.iter()
                    .map(|age| {
                        sums.get(&(*cell, *age))
                            .map(|(sum, n)| sum / *n as f64)
                    })
                    .collect()
            })
            .collect();

        Ok(Pivot {
            cond,
            cell_ids: cells.into_iter().map(str::to_string).collect(),
            ages,
            values,
        })
    }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

/// Aberrant counts indexed by cell (rows) and age (columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pivot {
    pub cond: Condition,
    /// Sorted row labels.
    pub cell_ids: Vec<String>,
    /// Sorted column labels.
    pub ages: Vec<u8>,
    /// `values[row][col]`; `None` where the cell was not scored at that age.
    pub values: Vec<Vec<Option<f64>>>,
}

#[cfg(test)]
impl Pivot {
    pub fn get(&self, cell_id: &str, age: u8) -> Option<f64> {
        let row = self.cell_ids.iter().position(|c| c == cell_id)?;
        let col = self.ages.iter().position(|a| *a == age)?;
        self.values[row][col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn obs(cell: &str, age: u8, cond: Condition, aberrant: Option<f64>) -> Observation {
        Observation {
            cell_id: cell.to_string(),
            cell_age: age,
            cond,
            aberrant,
            no_sheaths: Some(10.0),
            avg_sheath_len: Some(20.0),
            total_output: Some(200.0),
        }
    }

    fn dataset(observations: Vec<Observation>) -> Dataset {
        Dataset::new(observations, PathBuf::new())
    }

    #[test]
    fn example_cell_flags_and_pivot() {
        let ds = dataset(vec![
            obs("A1", 1, Condition::Control, Some(0.0)),
            obs("A1", 2, Condition::Control, Some(1.0)),
            obs("A1", 3, Condition::Control, Some(2.0)),
        ]);
        let cohort = Cohort::from_dataset(&ds);
        let flags: Vec<u8> = cohort.rows.iter().map(|r| r.aberrant_flag).collect();
        assert_eq!(flags, vec![0, 1, 1]);

        let pivot = cohort.pivot(Condition::Control).unwrap();
        assert_eq!(pivot.get("A1", 2), Some(1.0));
        assert_eq!(pivot.ages, vec![1, 2, 3]);
    }

    #[test]
    fn incomplete_and_excluded_cells_are_dropped() {
        let ds = dataset(vec![
            // only two scored ages
            obs("B1", 1, Condition::Control, Some(0.0)),
            obs("B1", 2, Condition::Control, None),
            obs("B1", 3, Condition::Control, Some(1.0)),
            // age 4 does not count towards completeness
            obs("B2", 1, Condition::Treatment, Some(0.0)),
            obs("B2", 2, Condition::Treatment, Some(0.0)),
            obs("B2", 4, Condition::Treatment, Some(3.0)),
            // excluded dose
            obs("B3", 1, Condition::ExcludedDose, Some(1.0)),
            obs("B3", 2, Condition::ExcludedDose, Some(1.0)),
            obs("B3", 3, Condition::ExcludedDose, Some(1.0)),
            // the age 4 row is ignored, leaving three
            obs("B4", 1, Condition::Treatment, Some(2.0)),
            obs("B4", 2, Condition::Treatment, Some(0.0)),
            obs("B4", 3, Condition::Treatment, Some(5.0)),
            obs("B4", 4, Condition::Treatment, Some(5.0)),
        ]);
        let cohort = Cohort::from_dataset(&ds);
        let cells: BTreeSet<&str> = cohort
            .rows
            .iter()
            .map(|r| r.observation.cell_id.as_str())
            .collect();
        assert_eq!(cells, BTreeSet::from(["B4"]));
    }

    #[test]
    fn pivot_of_missing_condition_signals_no_data() {
        let ds = dataset(vec![
            obs("A1", 1, Condition::Control, Some(0.0)),
            obs("A1", 2, Condition::Control, Some(0.0)),
            obs("A1", 3, Condition::Control, Some(0.0)),
        ]);
        let cohort = Cohort::from_dataset(&ds);
        assert!(matches!(
            cohort.pivot(Condition::Treatment),
            Err(EngineError::NoData(_))
        ));
    }

    #[test]
    fn pivot_leaves_unscored_cells_blank() {
        // C1 has a duplicated age 1 and no age 3; it still has three rows.
        let ds = dataset(vec![
            obs("C1", 1, Condition::Control, Some(1.0)),
            obs("C1", 1, Condition::Control, Some(3.0)),
            obs("C1", 2, Condition::Control, Some(0.0)),
            obs("C2", 1, Condition::Control, Some(0.0)),
            obs("C2", 2, Condition::Control, Some(0.0)),
            obs("C2", 3, Condition::Control, Some(1.0)),
        ]);
        let pivot = Cohort::from_dataset(&ds).pivot(Condition::Control).unwrap();
        assert_eq!(pivot.get("C1", 1), Some(2.0));
        assert_eq!(pivot.get("C1", 3), None);
        assert_eq!(pivot.cell_ids, vec!["C1", "C2"]);
    }

    #[test]
    fn clicked_ids_match_after_normalisation() {
        let ds = dataset(vec![
            obs("Cell_7", 1, Condition::Treatment, Some(0.0)),
            obs("Cell_7", 2, Condition::Treatment, Some(0.0)),
            obs("Cell_7", 3, Condition::Treatment, Some(0.0)),
        ]);
        let cohort = Cohort::from_dataset(&ds);
        assert_eq!(cohort.cell_rows(" cell_7", Condition::Treatment).len(), 3);
        assert!(cohort.cell_rows("cell_7", Condition::Control).is_empty());
    }

    #[test]
    fn case_variant_ids_stay_separate_cells() {
        let ds = dataset(vec![
            obs("A1", 1, Condition::Control, Some(1.0)),
            obs("A1", 2, Condition::Control, Some(1.0)),
            obs("A1", 3, Condition::Control, Some(1.0)),
            obs("a1", 1, Condition::Control, Some(40.0)),
            obs("a1", 2, Condition::Control, Some(40.0)),
            obs("a1", 3, Condition::Control, Some(40.0)),
        ]);
        let cohort = Cohort::from_dataset(&ds);
        let pivot = cohort.pivot(Condition::Control).unwrap();
        assert_eq!(pivot.cell_ids, vec!["A1", "a1"]);

        for (clicked, value) in [("A1", 1.0), ("a1", 40.0)] {
            let rows = cohort.cell_rows(clicked, Condition::Control);
            assert_eq!(rows.len(), 3);
            assert!(rows.iter().all(|r| r.observation.cell_id == clicked));
            assert!(rows.iter().all(|r| r.aberrant == value));
        }

        // only the normalised form matches, and it names two cells
        assert!(cohort.cell_rows(" A1 ", Condition::Control).is_empty());
    }

    fn arb_observation() -> impl Strategy<Value = Observation> {
        (
            prop::sample::select(vec!["A", "B", "C", "D", "E"]),
            1u8..=4,
            prop::sample::select(vec![
                Condition::Control,
                Condition::ExcludedDose,
                Condition::Treatment,
            ]),
            prop::option::of(0u8..5),
        )
            .prop_map(|(cell, age, cond, aberrant)| {
                obs(cell, age, cond, aberrant.map(f64::from))
            })
    }

    proptest! {
        #[test]
        fn cohort_invariants(rows in prop::collection::vec(arb_observation(), 0..40)) {
            let ds = dataset(rows.clone());
            let cohort = Cohort::from_dataset(&ds);

            for row in &cohort.rows {
                prop_assert_ne!(row.observation.cond, Condition::ExcludedDose);
                prop_assert_ne!(row.observation.cell_age, EXCLUDED_AGE);
                prop_assert_eq!(row.aberrant_flag == 1, row.aberrant >= 1.0);
            }

            for cond in [Condition::Control, Condition::Treatment] {
                let pivoted: BTreeSet<String> = cohort
                    .pivot(cond)
                    .map(|p| p.cell_ids.into_iter().collect())
                    .unwrap_or_default();
                let expected: BTreeSet<String> = rows
                    .iter()
                    .filter(|o| o.cond == cond)
                    .map(|o| o.cell_id.clone())
                    .filter(|id| {
                        rows.iter()
                            .filter(|o| &o.cell_id == id)
                            .filter(|o| o.cond != Condition::ExcludedDose)
                            .filter(|o| o.cell_age != EXCLUDED_AGE)
                            .filter(|o| o.aberrant.is_some())
                            .count() == REQUIRED_TIMEPOINTS
                    })
                    .filter(|id| {
                        rows.iter().any(|o| {
                            &o.cell_id == id
                                && o.cond == cond
                                && o.cell_age != EXCLUDED_AGE
                                && o.aberrant.is_some()
                        })
                    })
                    .collect();
                prop_assert_eq!(pivoted, expected);
            }
        }
    }
}
