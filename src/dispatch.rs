//! Explicit routing of UI interactions to update operations.
//!
//! Every interaction is a `(TriggerSource, Payload)` pair. [`Dispatcher::dispatch`]
//! maps the valid pairs to an [`Update`] and returns `None` for anything else,
//! in which case the front-end leaves its charts untouched.

use serde::Serialize;

use crate::chart::builder::{condition_charts, drilldown_charts, heatmap_chart};
use crate::chart::spec::{ChartSpec, ImagePanelSpec};
use crate::data::cohort::Cohort;
use crate::data::metrics::ConditionSelection;
use crate::data::model::{Condition, DatasetHandle};
use crate::images::ImageResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    DmsoHeatmap,
    WinHeatmap,
    ConditionDropdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Heatmap click; `y` is the clicked row's cell ID.
    Click { y: String },
    Selection(ConditionSelection),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrilldownUpdate {
    pub cell_id: String,
    pub cond: Condition,
    pub metric_charts: [ChartSpec; 3],
    pub images: [ImagePanelSpec; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsUpdate {
    pub selection: ConditionSelection,
    pub status: String,
    pub charts: [ChartSpec; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Drilldown(DrilldownUpdate),
    Metrics(MetricsUpdate),
}

/// Owns the read-only dataset handle and the image location; holds no
/// per-interaction state.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    dataset: DatasetHandle,
    images: ImageResolver,
}

impl Dispatcher {
    pub fn new(dataset: DatasetHandle, images: ImageResolver) -> Self {
        Dispatcher { dataset, images }
    }

    pub fn dataset(&self) -> &DatasetHandle {
        &self.dataset
    }

    /// Both heatmaps, DMSO first.
    pub fn heatmaps(&self) -> [ChartSpec; 2] {
        let cohort = Cohort::from_dataset(&self.dataset);
        [
            heatmap_chart(&cohort, Condition::Control),
            heatmap_chart(&cohort, Condition::Treatment),
        ]
    }

    pub fn dispatch(&self, source: TriggerSource, payload: Payload) -> Option<Update> {
        let update = match (source, payload) {
            (TriggerSource::DmsoHeatmap, Payload::Click { y }) => {
                Update::Drilldown(self.drilldown(&y, Condition::Control))
            }
            (TriggerSource::WinHeatmap, Payload::Click { y }) => {
                Update::Drilldown(self.drilldown(&y, Condition::Treatment))
            }
            (TriggerSource::ConditionDropdown, Payload::Selection(selection)) => {
                Update::Metrics(self.metrics(selection))
            }
            (source, payload) => {
                log::debug!("ignoring {payload:?} from {source:?}");
                return None;
            }
        };
        Some(update)
    }

    pub fn drilldown(&self, cell_id: &str, cond: Condition) -> DrilldownUpdate {
        log::info!("{} cell_id clicked: {cell_id}", cond.label());
        let cohort = Cohort::from_dataset(&self.dataset);
        DrilldownUpdate {
            cell_id: cell_id.to_string(),
            cond,
            metric_charts: drilldown_charts(&cohort, cell_id, cond),
            images: self.images.panels(cell_id),
        }
    }

    pub fn metrics(&self, selection: ConditionSelection) -> MetricsUpdate {
        log::info!("condition selected: {selection}");
        MetricsUpdate {
            selection,
            status: format!("Showing results for condition: {selection}"),
            charts: condition_charts(&self.dataset, selection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dataset, Observation};
    use std::path::PathBuf;

    fn dispatcher(image_dir: PathBuf) -> Dispatcher {
        let rows = (1..=3)
            .flat_map(|age| {
                [("D1", Condition::Control), ("B2", Condition::Treatment)].map(|(cell, cond)| {
                    Observation {
                        cell_id: cell.to_string(),
                        cell_age: age,
                        cond,
                        aberrant: Some(1.0),
                        no_sheaths: Some(9.0),
                        avg_sheath_len: Some(22.0),
                        total_output: Some(198.0),
                    }
                })
            })
            .collect();
        Dispatcher::new(
            Dataset::new(rows, PathBuf::new()).into_handle(),
            ImageResolver::new(image_dir),
        )
    }

    #[test]
    fn win_click_drills_into_treatment_cell() {
        let dir = std::env::temp_dir().join(format!("myelin-viewer-dispatch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("MAX_B2_d1.jpg"), b"jpg").unwrap();
        std::fs::write(dir.join("MAX_B2_d3.jpg"), b"jpg").unwrap();

        let update = dispatcher(dir).dispatch(
            TriggerSource::WinHeatmap,
            Payload::Click { y: "B2".into() },
        );
        let Some(Update::Drilldown(drill)) = update else {
            panic!("expected drill-down");
        };
        assert_eq!(drill.cond, Condition::Treatment);
        assert!(matches!(drill.metric_charts[0], ChartSpec::Line(_)));
        assert_eq!(drill.images[0].title(), "Cell ID: B2 Day 1");
        assert_eq!(drill.images[1].title(), "Image for day 2 not found");
        assert_eq!(drill.images[2].title(), "Cell ID: B2 Day 3");
    }

    #[test]
    fn dmso_click_on_win_cell_is_not_found() {
        let update = dispatcher(PathBuf::from("missing"))
            .dispatch(TriggerSource::DmsoHeatmap, Payload::Click { y: "B2".into() });
        let Some(Update::Drilldown(drill)) = update else {
            panic!("expected drill-down");
        };
        assert_eq!(drill.metric_charts[1].title(), "Cell B2 not found in data");
    }

    #[test]
    fn dropdown_selection_updates_metrics() {
        let update = dispatcher(PathBuf::from("missing")).dispatch(
            TriggerSource::ConditionDropdown,
            Payload::Selection(ConditionSelection::Both),
        );
        let Some(Update::Metrics(metrics)) = update else {
            panic!("expected metrics update");
        };
        assert_eq!(metrics.status, "Showing results for condition: both");
        assert_eq!(metrics.charts[2].title(), "Total Output across Cell Age");
    }

    #[test]
    fn mismatched_or_empty_triggers_do_nothing() {
        let d = dispatcher(PathBuf::from("missing"));
        assert_eq!(d.dispatch(TriggerSource::DmsoHeatmap, Payload::Empty), None);
        assert_eq!(
            d.dispatch(
                TriggerSource::WinHeatmap,
                Payload::Selection(ConditionSelection::Win)
            ),
            None
        );
        assert_eq!(
            d.dispatch(TriggerSource::ConditionDropdown, Payload::Click { y: "D1".into() }),
            None
        );
    }

    #[test]
    fn heatmaps_for_both_conditions() {
        let [dmso, win] = dispatcher(PathBuf::from("missing")).heatmaps();
        assert_eq!(dmso.title(), "DMSO Treated Cells");
        assert_eq!(win.title(), "WIN Treated Cells");
    }
}
