use crate::chart::builder::CLICK_PROMPT;
use crate::chart::spec::{ChartSpec, ImagePanelSpec};
use crate::data::metrics::ConditionSelection;
use crate::dispatch::{Dispatcher, DrilldownUpdate, MetricsUpdate, Payload, TriggerSource, Update};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Ensheathments,
    SheathAnalysis,
}

impl Dashboard {
    pub fn title(self) -> &'static str {
        match self {
            Dashboard::Ensheathments => "Non-axonal Ensheathments",
            Dashboard::SheathAnalysis => "Myelin Sheath Analysis",
        }
    }
}

/// The full UI state, independent of rendering.
///
/// Only holds the charts last produced by the dispatcher; the dataset itself
/// lives behind the dispatcher's read-only handle.
pub struct AppState {
    pub dispatcher: Dispatcher,

    pub dashboard: Dashboard,

    /// DMSO and WIN heatmaps, built once at startup.
    pub heatmaps: [ChartSpec; 2],

    /// Drill-down charts shown below the heatmaps.
    pub drilldown: DrilldownView,

    /// Current dropdown selection and its charts.
    pub metrics: MetricsUpdate,
}

/// What the drill-down area shows: a prompt until the first click.
pub enum DrilldownView {
    Prompt,
    Cell(DrilldownUpdate),
}

impl DrilldownView {
    pub fn metric_charts(&self) -> [ChartSpec; 3] {
        match self {
            DrilldownView::Prompt => std::array::from_fn(|_| ChartSpec::placeholder(CLICK_PROMPT)),
            DrilldownView::Cell(update) => update.metric_charts.clone(),
        }
    }

    pub fn images(&self) -> [ImagePanelSpec; 3] {
        match self {
            DrilldownView::Prompt => std::array::from_fn(|_| ImagePanelSpec::Placeholder {
                title: CLICK_PROMPT.to_string(),
            }),
            DrilldownView::Cell(update) => update.images.clone(),
        }
    }
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let heatmaps = dispatcher.heatmaps();
        let metrics = dispatcher.metrics(ConditionSelection::default());
        Self {
            dispatcher,
            dashboard: Dashboard::Ensheathments,
            heatmaps,
            drilldown: DrilldownView::Prompt,
            metrics,
        }
    }

    /// Route one interaction and apply the resulting update, if any.
    pub fn handle(&mut self, source: TriggerSource, payload: Payload) {
        match self.dispatcher.dispatch(source, payload) {
            Some(Update::Drilldown(update)) => self.drilldown = DrilldownView::Cell(update),
            Some(Update::Metrics(update)) => self.metrics = update,
            None => {}
        }
    }

    pub fn select_condition(&mut self, selection: ConditionSelection) {
        if selection != self.metrics.selection {
            self.handle(TriggerSource::ConditionDropdown, Payload::Selection(selection));
        }
    }
}
