use std::path::PathBuf;

use eframe::egui::{self, ScrollArea, Ui};

use super::image::image_panel;
use super::plot;
use crate::data::metrics::ConditionSelection;
use crate::dispatch::{Payload, TriggerSource};
use crate::state::{AppState, Dashboard};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the dashboard switcher and dataset summary.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        for dashboard in [Dashboard::Ensheathments, Dashboard::SheathAnalysis] {
            if ui
                .selectable_label(state.dashboard == dashboard, dashboard.title())
                .clicked()
            {
                state.dashboard = dashboard;
            }
        }

        ui.separator();

        let ds = state.dispatcher.dataset();
        ui.label(format!(
            "{} observations from {}",
            ds.len(),
            ds.source.display()
        ));
    });
}

// ---------------------------------------------------------------------------
// Non-axonal ensheathments: heatmaps + drill-down
// ---------------------------------------------------------------------------

pub fn ensheathments(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(Dashboard::Ensheathments.title());
    });
    ui.label("Click on a Heatmap cell to see individual OL myelin data");
    ui.add_space(8.0);

    let mut clicked: Option<(TriggerSource, String)> = None;
    let [dmso, win] = &state.heatmaps;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |cols| {
                if let Some(cell) = plot::chart(&mut cols[0], "dmso_heatmap_graph", dmso) {
                    clicked = Some((TriggerSource::DmsoHeatmap, cell));
                }
                if let Some(cell) = plot::chart(&mut cols[1], "win_heatmap_graph", win) {
                    clicked = Some((TriggerSource::WinHeatmap, cell));
                }
            });

            ui.add_space(8.0);
            ui.label("Hover over points to see cell age and value");

            let charts = state.drilldown.metric_charts();
            ui.columns(3, |cols| {
                for (i, (col, chart)) in cols.iter_mut().zip(charts.iter()).enumerate() {
                    plot::chart(col, &format!("drilldown_metric_{i}"), chart);
                }
            });

            ui.add_space(8.0);
            ui.separator();
            ui.add_space(8.0);

            let images = state.drilldown.images();
            ui.columns(3, |cols| {
                for (col, image) in cols.iter_mut().zip(images.iter()) {
                    image_panel(col, image);
                }
            });
        });

    if let Some((source, cell)) = clicked {
        state.handle(source, Payload::Click { y: cell });
    }
}

// ---------------------------------------------------------------------------
// Myelin sheath analysis: condition dropdown + metric charts
// ---------------------------------------------------------------------------

pub fn sheath_analysis(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(Dashboard::SheathAnalysis.title());
    });

    let mut selection = state.metrics.selection;
    egui::ComboBox::from_id_salt("select_cond")
        .selected_text(selection.label())
        .show_ui(ui, |ui: &mut Ui| {
            for option in ConditionSelection::ALL {
                ui.selectable_value(&mut selection, option, option.label());
            }
        });
    state.select_condition(selection);

    ui.label(&state.metrics.status);
    ui.add_space(8.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, chart) in state.metrics.charts.iter().enumerate() {
                plot::chart(ui, &format!("condition_metric_{i}"), chart);
                ui.add_space(12.0);
            }
        });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Ask for the observation table when none was configured.
pub fn pick_data_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open myelin observation table")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file()
}
