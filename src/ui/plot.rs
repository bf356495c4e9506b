use eframe::egui::{self, Color32, Sense, Stroke, Ui};
use egui_plot::{GridInput, GridMark, Legend, Line, Plot, PlotPoints, Points, Polygon};

use crate::chart::color::Rgb;
use crate::chart::spec::{AxisSpec, ChartSpec, HeatmapSpec, LineChartSpec};

const DEFAULT_HEIGHT: f32 = 300.0;
const COLOR_BAR_STEPS: usize = 48;

pub fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

/// Grid spacer that only ever emits the given tick positions.
fn fixed_ticks(ticks: Vec<f64>) -> impl Fn(GridInput) -> Vec<GridMark> {
    move |_input| {
        ticks
            .iter()
            .map(|&value| GridMark {
                value,
                step_size: 1.0,
            })
            .collect()
    }
}

fn static_plot(id: &str, x: &AxisSpec, y: &AxisSpec) -> Plot<'static> {
    Plot::new(id)
        .x_axis_label(x.title.clone())
        .y_axis_label(y.title.clone())
        .show_grid([x.show_grid, y.show_grid])
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Draw any chart description. Returns the clicked row's cell ID when the
/// chart is a heatmap and the user clicked a cell.
pub fn chart(ui: &mut Ui, id: &str, spec: &ChartSpec) -> Option<String> {
    match spec {
        ChartSpec::Heatmap(h) => heatmap(ui, id, h),
        ChartSpec::Line(l) => {
            line_chart(ui, id, l);
            None
        }
        ChartSpec::Placeholder { title } => {
            placeholder(ui, title, DEFAULT_HEIGHT);
            None
        }
    }
}

/// Titled empty frame standing in for a chart.
pub fn placeholder(ui: &mut Ui, title: &str, height: f32) {
    ui.strong(title);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), height), Sense::hover());
    ui.painter().rect_filled(rect, 4.0, ui.visuals().faint_bg_color);
}

// ---------------------------------------------------------------------------
// Line charts
// ---------------------------------------------------------------------------

/// A fixed y range is never stretched by the data.
fn fixed_y_bounds(axis: &AxisSpec) -> Option<[f64; 2]> {
    axis.range.filter(|[lo, hi]| lo < hi)
}

pub fn line_chart(ui: &mut Ui, id: &str, spec: &LineChartSpec) {
    ui.strong(&spec.title);

    let x_title = spec.x_axis.title.clone();
    let y_title = spec.y_axis.title.clone();
    let with_name = spec.legend_title.is_some();

    let mut plot = static_plot(id, &spec.x_axis, &spec.y_axis)
        .height(spec.height.unwrap_or(DEFAULT_HEIGHT))
        .label_formatter(move |name, point| {
            let mut label = String::new();
            if with_name && !name.is_empty() {
                label.push_str(&format!("{name}\n"));
            }
            label.push_str(&format!("{x_title}: {}\n{y_title}: {:.2}", point.x.round(), point.y));
            label
        });

    if spec.legend_title.is_some() {
        plot = plot.legend(Legend::default());
    }
    if let Some(ticks) = &spec.x_axis.tick_values {
        let lo = ticks.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = ticks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        plot = plot
            .x_grid_spacer(fixed_ticks(ticks.clone()))
            .include_x(lo - 0.2)
            .include_x(hi + 0.2);
    }
    if let Some([lo, hi]) = fixed_y_bounds(&spec.y_axis) {
        plot = plot.default_y_bounds(lo, hi);
    } else if spec.y_axis.range_to_zero {
        plot = plot.include_y(0.0);
    }

    plot.show(ui, |plot_ui| {
        for series in &spec.series {
            let color = color32(series.color);
            plot_ui.line(
                Line::new(&series.name, PlotPoints::from(series.points.clone()))
                    .color(color)
                    .width(2.0),
            );
            if series.markers {
                plot_ui.points(
                    Points::new(&series.name, PlotPoints::from(series.points.clone()))
                        .color(color)
                        .radius(3.5),
                );
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Heatmaps
// ---------------------------------------------------------------------------

/// Plot-space row of a heatmap row index; row 0 is drawn at the top.
fn row_to_y(row: usize, n_rows: usize) -> f64 {
    (n_rows - 1 - row) as f64
}

fn y_to_row(y: f64, n_rows: usize) -> Option<usize> {
    let y = y.round();
    if y < 0.0 || y >= n_rows as f64 {
        return None;
    }
    Some(n_rows - 1 - y as usize)
}

fn x_to_col(x: f64, ages: &[u8]) -> Option<usize> {
    ages.iter().position(|a| (x - f64::from(*a)).abs() <= 0.5)
}

pub fn heatmap(ui: &mut Ui, id: &str, spec: &HeatmapSpec) -> Option<String> {
    ui.strong(&spec.title);

    let n_rows = spec.y.len();
    let labels = spec.y.clone();
    let hover_labels = spec.y.clone();
    let hover_ages = spec.x.clone();
    let hover_z = spec.z.clone();
    let color_label = spec.color_label.clone();

    let (x_lo, x_hi) = match (spec.x.first(), spec.x.last()) {
        (Some(lo), Some(hi)) => (f64::from(*lo), f64::from(*hi)),
        _ => (0.0, 0.0),
    };

    let plot = static_plot(id, &spec.x_axis, &spec.y_axis)
        .height((n_rows as f32 * 18.0).clamp(DEFAULT_HEIGHT, 900.0))
        .include_x(x_lo - 0.5)
        .include_x(x_hi + 0.5)
        .include_y(-0.5)
        .include_y(n_rows as f64 - 0.5)
        .x_grid_spacer(fixed_ticks(spec.x.iter().map(|a| f64::from(*a)).collect()))
        .y_grid_spacer(fixed_ticks((0..n_rows).map(|r| r as f64).collect()))
        .y_axis_formatter(move |mark, _range| {
            y_to_row(mark.value, n_rows)
                .and_then(|r| labels.get(r).cloned())
                .unwrap_or_default()
        })
        .label_formatter(move |_name, point| {
            let (Some(row), Some(col)) = (
                y_to_row(point.y, n_rows),
                x_to_col(point.x, &hover_ages),
            ) else {
                return String::new();
            };
            let value = hover_z[row][col]
                .map(|v| format!("{v}"))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "Cell Age: {}\nCell ID: {}\n{color_label}: {value}",
                hover_ages[col], hover_labels[row]
            )
        });

    let response = plot.show(ui, |plot_ui| {
        for (row, values) in spec.z.iter().enumerate() {
            let yc = row_to_y(row, n_rows);
            for (col, value) in values.iter().enumerate() {
                let Some(value) = value else {
                    continue;
                };
                let xc = f64::from(spec.x[col]);
                let fill = color32(spec.color_scale.color_for(*value, spec.zmin, spec.zmax));
                plot_ui.polygon(
                    Polygon::new("", PlotPoints::from(vec![
                        [xc - 0.5, yc - 0.5],
                        [xc + 0.5, yc - 0.5],
                        [xc + 0.5, yc + 0.5],
                        [xc - 0.5, yc + 0.5],
                    ]))
                    .fill_color(fill)
                    .stroke(Stroke::NONE),
                );
            }
        }
        plot_ui.pointer_coordinate()
    });

    color_bar(ui, spec);

    if !response.response.clicked() {
        return None;
    }
    let point = response.inner?;
    x_to_col(point.x, &spec.x)?;
    let row = y_to_row(point.y, n_rows)?;
    spec.cell_at(row).map(str::to_string)
}

fn color_bar(ui: &mut Ui, spec: &HeatmapSpec) {
    ui.horizontal(|ui| {
        ui.small(format!("{} {}", spec.color_label, spec.zmin));
        let (rect, _) = ui.allocate_exact_size(egui::vec2(160.0, 12.0), Sense::hover());
        let step = rect.width() / COLOR_BAR_STEPS as f32;
        for i in 0..COLOR_BAR_STEPS {
            let t = i as f64 / (COLOR_BAR_STEPS - 1) as f64;
            let segment = egui::Rect::from_min_size(
                rect.min + egui::vec2(i as f32 * step, 0.0),
                egui::vec2(step + 0.5, rect.height()),
            );
            ui.painter()
                .rect_filled(segment, 0.0, color32(spec.color_scale.sample(t)));
        }
        ui.small(format!("{}", spec.zmax));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heatmap_rows_map_top_down() {
        assert_eq!(row_to_y(0, 3), 2.0);
        assert_eq!(y_to_row(2.2, 3), Some(0));
        assert_eq!(y_to_row(-0.4, 3), Some(2));
        assert_eq!(y_to_row(3.1, 3), None);
    }

    #[test]
    fn drilldown_y_range_is_fixed() {
        use crate::chart::builder::cell_metric_chart;
        use crate::data::cohort::Cohort;
        use crate::data::metrics::{Metric, cell_trajectory};
        use crate::data::model::{Condition, Dataset, Observation};

        let observations = (1..=3)
            .map(|age| Observation {
                cell_id: "A1".into(),
                cell_age: age,
                cond: Condition::Control,
                aberrant: Some(0.0),
                no_sheaths: Some(80.0),
                avg_sheath_len: Some(20.0),
                total_output: Some(2000.0),
            })
            .collect();
        let ds = Dataset::new(observations, Default::default());
        let trajectory = cell_trajectory(&Cohort::from_dataset(&ds), "A1", Condition::Control)
            .unwrap();

        let ChartSpec::Line(sheaths) = cell_metric_chart(&trajectory, Metric::NoSheaths) else {
            panic!("expected a line chart");
        };
        assert_eq!(fixed_y_bounds(&sheaths.y_axis), Some([0.0, 50.0]));
        let ChartSpec::Line(output) = cell_metric_chart(&trajectory, Metric::TotalOutput) else {
            panic!("expected a line chart");
        };
        assert_eq!(fixed_y_bounds(&output.y_axis), Some([0.0, 950.0]));
    }

    #[test]
    fn heatmap_columns_hit_within_half_cell() {
        let ages = [1, 2, 3];
        assert_eq!(x_to_col(2.4, &ages), Some(1));
        assert_eq!(x_to_col(3.6, &ages), None);
    }
}
