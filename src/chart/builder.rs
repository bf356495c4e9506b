use super::color::{ColorScale, Rgb, generate_palette};
use super::spec::{AxisSpec, ChartSpec, HeatmapSpec, LineChartSpec, LineSeriesSpec};
use crate::data::cohort::{Cohort, Pivot};
use crate::data::metrics::{
    CellTrajectory, ConditionSelection, Metric, Series, SeriesKey, cell_trajectory,
    condition_series,
};
use crate::data::model::{CELL_AGE, CELL_ID, COND, Condition, Dataset};

// ---------------------------------------------------------------------------
// Style constants
// ---------------------------------------------------------------------------

pub const HEATMAP_ZMIN: f64 = 0.0;
pub const HEATMAP_ZMAX: f64 = 3.0;

pub const DMSO_SCALE: [Rgb; 4] = [
    Rgb(218, 235, 255),
    Rgb(143, 160, 218),
    Rgb(68, 85, 143),
    Rgb(0, 10, 68),
];

pub const WIN_SCALE: [Rgb; 4] = [
    Rgb(246, 224, 233),
    Rgb(245, 164, 201),
    Rgb(247, 37, 133),
    Rgb(144, 9, 70),
];

pub const CONTROL_COLOR: Rgb = Rgb::from_hex(0x1768AC);
pub const TREATMENT_COLOR: Rgb = Rgb::from_hex(0xF72585);
pub const EXCLUDED_COLOR: Rgb = Rgb(128, 128, 128);

/// Single-cell drill-down line colour.
pub const CELL_LINE_COLOR: Rgb = Rgb::from_hex(0x3E000C);
pub const CELL_CHART_HEIGHT: f32 = 350.0;

/// Ages shown on the drill-down charts (age 4 is outside the cohort).
pub const COHORT_AGE_TICKS: [f64; 3] = [1.0, 2.0, 3.0];
/// Ages shown on the condition charts.
pub const ALL_AGE_TICKS: [f64; 4] = [1.0, 2.0, 3.0, 4.0];

const AXIS_LINE_WIDTH: f32 = 2.0;
const COLOR_LABEL: &str = "Non-axonal Ensheathments";

pub const CLICK_PROMPT: &str = "Click a cell to view data";

pub fn condition_color(cond: Condition) -> Rgb {
    match cond {
        Condition::Control => CONTROL_COLOR,
        Condition::Treatment => TREATMENT_COLOR,
        Condition::ExcludedDose => EXCLUDED_COLOR,
    }
}

fn axis(title: &str) -> AxisSpec {
    AxisSpec {
        title: title.to_string(),
        range: None,
        range_to_zero: false,
        tick_values: None,
        show_grid: false,
        show_line: true,
        line_color: Rgb::BLACK,
        line_width: AXIS_LINE_WIDTH,
    }
}

// ---------------------------------------------------------------------------
// Heatmaps
// ---------------------------------------------------------------------------

pub fn heatmap(pivot: &Pivot) -> HeatmapSpec {
    let (title, stops) = match pivot.cond {
        Condition::Treatment => ("WIN Treated Cells", &WIN_SCALE),
        _ => ("DMSO Treated Cells", &DMSO_SCALE),
    };

    let mut x_axis = axis("Cell Age");
    x_axis.show_line = false;
    x_axis.tick_values = Some(pivot.ages.iter().map(|a| f64::from(*a)).collect());
    let mut y_axis = axis("Cell ID");
    y_axis.show_line = false;

    HeatmapSpec {
        title: title.to_string(),
        condition: pivot.cond,
        x_axis,
        y_axis,
        color_label: COLOR_LABEL.to_string(),
        x: pivot.ages.clone(),
        y: pivot.cell_ids.clone(),
        z: pivot.values.clone(),
        zmin: HEATMAP_ZMIN,
        zmax: HEATMAP_ZMAX,
        color_scale: ColorScale::new(stops),
        hover_fields: vec!["Cell Age".into(), "Cell ID".into(), COLOR_LABEL.into()],
    }
}

/// Heatmap for one condition, or a placeholder when the cohort has no cells.
pub fn heatmap_chart(cohort: &Cohort, cond: Condition) -> ChartSpec {
    match cohort.pivot(cond) {
        Ok(pivot) => ChartSpec::Heatmap(heatmap(&pivot)),
        Err(e) => {
            log::warn!("{e}");
            ChartSpec::placeholder(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Drill-down line charts
// ---------------------------------------------------------------------------

fn cell_y_range(metric: Metric) -> [f64; 2] {
    match metric {
        Metric::TotalOutput => [0.0, 950.0],
        Metric::NoSheaths | Metric::AvgSheathLen => [0.0, 50.0],
    }
}

fn to_points(series: &Series) -> Vec<[f64; 2]> {
    series
        .points
        .iter()
        .map(|(age, v)| [f64::from(*age), *v])
        .collect()
}

pub fn cell_metric_chart(trajectory: &CellTrajectory, metric: Metric) -> ChartSpec {
    let series = trajectory.series(metric);

    let mut x_axis = axis(CELL_AGE);
    x_axis.tick_values = Some(COHORT_AGE_TICKS.to_vec());
    let mut y_axis = axis(metric.column());
    y_axis.range = Some(cell_y_range(metric));
    y_axis.range_to_zero = true;

    ChartSpec::Line(LineChartSpec {
        title: format!("{} across cell age", metric.column()),
        x_axis,
        y_axis,
        series: vec![LineSeriesSpec {
            name: trajectory.cell_id.clone(),
            color: CELL_LINE_COLOR,
            points: to_points(&series),
            markers: true,
        }],
        hover_fields: vec![metric.column().to_string(), CELL_AGE.to_string()],
        legend_title: None,
        height: Some(CELL_CHART_HEIGHT),
        background: Rgb::WHITE,
    })
}

/// The three metric charts for a clicked cell. Unknown cells and cells
/// without complete metrics produce titled placeholders.
pub fn drilldown_charts(cohort: &Cohort, cell_id: &str, cond: Condition) -> [ChartSpec; 3] {
    match cell_trajectory(cohort, cell_id, cond) {
        Ok(trajectory) => Metric::ALL.map(|m| cell_metric_chart(&trajectory, m)),
        Err(e) => {
            log::info!("drill-down for '{cell_id}': {e}");
            Metric::ALL.map(|_| ChartSpec::placeholder(e.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Condition line charts
// ---------------------------------------------------------------------------

pub fn trend_title(metric: Metric) -> &'static str {
    match metric {
        Metric::NoSheaths => "Number of Sheaths across Cell Age",
        Metric::AvgSheathLen => "Average Sheath Length across Cell Age",
        Metric::TotalOutput => "Total Output across Cell Age",
    }
}

pub fn condition_metric_chart(
    dataset: &Dataset,
    metric: Metric,
    selection: ConditionSelection,
) -> ChartSpec {
    let series = match condition_series(dataset, metric, selection) {
        Ok(series) => series,
        Err(e) => {
            log::info!("{e}");
            return ChartSpec::placeholder(e.to_string());
        }
    };

    let palette = generate_palette(series.len());
    let lines = series
        .iter()
        .zip(palette)
        .map(|(s, cell_color)| LineSeriesSpec {
            name: s.key.to_string(),
            color: match &s.key {
                SeriesKey::Condition(cond) => condition_color(*cond),
                SeriesKey::Cell(_) => cell_color,
            },
            points: to_points(s),
            markers: true,
        })
        .collect();

    let (legend_title, hover_fields) = match selection.condition() {
        Some(_) => (
            CELL_ID,
            vec![CELL_ID.to_string(), metric.column().to_string(), CELL_AGE.to_string()],
        ),
        None => (COND, vec![metric.column().to_string(), COND.to_string()]),
    };

    let mut x_axis = axis("Cell Age (days)");
    x_axis.tick_values = Some(ALL_AGE_TICKS.to_vec());
    let mut y_axis = axis(metric.column());
    y_axis.range_to_zero = true;

    ChartSpec::Line(LineChartSpec {
        title: trend_title(metric).to_string(),
        x_axis,
        y_axis,
        series: lines,
        hover_fields,
        legend_title: Some(legend_title.to_string()),
        height: None,
        background: Rgb::WHITE,
    })
}

pub fn condition_charts(dataset: &Dataset, selection: ConditionSelection) -> [ChartSpec; 3] {
    Metric::ALL.map(|m| condition_metric_chart(dataset, m, selection))
}
