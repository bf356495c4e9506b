use std::path::PathBuf;

use serde::Serialize;

use super::color::{ColorScale, Rgb};
use crate::data::model::Condition;

// ---------------------------------------------------------------------------
// Chart descriptions
// ---------------------------------------------------------------------------
//
// Everything a renderer needs, nothing it has to decide. The egui front-end
// draws these; `--export` writes them as JSON.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSpec {
    pub title: String,
    /// Fixed `[min, max]`, or `None` to fit the data.
    pub range: Option<[f64; 2]>,
    /// Extend the fitted range down to zero.
    pub range_to_zero: bool,
    /// Fixed tick positions.
    pub tick_values: Option<Vec<f64>>,
    pub show_grid: bool,
    pub show_line: bool,
    pub line_color: Rgb,
    pub line_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSpec {
    pub title: String,
    pub condition: Condition,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub color_label: String,
    /// Column labels (cell ages).
    pub x: Vec<u8>,
    /// Row labels (cell IDs), top to bottom.
    pub y: Vec<String>,
    /// `z[row][col]`; `None` renders blank.
    pub z: Vec<Vec<Option<f64>>>,
    pub zmin: f64,
    pub zmax: f64,
    pub color_scale: ColorScale,
    pub hover_fields: Vec<String>,
}

impl HeatmapSpec {
    /// Row label under a clicked row index.
    pub fn cell_at(&self, row: usize) -> Option<&str> {
        self.y.get(row).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeriesSpec {
    pub name: String,
    pub color: Rgb,
    /// `[x, y]` pairs in drawing order.
    pub points: Vec<[f64; 2]>,
    pub markers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChartSpec {
    pub title: String,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub series: Vec<LineSeriesSpec>,
    pub hover_fields: Vec<String>,
    /// Legend heading (the field series are coloured by), if shown.
    pub legend_title: Option<String>,
    pub height: Option<f32>,
    pub background: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Heatmap(HeatmapSpec),
    Line(LineChartSpec),
    /// Empty chart carrying only a title ("not found", "no data", ...).
    Placeholder { title: String },
}

impl ChartSpec {
    pub fn placeholder(title: impl Into<String>) -> Self {
        ChartSpec::Placeholder {
            title: title.into(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Heatmap(h) => &h.title,
            ChartSpec::Line(l) => &l.title,
            ChartSpec::Placeholder { title } => title,
        }
    }
}

/// One microscopy image slot of the drill-down.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImagePanelSpec {
    Image { title: String, path: PathBuf },
    Placeholder { title: String },
}

impl ImagePanelSpec {
    pub fn title(&self) -> &str {
        match self {
            ImagePanelSpec::Image { title, .. } | ImagePanelSpec::Placeholder { title } => title,
        }
    }
}
