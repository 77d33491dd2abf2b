//! Render-ready payloads, one per visualization kind.

use crate::models::{Field, VisualizationKind};
use crate::stats::{ColorPalette, ColorToken, Grid, ValueRange};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of the mapper for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderSpec {
    Profile(ProfileSpec),
    TimeSeries(TimeSeriesSpec),
    Scatter(ScatterSpec),
    Heatmap(HeatmapSpec),
}

impl RenderSpec {
    pub fn kind(&self) -> VisualizationKind {
        match self {
            RenderSpec::Profile(_) => VisualizationKind::Profile,
            RenderSpec::TimeSeries(_) => VisualizationKind::TimeSeries,
            RenderSpec::Scatter(_) => VisualizationKind::Scatter,
            RenderSpec::Heatmap(_) => VisualizationKind::Heatmap,
        }
    }

    /// Number of plotted points (populated cells for a heatmap).
    pub fn point_count(&self) -> usize {
        match self {
            RenderSpec::Profile(spec) => spec.series.iter().map(|s| s.points.len()).sum(),
            RenderSpec::TimeSeries(spec) => spec.points.len(),
            RenderSpec::Scatter(spec) => spec.points.len(),
            RenderSpec::Heatmap(spec) => spec.grid.populated_cells(),
        }
    }

    /// Input rows that could not be used.
    pub fn dropped_rows(&self) -> usize {
        match self {
            RenderSpec::Profile(spec) => spec.dropped_rows,
            RenderSpec::TimeSeries(spec) => spec.dropped_rows,
            RenderSpec::Scatter(spec) => spec.dropped_rows,
            RenderSpec::Heatmap(spec) => spec.dropped_rows,
        }
    }
}

/// One (depth, value) sample of a vertical profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthPoint {
    pub depth: f64,
    pub value: f64,
}

/// Vertical profile of one float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSeries {
    /// `<parameter>_<entity id>`, e.g. `temperature_2903334`.
    pub key: String,
    pub entity_id: String,
    /// Sorted by depth, shallowest first.
    pub points: Vec<DepthPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub parameter: Field,
    pub unit: String,
    /// One series per float, in order of first appearance.
    pub series: Vec<ProfileSeries>,
    /// Depth axis bounds over every plotted point.
    pub depth_range: ValueRange,
    /// Value axis bounds over every plotted point.
    pub value_range: ValueRange,
    pub dropped_rows: usize,
}

impl ProfileSpec {
    /// Looks a series up by its key.
    pub fn series(&self, key: &str) -> Option<&ProfileSeries> {
        self.series.iter().find(|s| s.key == key)
    }
}

/// A dated observation with the selected metric values it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub values: BTreeMap<Field, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSpec {
    pub metrics: Vec<Field>,
    /// Sorted by date; same-date rows are all kept in input order.
    pub points: Vec<TimePoint>,
    /// Axis bounds per metric, only for metrics with data.
    pub ranges: BTreeMap<Field, ValueRange>,
    /// Mean per metric, only for metrics with data.
    pub averages: BTreeMap<Field, f64>,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub color_value: f64,
    pub color: ColorToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSpec {
    pub x_axis: Field,
    pub y_axis: Field,
    pub color_by: Field,
    pub palette: ColorPalette,
    pub points: Vec<ScatterPoint>,
    pub x_range: ValueRange,
    pub y_range: ValueRange,
    pub color_range: ValueRange,
    /// Pearson r of the plotted x/y values; `None` when undefined.
    pub correlation: Option<f64>,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapSpec {
    pub parameter: Field,
    pub unit: String,
    pub palette: ColorPalette,
    pub grid: Grid,
    /// Color per cell, same shape as `grid.cells`.
    pub colors: Vec<Vec<ColorToken>>,
    /// Legend bounds over every row's value of `parameter`.
    pub range: ValueRange,
    /// Populated cells ÷ total cells.
    pub coverage: f64,
    pub dropped_rows: usize,
}
