//! Visualization data mapping.
//!
//! Turns a backend row set and a chart request into the payload the
//! renderer needs. Every function here is pure: inputs are borrowed and
//! never modified, and a malformed row only shrinks the output.

pub mod heatmap;
pub mod profile;
pub mod scatter;
pub mod spec;
pub mod timeseries;

pub use spec::*;

use crate::models::{Field, Measurement, VisualizationKind, VisualizationRequest};
use crate::stats::ColorPalette;
use tracing::debug;

/// Maps `rows` according to `request`.
pub fn map(request: &VisualizationRequest, rows: &[Measurement]) -> RenderSpec {
    let spec = match request {
        VisualizationRequest::Profile { parameter } => {
            RenderSpec::Profile(profile::map_profile(rows, *parameter))
        }
        VisualizationRequest::TimeSeries { metrics } => {
            RenderSpec::TimeSeries(timeseries::map_time_series(rows, metrics))
        }
        VisualizationRequest::Scatter {
            x_axis,
            y_axis,
            color_by,
            palette,
        } => RenderSpec::Scatter(scatter::map_scatter(
            rows, *x_axis, *y_axis, *color_by, *palette,
        )),
        VisualizationRequest::Heatmap { parameter, palette } => {
            RenderSpec::Heatmap(heatmap::map_heatmap(rows, *parameter, *palette))
        }
    };

    debug!(
        "Mapped {} rows to {} chart: {} points, {} dropped",
        rows.len(),
        spec.kind(),
        spec.point_count(),
        spec.dropped_rows()
    );

    spec
}

/// Maps `rows` for `kind` using that kind's default selectors.
pub fn map_kind(kind: VisualizationKind, rows: &[Measurement]) -> RenderSpec {
    map(&VisualizationRequest::default_for(kind), rows)
}

/// Holds the currently selected parameter, axes and palette, so a kind
/// switch only needs the kind.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationDataMapper {
    pub parameter: Field,
    pub metrics: Vec<Field>,
    pub x_axis: Field,
    pub y_axis: Field,
    pub color_by: Field,
    pub palette: ColorPalette,
}

impl Default for VisualizationDataMapper {
    fn default() -> Self {
        Self {
            parameter: Field::Temperature,
            metrics: vec![Field::Temperature, Field::Salinity],
            x_axis: Field::Temperature,
            y_axis: Field::Salinity,
            color_by: Field::Depth,
            palette: ColorPalette::Thermal,
        }
    }
}

impl From<&crate::config::VisualizationConfig> for VisualizationDataMapper {
    fn from(config: &crate::config::VisualizationConfig) -> Self {
        Self {
            parameter: config.parameter,
            metrics: config.metrics.clone(),
            x_axis: config.x_axis,
            y_axis: config.y_axis,
            color_by: config.color_by,
            palette: config.palette,
        }
    }
}

impl VisualizationDataMapper {
    /// The full request for `kind` under the current selection.
    pub fn request_for(&self, kind: VisualizationKind) -> VisualizationRequest {
        match kind {
            VisualizationKind::Profile => VisualizationRequest::Profile {
                parameter: self.parameter,
            },
            VisualizationKind::TimeSeries => VisualizationRequest::TimeSeries {
                metrics: self.metrics.clone(),
            },
            VisualizationKind::Scatter => VisualizationRequest::Scatter {
                x_axis: self.x_axis,
                y_axis: self.y_axis,
                color_by: self.color_by,
                palette: self.palette,
            },
            VisualizationKind::Heatmap => VisualizationRequest::Heatmap {
                parameter: self.parameter,
                palette: self.palette,
            },
        }
    }

    pub fn map(&self, kind: VisualizationKind, rows: &[Measurement]) -> RenderSpec {
        map(&self.request_for(kind), rows)
    }
}
