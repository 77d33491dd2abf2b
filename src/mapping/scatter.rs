//! Parameter-vs-parameter scatter with derived colors.

use super::spec::{ScatterPoint, ScatterSpec};
use crate::models::{Field, Measurement};
use crate::stats::{pearson_correlation, quantize_to_color_scale, range_or_default, ColorPalette};

/// Plots `y_axis` against `x_axis`, colored by `color_by`.
///
/// Rows missing either axis value are dropped, never coerced to zero. The
/// color value falls back to depth, then to `0.0`. The correlation is
/// computed over the plotted points only.
pub fn map_scatter(
    rows: &[Measurement],
    x_axis: Field,
    y_axis: Field,
    color_by: Field,
    palette: ColorPalette,
) -> ScatterSpec {
    let plotted: Vec<(f64, f64, f64, Option<String>)> = rows
        .iter()
        .filter_map(|row| {
            let x = row.get(x_axis)?;
            let y = row.get(y_axis)?;
            let color_value = row
                .get(color_by)
                .or_else(|| row.get(Field::Depth))
                .unwrap_or(0.0);
            Some((x, y, color_value, row.entity_id.clone()))
        })
        .collect();
    let dropped_rows = rows.len() - plotted.len();

    let xs: Vec<f64> = plotted.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = plotted.iter().map(|p| p.1).collect();
    let color_values: Vec<f64> = plotted.iter().map(|p| p.2).collect();

    // xs and ys always have the same length here
    let correlation = pearson_correlation(&xs, &ys).ok().flatten();
    let color_range = range_or_default(&color_values);
    let x_range = range_or_default(&xs);
    let y_range = range_or_default(&ys);

    let points = plotted
        .into_iter()
        .map(|(x, y, color_value, entity_id)| ScatterPoint {
            x,
            y,
            color_value,
            color: quantize_to_color_scale(
                Some(color_value),
                color_range.min,
                color_range.max,
                palette.colors(),
            ),
            entity_id,
        })
        .collect();

    ScatterSpec {
        x_axis,
        y_axis,
        color_by,
        palette,
        points,
        x_range,
        y_range,
        color_range,
        correlation,
        dropped_rows,
    }
}
