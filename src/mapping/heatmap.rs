//! Spatial heatmap over a lat/lon grid.

use super::spec::HeatmapSpec;
use crate::models::{Field, Measurement};
use crate::stats::{build_grid, quantize_to_color_scale, range_or_default, ColorPalette};

/// Grids `parameter` by latitude and longitude and colors every cell.
///
/// The legend range spans the parameter over all rows, not just the cells
/// that won their coordinate.
pub fn map_heatmap(rows: &[Measurement], parameter: Field, palette: ColorPalette) -> HeatmapSpec {
    let grid = build_grid(rows, Field::Latitude, Field::Longitude, parameter);

    let values: Vec<f64> = rows.iter().filter_map(|row| row.get(parameter)).collect();
    let range = range_or_default(&values);

    let colors = grid
        .cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| quantize_to_color_scale(*cell, range.min, range.max, palette.colors()))
                .collect()
        })
        .collect();

    let dropped_rows = rows
        .iter()
        .filter(|row| row.get(Field::Latitude).is_none() || row.get(Field::Longitude).is_none())
        .count();

    HeatmapSpec {
        parameter,
        unit: parameter.unit().to_string(),
        palette,
        coverage: grid.coverage(),
        grid,
        colors,
        range,
        dropped_rows,
    }
}
