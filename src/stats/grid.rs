//! Latitude/longitude grid binning.
//!
//! Coordinates are taken as-is: no snapping to a regular spacing, so an
//! irregular set of positions produces an irregular (but rectangular) grid.

use crate::models::{Field, Measurement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Rectangular matrix of optional values indexed by sorted coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Distinct row coordinates (latitudes), north to south.
    pub row_keys: Vec<f64>,
    /// Distinct column coordinates (longitudes), west to east.
    pub col_keys: Vec<f64>,
    /// `cells[row][col]`, `None` where no value was observed.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Grid {
    pub fn rows(&self) -> usize {
        self.row_keys.len()
    }

    pub fn cols(&self) -> usize {
        self.col_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() || self.col_keys.is_empty()
    }

    /// Value at the given coordinates, if both exist in the grid.
    pub fn value_at(&self, row_key: f64, col_key: f64) -> Option<f64> {
        let row = self.row_keys.iter().position(|k| *k == row_key)?;
        let col = self.col_keys.iter().position(|k| *k == col_key)?;
        self.cells[row][col]
    }

    /// Number of cells holding a value.
    pub fn populated_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Fraction of populated cells, `0.0` for an empty grid.
    pub fn coverage(&self) -> f64 {
        let total = self.rows() * self.cols();
        if total == 0 {
            return 0.0;
        }
        self.populated_cells() as f64 / total as f64
    }

    /// All populated values, row-major.
    pub fn values(&self) -> Vec<f64> {
        self.cells.iter().flatten().filter_map(|c| *c).collect()
    }
}

/// Bins `rows` into a grid of `value_key` indexed by `lat_key` × `lon_key`.
///
/// Each cell takes its value from the first row at that coordinate; later
/// rows at the same coordinate are ignored even if the first one had no
/// value. Rows missing either coordinate are skipped.
pub fn build_grid(rows: &[Measurement], lat_key: Field, lon_key: Field, value_key: Field) -> Grid {
    let positioned: Vec<(f64, f64, Option<f64>)> = rows
        .iter()
        .filter_map(|row| {
            let lat = normalize(row.get(lat_key)?);
            let lon = normalize(row.get(lon_key)?);
            Some((lat, lon, row.get(value_key)))
        })
        .collect();

    let skipped = rows.len() - positioned.len();
    if skipped > 0 {
        debug!("Skipped {} rows without coordinates while gridding", skipped);
    }

    let mut row_keys: Vec<f64> = positioned.iter().map(|(lat, _, _)| *lat).collect();
    row_keys.sort_by(|a, b| b.total_cmp(a));
    row_keys.dedup();

    let mut col_keys: Vec<f64> = positioned.iter().map(|(_, lon, _)| *lon).collect();
    col_keys.sort_by(|a, b| a.total_cmp(b));
    col_keys.dedup();

    let row_index: HashMap<u64, usize> = row_keys
        .iter()
        .enumerate()
        .map(|(i, k)| (k.to_bits(), i))
        .collect();
    let col_index: HashMap<u64, usize> = col_keys
        .iter()
        .enumerate()
        .map(|(i, k)| (k.to_bits(), i))
        .collect();

    let mut cells = vec![vec![None; col_keys.len()]; row_keys.len()];
    let mut claimed = vec![vec![false; col_keys.len()]; row_keys.len()];

    for (lat, lon, value) in positioned {
        let (r, c) = (row_index[&lat.to_bits()], col_index[&lon.to_bits()]);
        if !claimed[r][c] {
            claimed[r][c] = true;
            cells[r][c] = value;
        }
    }

    Grid {
        row_keys,
        col_keys,
        cells,
    }
}

/// Folds `-0.0` onto `0.0` so both land in the same cell.
fn normalize(coordinate: f64) -> f64 {
    coordinate + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point(lat: f64, lon: f64, temperature: Option<f64>) -> Measurement {
        Measurement {
            latitude: Some(lat),
            longitude: Some(lon),
            temperature,
            ..Default::default()
        }
    }

    fn grid_of(rows: &[Measurement]) -> Grid {
        build_grid(rows, Field::Latitude, Field::Longitude, Field::Temperature)
    }

    #[test]
    fn test_key_ordering() {
        let grid = grid_of(&[
            point(-5.0, 70.0, Some(1.0)),
            point(10.0, 60.0, Some(2.0)),
            point(0.0, 65.0, Some(3.0)),
        ]);

        assert_eq!(grid.row_keys, vec![10.0, 0.0, -5.0]);
        assert_eq!(grid.col_keys, vec![60.0, 65.0, 70.0]);
        assert_eq!(grid.value_at(0.0, 65.0), Some(3.0));
        assert_eq!(grid.value_at(10.0, 70.0), None);
    }

    #[test]
    fn test_first_row_wins() {
        let grid = grid_of(&[
            point(1.0, 1.0, Some(20.0)),
            point(1.0, 1.0, Some(99.0)),
            point(2.0, 1.0, None),
            point(2.0, 1.0, Some(50.0)),
        ]);

        assert_eq!(grid.value_at(1.0, 1.0), Some(20.0));
        // the first row at (2, 1) had no value and still claims the cell
        assert_eq!(grid.value_at(2.0, 1.0), None);
    }

    #[test]
    fn test_rows_without_coordinates_are_skipped() {
        let rows = vec![
            point(1.0, 1.0, Some(1.0)),
            Measurement {
                latitude: Some(3.0),
                temperature: Some(4.0),
                ..Default::default()
            },
        ];
        let grid = grid_of(&rows);
        assert_eq!(grid.rows(), 1);
        assert_eq!(grid.cols(), 1);
    }

    #[test]
    fn test_negative_zero_shares_a_cell() {
        let grid = grid_of(&[point(0.0, -0.0, Some(1.0)), point(-0.0, 0.0, Some(2.0))]);
        assert_eq!(grid.rows(), 1);
        assert_eq!(grid.cols(), 1);
        assert_eq!(grid.values(), vec![1.0]);
    }

    #[test]
    fn test_coverage_seven_of_nine() {
        let mut rows = Vec::new();
        for (i, lat) in [0.0, 5.0, 10.0].iter().enumerate() {
            for (j, lon) in [60.0, 65.0, 70.0].iter().enumerate() {
                let value = if i * 3 + j < 7 { Some(25.0) } else { None };
                rows.push(point(*lat, *lon, value));
            }
        }

        let grid = grid_of(&rows);
        assert_eq!(grid.populated_cells(), 7);
        assert!((grid.coverage() - 0.778).abs() < 1e-3);
    }

    #[test]
    fn test_empty_grid() {
        let grid = grid_of(&[]);
        assert!(grid.is_empty());
        assert_eq!(grid.coverage(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_grid_shape_matches_distinct_keys(
            coords in prop::collection::vec((-3i32..3, -3i32..3, prop::option::of(0.0f64..30.0)), 0..40)
        ) {
            let rows: Vec<Measurement> = coords
                .iter()
                .map(|(lat, lon, v)| point(*lat as f64, *lon as f64, *v))
                .collect();
            let grid = grid_of(&rows);

            let mut lats: Vec<i32> = coords.iter().map(|c| c.0).collect();
            lats.sort();
            lats.dedup();
            let mut lons: Vec<i32> = coords.iter().map(|c| c.1).collect();
            lons.sort();
            lons.dedup();

            prop_assert_eq!(grid.cells.len(), lats.len());
            for row in &grid.cells {
                prop_assert_eq!(row.len(), lons.len());
            }
        }
    }
}
