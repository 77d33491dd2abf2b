//! Depth profiles grouped by float.

use super::spec::{DepthPoint, ProfileSeries, ProfileSpec};
use crate::models::{Field, Measurement};
use crate::stats::range_or_default;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Builds one depth-sorted series of `parameter` per float.
///
/// Rows without an entity id, a depth or a value are dropped. When a float
/// reports the same depth twice the first row is kept.
pub fn map_profile(rows: &[Measurement], parameter: Field) -> ProfileSpec {
    let mut series: Vec<ProfileSeries> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut seen_depths: HashSet<(usize, u64)> = HashSet::new();
    let mut dropped_rows = 0;
    let mut collisions = 0;

    for row in rows {
        let (Some(entity_id), Some(depth), Some(value)) = (
            row.entity_id.as_deref(),
            row.get(Field::Depth),
            row.get(parameter),
        ) else {
            dropped_rows += 1;
            continue;
        };

        let slot = *index.entry(entity_id).or_insert_with(|| {
            series.push(ProfileSeries {
                key: format!("{}_{}", parameter, entity_id),
                entity_id: entity_id.to_string(),
                points: Vec::new(),
            });
            series.len() - 1
        });

        if !seen_depths.insert((slot, (depth + 0.0).to_bits())) {
            collisions += 1;
            continue;
        }

        series[slot].points.push(DepthPoint { depth, value });
    }

    for s in &mut series {
        s.points.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    }

    if collisions > 0 {
        debug!("Ignored {} repeated depths while building profiles", collisions);
    }

    let (depths, values): (Vec<f64>, Vec<f64>) = series
        .iter()
        .flat_map(|s| s.points.iter())
        .map(|p| (p.depth, p.value))
        .unzip();

    ProfileSpec {
        parameter,
        unit: parameter.unit().to_string(),
        depth_range: range_or_default(&depths),
        value_range: range_or_default(&values),
        series,
        dropped_rows,
    }
}
