//! Date-ordered series.

use super::spec::{TimePoint, TimeSeriesSpec};
use crate::models::{Field, Measurement};
use crate::stats::range;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Orders dated rows by date and keeps the selected metric values.
///
/// The sort is stable, so rows sharing a date stay in input order and are
/// all plotted. Rows without a date are dropped.
pub fn map_time_series(rows: &[Measurement], metrics: &[Field]) -> TimeSeriesSpec {
    let mut dated: Vec<(NaiveDate, &Measurement)> = rows
        .iter()
        .filter_map(|row| row.date.map(|date| (date, row)))
        .collect();
    let dropped_rows = rows.len() - dated.len();

    dated.sort_by_key(|(date, _)| *date);

    let points: Vec<TimePoint> = dated
        .into_iter()
        .map(|(date, row)| TimePoint {
            date,
            entity_id: row.entity_id.clone(),
            values: metrics
                .iter()
                .filter_map(|metric| row.get(*metric).map(|v| (*metric, v)))
                .collect(),
        })
        .collect();

    let mut ranges = BTreeMap::new();
    let mut averages = BTreeMap::new();
    for metric in metrics {
        let values: Vec<f64> = points
            .iter()
            .filter_map(|p| p.values.get(metric).copied())
            .collect();
        if let Ok(r) = range(&values) {
            ranges.insert(*metric, r);
            averages.insert(*metric, values.iter().sum::<f64>() / values.len() as f64);
        }
    }

    TimeSeriesSpec {
        metrics: metrics.to_vec(),
        points,
        ranges,
        averages,
        dropped_rows,
    }
}
