//! Systolic-array benchmark logs: peak heap usage, run metrics and scaling.

pub mod heap;
pub mod perf;
pub mod records;
pub mod speedup;

use crate::chart::{cycle_color, LineChart, Marker, Series};
use anyhow::Result;
use plotters::style::RGBColor;
use records::read_csv;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Read an input CSV, logging a warning and returning `None` if it is absent
pub(crate) fn load_samples<T: DeserializeOwned>(input: &Path) -> Result<Option<Vec<T>>> {
    match read_csv(input)? {
        Some(rows) => {
            info!("Loaded {} rows from {}", rows.len(), input.display());
            Ok(Some(rows))
        }
        None => {
            warn!("Skipping: input file not found ({})", input.display());
            Ok(None)
        }
    }
}

/// Sorted distinct matrix sizes across `(size, procs)` keys
pub(crate) fn matrix_sizes<V>(grouped: &BTreeMap<(u32, u32), V>) -> Vec<u32> {
    let mut sizes: Vec<u32> = grouped.keys().map(|(size, _)| *size).collect();
    sizes.dedup();
    sizes
}

/// Add one line per matrix size, x = process count, from `(size, procs) -> value`
pub(crate) fn push_size_lines(
    chart: &mut LineChart,
    grouped: &BTreeMap<(u32, u32), f64>,
    palette: &[RGBColor],
    label: impl Fn(u32) -> String,
) {
    for (idx, (size, points)) in crate::stats::split_by_outer(grouped).into_iter().enumerate() {
        let points = points
            .into_iter()
            .map(|(procs, v)| (f64::from(procs), v))
            .collect();
        chart.push(
            Series::new(points)
                .label(label(size))
                .color(cycle_color(palette, idx))
                .marker(Marker::Circle),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::TAB10;

    #[test]
    fn test_matrix_sizes_sorted_distinct() {
        let mut grouped = BTreeMap::new();
        grouped.insert((1000u32, 1u32), 1.0);
        grouped.insert((500, 2), 1.0);
        grouped.insert((500, 1), 1.0);
        assert_eq!(matrix_sizes(&grouped), vec![500, 1000]);
    }

    #[test]
    fn test_push_size_lines() {
        let mut grouped = BTreeMap::new();
        grouped.insert((500u32, 4u32), 3.0);
        grouped.insert((500, 1), 1.0);
        grouped.insert((1000, 2), 2.0);
        let mut chart = LineChart::new("t", "x", "y");
        push_size_lines(&mut chart, &grouped, &TAB10, |s| format!("Matrix Size {}", s));
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].label.as_deref(), Some("Matrix Size 500"));
        assert_eq!(chart.series[0].points, vec![(1.0, 1.0), (4.0, 3.0)]);
        assert_eq!(chart.series[1].color, TAB10[1]);
    }
}
