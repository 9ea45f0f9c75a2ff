//! Speedup and efficiency of the systolic runs against the single-process baseline.

use super::records::PerfSample;
use super::{load_samples, push_size_lines};
use crate::chart::{render, ImageFormat, LegendPosition, LineChart, Panels, BASIC7};
use crate::report::{format_opt, GridTable, RunReport};
use crate::scaling::ScalingPoint;
use crate::stats::group_mean;
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::warn;

pub const CHART_STEM: &str = "speedup_efficiency_vs_processes";

/// Mean elapsed time of one `(processes, matrix size)` group and its scaling ratios
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedupRow {
    pub processes: u32,
    pub matrix_size: u32,
    pub mean_elapsed: f64,
    pub speedup: Option<f64>,
    pub efficiency: Option<f64>,
}

/// Sizes with samples but no single-process run to compare against
pub fn sizes_without_baseline(rows: &[SpeedupRow]) -> Vec<u32> {
    let with_baseline: BTreeSet<u32> = rows
        .iter()
        .filter(|r| r.processes == 1)
        .map(|r| r.matrix_size)
        .collect();
    let sizes: BTreeSet<u32> = rows
        .iter()
        .map(|r| r.matrix_size)
        .filter(|size| !with_baseline.contains(size))
        .collect();
    sizes.into_iter().collect()
}

/// Rows ordered by matrix size, then process count.
///
/// A group whose size has no `(1, size)` baseline keeps its mean elapsed time with
/// no speedup or efficiency.
pub fn analyze(samples: &[PerfSample]) -> Vec<SpeedupRow> {
    let means = group_mean(
        samples,
        |s| (s.matrix_size, s.processes),
        |s| Some(s.elapsed_time_sec),
    );
    means
        .iter()
        .map(|(&(size, procs), &elapsed)| {
            let base = means.get(&(size, 1)).copied();
            let point = ScalingPoint::new(procs, elapsed, base);
            SpeedupRow {
                processes: procs,
                matrix_size: size,
                mean_elapsed: elapsed,
                speedup: point.speedup,
                efficiency: point.efficiency,
            }
        })
        .collect()
}

pub fn status_line(row: &SpeedupRow) -> String {
    format!(
        "Processes: {}, Matrix Size: {}, Speedup: {}, Efficiency: {}",
        row.processes,
        row.matrix_size,
        format_opt(row.speedup, 2),
        format_opt(row.efficiency, 2)
    )
}

pub fn results_table(rows: &[SpeedupRow]) -> GridTable {
    let mut table = GridTable::new(["matrix_size", "processes", "mean_elapsed_sec", "speedup", "efficiency"]);
    for row in rows {
        table.push_row([
            row.matrix_size.to_string(),
            row.processes.to_string(),
            format!("{:.4}", row.mean_elapsed),
            format_opt(row.speedup, 2),
            format_opt(row.efficiency, 2),
        ]);
    }
    table
}

fn ratio_chart(
    rows: &[SpeedupRow],
    title: &str,
    y_desc: &str,
    ratio: impl Fn(&SpeedupRow) -> Option<f64>,
) -> LineChart {
    let grouped: BTreeMap<(u32, u32), f64> = rows
        .iter()
        .filter_map(|r| ratio(r).map(|v| ((r.matrix_size, r.processes), v)))
        .collect();
    let mut chart = LineChart::new(title, "Number of processes", y_desc)
        .y_from_zero()
        .legend(LegendPosition::UpperLeft);
    push_size_lines(&mut chart, &grouped, &BASIC7, |size| format!("Matrix size: {}", size));
    chart
}

/// Speedup above efficiency, one line per matrix size
pub fn scaling_panels(rows: &[SpeedupRow]) -> Panels {
    Panels::new(vec![
        ratio_chart(rows, "Speedup vs Number of Processes", "Speedup", |r| r.speedup),
        ratio_chart(rows, "Efficiency vs Number of Processes", "Efficiency", |r| r.efficiency),
    ])
}

/// Print speedup and efficiency for every group and plot both against process count
pub fn run(input: &Path, output_dir: &Path, format: ImageFormat) -> Result<RunReport> {
    let mut report = RunReport::default();
    let Some(samples) = load_samples::<PerfSample>(input)? else {
        report.record_skipped();
        return Ok(report);
    };

    let rows = analyze(&samples);
    for size in sizes_without_baseline(&rows) {
        warn!(
            "No single-process run for matrix size {}, speedup not computed",
            size
        );
    }
    for row in rows.iter().filter(|r| r.speedup.is_some()) {
        println!("{}", status_line(row));
    }
    println!("{}", results_table(&rows));

    let panels = scaling_panels(&rows);
    if panels.charts.iter().all(LineChart::is_empty) {
        warn!("No matrix size has a single-process baseline, nothing to plot");
        report.record_skipped();
        return Ok(report);
    }
    let path = render(&panels, output_dir, CHART_STEM, format)?;
    report.record_saved(path);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample(procs: u32, size: u32, elapsed: f64) -> PerfSample {
        PerfSample {
            processes: procs,
            matrix_size: size,
            elapsed_time_sec: elapsed,
            user_cpu_sec: None,
            sys_cpu_sec: None,
            max_rss_kb: None,
            context_switches: None,
        }
    }

    #[test]
    fn test_analyze_averages_then_divides() {
        let samples = vec![
            sample(1, 500, 9.0),
            sample(1, 500, 11.0),
            sample(4, 500, 3.0),
            sample(2, 500, 5.0),
        ];
        let rows = analyze(&samples);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].processes, 1);
        assert_eq!(rows[0].mean_elapsed, 10.0);
        assert_eq!(rows[0].speedup, Some(1.0));
        assert_eq!(rows[1].processes, 2);
        assert_eq!(rows[1].speedup, Some(2.0));
        assert_eq!(rows[1].efficiency, Some(1.0));
        assert!((rows[2].speedup.unwrap() - 3.333).abs() < 1e-3);
        assert!((rows[2].efficiency.unwrap() - 0.833).abs() < 1e-3);
    }

    #[test]
    fn test_missing_baseline_keeps_row() {
        let rows = analyze(&[sample(1, 500, 4.0), sample(2, 1000, 3.0), sample(4, 1000, 2.0)]);
        assert_eq!(rows.len(), 3);
        assert_eq!(sizes_without_baseline(&rows), vec![1000]);
        let row = rows.iter().find(|r| r.matrix_size == 1000 && r.processes == 2).unwrap();
        assert_eq!(row.speedup, None);
        assert_eq!(row.efficiency, None);
        assert_eq!(row.mean_elapsed, 3.0);
    }

    #[test]
    fn test_zero_time_baseline_still_counts() {
        let rows = analyze(&[sample(1, 500, 0.0), sample(2, 500, 1.0)]);
        assert_eq!(rows[1].speedup, None);
        assert!(sizes_without_baseline(&rows).is_empty());
    }

    #[test]
    fn test_status_line() {
        let row = SpeedupRow {
            processes: 4,
            matrix_size: 500,
            mean_elapsed: 3.0,
            speedup: Some(10.0 / 3.0),
            efficiency: Some(10.0 / 12.0),
        };
        assert_eq!(
            status_line(&row),
            "Processes: 4, Matrix Size: 500, Speedup: 3.33, Efficiency: 0.83"
        );
    }

    #[test]
    fn test_panels_skip_sizes_without_baseline() {
        let rows = analyze(&[sample(1, 500, 4.0), sample(2, 500, 2.0), sample(2, 1000, 3.0)]);
        let panels = scaling_panels(&rows);
        assert_eq!(panels.charts.len(), 2);
        assert_eq!(panels.charts[0].series.len(), 1);
        assert_eq!(panels.charts[0].series[0].label.as_deref(), Some("Matrix size: 500"));
        assert_eq!(panels.charts[1].x_desc, "Number of processes");
        assert_eq!(panels.charts[0].series[0].points, vec![(1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(panels.charts[1].series[0].points, vec![(1.0, 1.0), (2.0, 1.0)]);
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("perf_log.csv");
        fs::write(
            &input,
            "processes,matrix_size,elapsed_time_sec\n1,500,8.0\n2,500,4.5\n4,500,2.5\n1,1000,30\n4,1000,9\n",
        )
        .unwrap();
        let report = run(&input, dir.path(), ImageFormat::Svg).unwrap();
        assert_eq!(report.saved.len(), 1);
        assert!(dir.path().join("speedup_efficiency_vs_processes.svg").exists());
    }

    #[test]
    fn test_run_without_any_baseline_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("perf_log.csv");
        fs::write(&input, "processes,matrix_size,elapsed_time_sec\n2,500,4.5\n").unwrap();
        let report = run(&input, dir.path(), ImageFormat::Svg).unwrap();
        assert!(report.saved.is_empty());
        assert_eq!(report.skipped, 1);
    }
}
