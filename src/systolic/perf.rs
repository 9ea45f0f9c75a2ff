//! Resource-usage metrics from the performance log, averaged per matrix size and process count.

use super::records::PerfSample;
use super::{load_samples, matrix_sizes, push_size_lines};
use crate::chart::{render, ImageFormat, LineChart, TAB10};
use crate::report::{format_count, format_opt, GridTable, RunReport};
use crate::stats::group_mean;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SUMMARY_FILE: &str = "performance_summary.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Elapsed,
    UserCpu,
    SysCpu,
    MaxRss,
    ContextSwitches,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Elapsed,
        Metric::UserCpu,
        Metric::SysCpu,
        Metric::MaxRss,
        Metric::ContextSwitches,
    ];

    /// Column name in the log
    pub fn column(self) -> &'static str {
        match self {
            Metric::Elapsed => "elapsed_time_sec",
            Metric::UserCpu => "user_cpu_sec",
            Metric::SysCpu => "sys_cpu_sec",
            Metric::MaxRss => "max_rss_kb",
            Metric::ContextSwitches => "#context_switch",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Elapsed => "Elapsed Time (sec)",
            Metric::UserCpu => "User CPU Time (sec)",
            Metric::SysCpu => "System CPU Time (sec)",
            Metric::MaxRss => "Max RSS (KB)",
            Metric::ContextSwitches => "Context Switches",
        }
    }

    /// Chart file stem, `#` is not kept in file names
    pub fn file_stem(self) -> String {
        format!("{}_vs_processes", self.column().trim_start_matches('#'))
    }

    pub fn value(self, sample: &PerfSample) -> Option<f64> {
        match self {
            Metric::Elapsed => Some(sample.elapsed_time_sec),
            Metric::UserCpu => sample.user_cpu_sec,
            Metric::SysCpu => sample.sys_cpu_sec,
            Metric::MaxRss => sample.max_rss_kb,
            Metric::ContextSwitches => sample.context_switches,
        }
    }

    fn format(self, value: Option<f64>) -> String {
        match (self, value) {
            (Metric::MaxRss | Metric::ContextSwitches, Some(v)) => format_count(v),
            _ => format_opt(value, 3),
        }
    }
}

/// Averages of one `(matrix size, process count)` group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerfGroup {
    pub runs: usize,
    pub means: BTreeMap<Metric, f64>,
}

impl PerfGroup {
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.means.get(&metric).copied()
    }
}

/// Average every metric by `(matrix size, process count)`
pub fn average_metrics(samples: &[PerfSample]) -> BTreeMap<(u32, u32), PerfGroup> {
    let mut groups: BTreeMap<(u32, u32), PerfGroup> = BTreeMap::new();
    for sample in samples {
        groups
            .entry((sample.matrix_size, sample.processes))
            .or_default()
            .runs += 1;
    }
    for metric in Metric::ALL {
        let means = group_mean(samples, |s| (s.matrix_size, s.processes), |s| metric.value(s));
        for (key, mean) in means {
            if let Some(group) = groups.get_mut(&key) {
                group.means.insert(metric, mean);
            }
        }
    }
    groups
}

/// `(size, procs) -> mean` for one metric, groups without the metric left out
pub fn metric_series(groups: &BTreeMap<(u32, u32), PerfGroup>, metric: Metric) -> BTreeMap<(u32, u32), f64> {
    groups
        .iter()
        .filter_map(|(&key, group)| group.mean(metric).map(|v| (key, v)))
        .collect()
}

pub fn metrics_table(groups: &BTreeMap<(u32, u32), PerfGroup>, only_size: Option<u32>) -> GridTable {
    let mut headers = vec!["matrix_size", "processes", "runs"];
    headers.extend(Metric::ALL.iter().map(|m| m.column()));
    let mut table = GridTable::new(headers);
    for (&(size, procs), group) in groups {
        if only_size.is_some_and(|s| s != size) {
            continue;
        }
        let mut row = vec![size.to_string(), procs.to_string(), group.runs.to_string()];
        row.extend(Metric::ALL.iter().map(|&m| m.format(group.mean(m))));
        table.push_row(row);
    }
    table
}

pub fn metric_chart(groups: &BTreeMap<(u32, u32), PerfGroup>, metric: Metric) -> LineChart {
    let mut chart = LineChart::new(
        format!("{} vs Number of Processes", metric.label()),
        "Number of Processes",
        format!("Average {}", metric.label()),
    )
    .legend_title("Matrix Size");
    push_size_lines(&mut chart, &metric_series(groups, metric), &TAB10, |size| size.to_string());
    chart
}

fn summary_text(input: &Path, groups: &BTreeMap<(u32, u32), PerfGroup>, charts: &[PathBuf]) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Performance summary");
    let _ = writeln!(text, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(text, "Input: {}", input.display());
    let _ = writeln!(text, "Matrix sizes: {:?}", matrix_sizes(groups));
    let _ = writeln!(text);
    let _ = writeln!(text, "{}", metrics_table(groups, None));
    if !charts.is_empty() {
        let _ = writeln!(text, "Charts:");
        for chart in charts {
            let _ = writeln!(text, "  {}", chart.display());
        }
    }
    text
}

/// Average the performance log, print the focus-size table and plot every metric
pub fn run(input: &Path, output_dir: &Path, focus_size: u32, format: ImageFormat) -> Result<RunReport> {
    let mut report = RunReport::default();
    let Some(samples) = load_samples::<PerfSample>(input)? else {
        report.record_skipped();
        return Ok(report);
    };

    let groups = average_metrics(&samples);
    let focus = metrics_table(&groups, Some(focus_size));
    if focus.is_empty() {
        warn!("No samples for matrix size {}", focus_size);
    } else {
        println!("Averages for matrix size {}:", focus_size);
        println!("{}", focus);
    }

    for metric in Metric::ALL {
        let chart = metric_chart(&groups, metric);
        if chart.is_empty() {
            warn!("Column {} not present in {}, skipping", metric.column(), input.display());
            report.record_skipped();
            continue;
        }
        let path = render(&chart, output_dir, &metric.file_stem(), format)?;
        report.record_saved(path);
    }

    let summary = output_dir.join(SUMMARY_FILE);
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    fs::write(&summary, summary_text(input, &groups, &report.saved))
        .with_context(|| format!("Failed to write {}", summary.display()))?;
    info!("Summary written to {}", summary.display());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(procs: u32, size: u32, elapsed: f64, rss: Option<f64>) -> PerfSample {
        PerfSample {
            processes: procs,
            matrix_size: size,
            elapsed_time_sec: elapsed,
            user_cpu_sec: None,
            sys_cpu_sec: None,
            max_rss_kb: rss,
            context_switches: None,
        }
    }

    #[test]
    fn test_file_stems() {
        assert_eq!(Metric::Elapsed.file_stem(), "elapsed_time_sec_vs_processes");
        assert_eq!(Metric::ContextSwitches.file_stem(), "context_switch_vs_processes");
    }

    #[test]
    fn test_average_metrics() {
        let samples = vec![
            sample(1, 500, 2.0, Some(100.0)),
            sample(1, 500, 4.0, None),
            sample(2, 500, 1.5, Some(50.0)),
        ];
        let groups = average_metrics(&samples);
        let g = &groups[&(500, 1)];
        assert_eq!(g.runs, 2);
        assert_eq!(g.mean(Metric::Elapsed), Some(3.0));
        assert_eq!(g.mean(Metric::MaxRss), Some(100.0));
        assert_eq!(g.mean(Metric::UserCpu), None);
        assert_eq!(groups[&(500, 2)].mean(Metric::MaxRss), Some(50.0));
    }

    #[test]
    fn test_absent_metric_gives_empty_chart() {
        let groups = average_metrics(&[sample(1, 500, 2.0, None)]);
        assert!(metric_chart(&groups, Metric::SysCpu).is_empty());
        assert!(!metric_chart(&groups, Metric::Elapsed).is_empty());
    }

    #[test]
    fn test_metric_chart_labels() {
        let groups = average_metrics(&[sample(1, 500, 2.0, None), sample(1, 1000, 8.0, None)]);
        let chart = metric_chart(&groups, Metric::Elapsed);
        assert_eq!(chart.title, "Elapsed Time (sec) vs Number of Processes");
        assert_eq!(chart.x_desc, "Number of Processes");
        assert_eq!(chart.y_desc, "Average Elapsed Time (sec)");
        assert_eq!(chart.legend_title.as_deref(), Some("Matrix Size"));
        let labels: Vec<_> = chart.series.iter().filter_map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec!["500", "1000"]);
    }

    #[test]
    fn test_metrics_table_focus() {
        let groups = average_metrics(&[
            sample(1, 500, 2.0, Some(2048.0)),
            sample(1, 1000, 8.0, None),
        ]);
        let table = metrics_table(&groups, Some(500));
        assert_eq!(table.len(), 1);
        let text = table.to_string();
        assert!(text.contains("2,048"));
        assert!(text.contains("2.000"));
    }

    #[test]
    fn test_run_skips_absent_metrics() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("perf_log.csv");
        fs::write(
            &input,
            "processes,matrix_size,elapsed_time_sec,max_rss_kb\n1,500,2.0,100\n2,500,1.1,80\n",
        )
        .unwrap();
        let out = dir.path().join("plots");
        let report = run(&input, &out, 500, ImageFormat::Svg).unwrap();
        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.skipped, 3);
        assert!(out.join("elapsed_time_sec_vs_processes.svg").exists());
        assert!(out.join("max_rss_kb_vs_processes.svg").exists());

        let summary = fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
        assert!(summary.starts_with("Performance summary\nGenerated: "));
        assert!(summary.contains("elapsed_time_sec_vs_processes.svg"));
    }

    #[test]
    fn test_run_malformed_csv_is_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("perf_log.csv");
        fs::write(&input, "processes,matrix_size,elapsed_time_sec\n1,500,fast\n").unwrap();
        assert!(run(&input, dir.path(), 500, ImageFormat::Svg).is_err());
    }
}
