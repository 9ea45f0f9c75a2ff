//! Thread-count vs. execution-time tables and their speedup curve.

use crate::chart::{render, ImageFormat, LegendPosition, LineChart, Marker, Series, TAB10};
use crate::error::{DataError, DataResult};
use crate::report::{format_opt, RunReport};
use crate::scaling::{scaling_curve, ScalingPoint};
use crate::table::{load_table, NumericTable};
use anyhow::Result;
use std::path::Path;
use tracing::{error, info, warn};

/// One timed run of the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecRecord {
    pub threads: u32,
    pub elapsed: f64,
}

/// Interpret a `Num_Threads Execution_Time_Seconds` table
pub fn parse_records(table: &NumericTable) -> DataResult<Vec<ExecRecord>> {
    table
        .pairs(0, 1)?
        .into_iter()
        .enumerate()
        .map(|(idx, (threads, elapsed))| {
            if threads < 0.0 || threads.fract() != 0.0 || threads > f64::from(u32::MAX) {
                return Err(DataError::Invalid {
                    path: table.path().to_path_buf(),
                    line: table.line_of(idx).unwrap_or(idx + 2),
                    message: format!("thread count {} is not a non-negative integer", threads),
                });
            }
            Ok(ExecRecord {
                threads: threads as u32,
                elapsed,
            })
        })
        .collect()
}

/// Load execution records, `Ok(None)` if the file does not exist
pub fn load_records<P: AsRef<Path>>(path: P) -> DataResult<Option<Vec<ExecRecord>>> {
    match load_table(path)? {
        Some(table) => parse_records(&table).map(Some),
        None => Ok(None),
    }
}

/// Speedup curve against the first single-thread record
pub fn speedup_curve(records: &[ExecRecord]) -> Option<Vec<ScalingPoint>> {
    let samples: Vec<(u32, f64)> = records.iter().map(|r| (r.threads, r.elapsed)).collect();
    scaling_curve(&samples)
}

fn thread_ticks(records: &[ExecRecord]) -> Vec<f64> {
    records.iter().map(|r| f64::from(r.threads)).collect()
}

fn exec_time_chart(records: &[ExecRecord], config: &str) -> LineChart {
    let points = records.iter().map(|r| (f64::from(r.threads), r.elapsed)).collect();
    LineChart::new(
        format!("Execution Time vs. Threads ({})", config),
        "Number of Threads",
        "Execution Time (seconds)",
    )
    .with_x_ticks(thread_ticks(records))
    .with_series(Series::new(points).marker(Marker::Circle))
}

fn speedup_chart(records: &[ExecRecord], curve: &[ScalingPoint], config: &str) -> LineChart {
    let measured = curve
        .iter()
        .filter_map(|p| p.speedup.map(|s| (f64::from(p.workers), s)))
        .collect();
    let ideal = records
        .iter()
        .map(|r| (f64::from(r.threads), f64::from(r.threads)))
        .collect();
    LineChart::new(
        format!("Speedup vs. Threads ({})", config),
        "Number of Threads",
        "Speedup",
    )
    .with_x_ticks(thread_ticks(records))
    .legend(LegendPosition::UpperLeft)
    .with_series(
        Series::new(measured)
            .label("Speedup")
            .color(TAB10[2])
            .marker(Marker::Circle),
    )
    .with_series(Series::new(ideal).label("Ideal Speedup").color(TAB10[3]).dashed())
}

fn plot(
    records: &[ExecRecord],
    config: &str,
    input: &Path,
    output_dir: &Path,
    format: ImageFormat,
    report: &mut RunReport,
) -> Result<()> {
    let chart = exec_time_chart(records, config);
    let path = render(&chart, output_dir, &format!("exec_time_{}", config), format)?;
    report.record_saved(path);

    match speedup_curve(records) {
        Some(curve) => {
            for p in &curve {
                info!(
                    "Threads: {}, Time: {:.4}s, Speedup: {}",
                    p.workers,
                    p.elapsed,
                    format_opt(p.speedup, 3)
                );
            }
            let chart = speedup_chart(records, &curve, config);
            let path = render(&chart, output_dir, &format!("speedup_{}", config), format)?;
            report.record_saved(path);
        }
        None => {
            warn!(
                "Cannot calculate speedup for {}. Data for 1 thread not found in {}.",
                config,
                input.display()
            );
            report.record_skipped();
        }
    }
    Ok(())
}

/// Plot execution time and speedup for one configuration.
///
/// Never fails: a missing input is skipped and any other error is logged.
pub fn run(input: &Path, config: &str, output_dir: &Path, format: ImageFormat) -> RunReport {
    let mut report = RunReport::default();
    info!(
        "Generating execution time plot for {} from {}...",
        config,
        input.display()
    );

    match load_records(input) {
        Ok(Some(records)) => {
            if let Err(e) = plot(&records, config, input, output_dir, format, &mut report) {
                error!("Error generating Execution Time/Speedup plot for {}: {:#}", config, e);
                report.record_failed();
            }
        }
        Ok(None) => {
            info!(
                "Skipping Execution Time plot for {}: File not found ({}).",
                config,
                input.display()
            );
            report.record_skipped();
        }
        Err(e) => {
            error!("Error generating Execution Time/Speedup plot for {}: {}", config, e);
            report.record_failed();
        }
    }

    info!("Finished generating execution time plot for {}.", config);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_two_thread_scenario() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "exec_time_configA.txt",
            "Num_Threads Execution_Time_Seconds\n1 10.0\n2 6.0\n",
        );
        let records = load_records(&path).unwrap().unwrap();
        assert_eq!(records.len(), 2);
        let curve = speedup_curve(&records).unwrap();
        assert_eq!(curve[0].speedup, Some(1.0));
        assert!((curve[1].speedup.unwrap() - 1.667).abs() < 1e-3);
        assert_eq!(curve[0].efficiency, Some(1.0));
        assert!((curve[1].efficiency.unwrap() - 0.833).abs() < 1e-3);
    }

    #[test]
    fn test_fractional_thread_count_rejected() {
        let table = NumericTable::parse(Path::new("t.txt"), "h h\n1.5 2.0\n").unwrap();
        assert!(matches!(parse_records(&table), Err(DataError::Invalid { line: 2, .. })));
    }

    #[test]
    fn test_run_writes_both_charts() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let path = write(input.path(), "exec.txt", "Num_Threads Execution_Time_Seconds\n1 10.0\n2 6.0\n4 3.5\n");
        let report = run(&path, "configA", output.path(), ImageFormat::Svg);
        assert_eq!(report.saved.len(), 2);
        assert!(output.path().join("exec_time_configA.svg").exists());
        assert!(output.path().join("speedup_configA.svg").exists());
    }

    #[test]
    fn test_run_without_baseline_skips_speedup() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let path = write(input.path(), "exec.txt", "Num_Threads Execution_Time_Seconds\n2 6.0\n4 3.5\n");
        let report = run(&path, "configB", output.path(), ImageFormat::Svg);
        assert_eq!(report.saved.len(), 1);
        assert_eq!(report.skipped, 1);
        assert!(!output.path().join("speedup_configB.svg").exists());
    }

    #[test]
    fn test_run_missing_file_is_not_fatal() {
        let output = TempDir::new().unwrap();
        let report = run(&output.path().join("absent.txt"), "configA", output.path(), ImageFormat::Svg);
        assert!(report.saved.is_empty());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_run_malformed_file_is_caught() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let path = write(input.path(), "exec.txt", "Num_Threads Execution_Time_Seconds\n1 ten\n");
        let report = run(&path, "configA", output.path(), ImageFormat::Svg);
        assert!(report.saved.is_empty());
        assert_eq!(report.failed, 1);
    }
}
