//! Average peak heap per process count, overall and rank 0 vs. the other ranks.

use super::records::HeapSample;
use super::{load_samples, matrix_sizes, push_size_lines};
use crate::chart::{cycle_color, render, ImageFormat, LineChart, Marker, Series, NAMED5, TAB10};
use crate::report::{format_count, GridTable, RunReport};
use crate::stats::{group_mean, split_by_outer};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Mean peak heap keyed by `(matrix size, process count)`
pub fn average_peak_heap(samples: &[HeapSample]) -> BTreeMap<(u32, u32), f64> {
    group_mean(
        samples,
        |s| (s.matrix_size, s.processes),
        |s| Some(s.peak_heap_bytes),
    )
}

/// Rank 0 and other-rank averages, both keyed by `(matrix size, process count)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankSplit {
    pub rank0: BTreeMap<(u32, u32), f64>,
    pub others: BTreeMap<(u32, u32), f64>,
}

/// Split samples by rank and average each side. Samples without a rank are ignored.
pub fn rank_split(samples: &[HeapSample]) -> RankSplit {
    let ranked = samples.iter().filter(|s| s.rank.is_some());
    let (rank0, others): (Vec<&HeapSample>, Vec<&HeapSample>) =
        ranked.partition(|s| s.rank == Some(0));
    let key = |s: &&HeapSample| (s.matrix_size, s.processes);
    let value = |s: &&HeapSample| Some(s.peak_heap_bytes);
    RankSplit {
        rank0: group_mean(rank0, key, value),
        others: group_mean(others, key, value),
    }
}

/// Table of averages, optionally restricted to one matrix size
pub fn heap_table(averages: &BTreeMap<(u32, u32), f64>, only_size: Option<u32>) -> GridTable {
    let mut table = GridTable::new(["MATRIX_SIZE", "PROCS", "PEAK_HEAP_BYTES"]);
    for (&(size, procs), &bytes) in averages {
        if only_size.is_some_and(|s| s != size) {
            continue;
        }
        table.push_row([size.to_string(), procs.to_string(), format_count(bytes)]);
    }
    table
}

pub fn heap_chart(averages: &BTreeMap<(u32, u32), f64>) -> LineChart {
    let mut chart = LineChart::new(
        "Average Peak Heap Memory per process vs Number of Processes",
        "Number of Processes",
        "Average Peak Heap Memory per process (bytes)",
    )
    .scientific_y();
    push_size_lines(&mut chart, averages, &TAB10, |size| format!("Matrix Size {}", size));
    chart
}

pub fn rank_chart(split: &RankSplit) -> LineChart {
    let mut chart = LineChart::new(
        "Average Peak Heap Memory Usage vs Processes (Rank 0 vs Other Ranks)",
        "Number of Processes",
        "Average Peak Heap (bytes)",
    )
    .scientific_y();
    chart.size = (1200, 700);

    let rank0 = split_by_outer(&split.rank0);
    let others = split_by_outer(&split.others);
    let mut sizes: Vec<u32> = rank0.keys().chain(others.keys()).copied().collect();
    sizes.sort_unstable();
    sizes.dedup();

    let to_points = |points: &Vec<(u32, f64)>| -> Vec<(f64, f64)> {
        points.iter().map(|&(p, v)| (f64::from(p), v)).collect()
    };

    for (idx, size) in sizes.into_iter().enumerate() {
        let color = cycle_color(&NAMED5, idx);
        if let Some(points) = rank0.get(&size) {
            chart.push(
                Series::new(to_points(points))
                    .label(format!("Matrix {} - Rank 0", size))
                    .color(color)
                    .marker(Marker::Circle),
            );
        }
        if let Some(points) = others.get(&size) {
            chart.push(
                Series::new(to_points(points))
                    .label(format!("Matrix {} - Other Ranks", size))
                    .color(color)
                    .dashed()
                    .marker(Marker::Cross),
            );
        }
    }
    chart
}

/// Average peak heap per `(size, procs)`, print tables and plot one line per size
pub fn run_heap(input: &Path, output_dir: &Path, focus_size: u32, format: ImageFormat) -> Result<RunReport> {
    let mut report = RunReport::default();
    let Some(samples) = load_samples::<HeapSample>(input)? else {
        report.record_skipped();
        return Ok(report);
    };

    let averages = average_peak_heap(&samples);
    let focus = heap_table(&averages, Some(focus_size));
    if focus.is_empty() {
        warn!("No samples for matrix size {}", focus_size);
    } else {
        println!("Matrix size {}:", focus_size);
        println!("{}", focus);
    }
    println!("{}", heap_table(&averages, None));
    println!("Unique Matrix Sizes: {:?}", matrix_sizes(&averages));

    let path = render(&heap_chart(&averages), output_dir, "avg_peak_heap_vs_processes", format)?;
    report.record_saved(path);
    Ok(report)
}

/// Compare rank 0 peak heap against the other ranks, one colour per matrix size
pub fn run_heap_ranks(input: &Path, output_dir: &Path, format: ImageFormat) -> Result<RunReport> {
    let mut report = RunReport::default();
    let Some(samples) = load_samples::<HeapSample>(input)? else {
        report.record_skipped();
        return Ok(report);
    };

    let unranked = samples.iter().filter(|s| s.rank.is_none()).count();
    if unranked == samples.len() {
        anyhow::bail!("{} has no RANK column", input.display());
    }
    if unranked > 0 {
        warn!("Ignoring {} rows without a rank", unranked);
    }

    let split = rank_split(&samples);
    info!(
        "Rank 0 groups: {}, other-rank groups: {}",
        split.rank0.len(),
        split.others.len()
    );
    let path = render(&rank_chart(&split), output_dir, "peak_heap_rank0_vs_others", format)?;
    report.record_saved(path);
    Ok(report)
}
