//! Console tables and run bookkeeping.

use num_format::{Locale, ToFormattedString};
use std::fmt;
use std::path::PathBuf;

/// Headers are left-aligned, cells right-aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Boxed text table in the `+---+` / `+===+` grid style.
#[derive(Debug, Clone, Default)]
pub struct GridTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl GridTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with empty cells
    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn write_rule(f: &mut fmt::Formatter<'_>, widths: &[usize], fill: char) -> fmt::Result {
    for w in widths {
        write!(f, "+{}", fill.to_string().repeat(w + 2))?;
    }
    writeln!(f, "+")
}

fn write_cells(
    f: &mut fmt::Formatter<'_>,
    cells: &[String],
    widths: &[usize],
    align: Align,
) -> fmt::Result {
    for (cell, w) in cells.iter().zip(widths) {
        match align {
            Align::Left => write!(f, "| {:<w$} ", cell, w = *w)?,
            Align::Right => write!(f, "| {:>w$} ", cell, w = *w)?,
        }
    }
    writeln!(f, "|")
}

impl fmt::Display for GridTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        write_rule(f, &widths, '-')?;
        write_cells(f, &self.headers, &widths, Align::Left)?;
        write_rule(f, &widths, '=')?;
        for row in &self.rows {
            write_cells(f, row, &widths, Align::Right)?;
            write_rule(f, &widths, '-')?;
        }
        Ok(())
    }
}

/// Integer with thousands separators, e.g. `1,234,567`
pub fn format_count(value: f64) -> String {
    if !value.is_finite() || value < 0.0 {
        return format!("{:.0}", value);
    }
    (value.round() as u64).to_formatted_string(&Locale::en)
}

/// Fixed-precision float, `-` for a missing value
pub fn format_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Images written and items skipped during one command
#[derive(Debug, Default)]
pub struct RunReport {
    pub saved: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn record_saved(&mut self, path: PathBuf) {
        tracing::info!(
            "Saved: {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        );
        self.saved.push(path);
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn merge(&mut self, other: RunReport) {
        self.saved.extend(other.saved);
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}
